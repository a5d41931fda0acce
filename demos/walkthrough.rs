//! End-to-end walkthrough of the allocation engine.
//!
//! Runs the typical decisions (best card, split, pass-through, backup
//! fallback) against one portfolio, then replays them as a batch.

use chrono::NaiveDate;
use funding_allocator::prelude::*;
use funding_allocator::optimization::liquidity::LiquiditySummary;
use funding_allocator::simulation::batch::replay;
use rust_decimal_macros::dec;

fn alex() -> Portfolio {
    Portfolio::new("usr_001", "Alex")
        .with_credit(
            CreditSource::new("amex_gold", "Amex Gold", dec!(12000), dec!(1800))
                .with_cashback(SpendCategory::Hotel, dec!(0.05))
                .with_cashback(SpendCategory::Other, dec!(0.01))
                .with_points(SpendCategory::Travel, dec!(2))
                .with_reward_label("Membership Rewards")
                .with_badge("5% on hotels")
                .with_scheduled_debit(ScheduledDebit::named("Streaming", dec!(73), 10)),
        )
        .with_credit(
            CreditSource::new("visa_rewards", "Visa Rewards", dec!(4000), dec!(200))
                .with_cashback(SpendCategory::Grocery, dec!(0.02))
                .with_cashback(SpendCategory::Other, dec!(0.015))
                .with_statement_close_day(5),
        )
        .with_debit(
            DebitSource::new("current", "Current Account", dec!(1200), dec!(0.01))
                .primary()
                .with_scheduled_debit(ScheduledDebit::named("Rent", dec!(650), 28)),
        )
        .with_debit(DebitSource::new("isa", "Cash ISA", dec!(8000), dec!(0.045)))
        .with_backup(BackupSource::new("sbi_global", "SBI Global", dec!(900), dec!(0.025), dec!(5)))
}

fn main() {
    println!("╔══════════════════════════════════════════════╗");
    println!("║  funding-allocator: Allocation Walkthrough   ║");
    println!("╚══════════════════════════════════════════════╝\n");

    let portfolio = alex();
    let engine = AllocationEngine::default();
    let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();

    let scenarios = vec![
        ("Best single card", TransactionRequest::new(dec!(240), CurrencyCode::new("GBP"), SpendCategory::Hotel)),
        ("Forced split", TransactionRequest::new(dec!(2400), CurrencyCode::new("GBP"), SpendCategory::Hotel)),
        ("Foreign currency", TransactionRequest::new(dec!(180), CurrencyCode::new("USD"), SpendCategory::Travel)),
        (
            "Interest-only grocery",
            TransactionRequest::new(dec!(35), CurrencyCode::new("GBP"), SpendCategory::Grocery)
                .with_description("Weekly shop"),
        ),
    ];

    for (title, request) in &scenarios {
        println!("━━━ {} ━━━\n", title);
        match engine.optimise(request, &portfolio, today) {
            Ok(result) => println!("{}", result),
            Err(err) => println!("Failed: {}\n", err),
        }
    }

    println!("━━━ Beyond capacity ━━━\n");
    let huge = TransactionRequest::new(dec!(25000), CurrencyCode::new("GBP"), SpendCategory::Other);
    if let Err(err) = engine.optimise(&huge, &portfolio, today) {
        println!("Failed: {}", err);
        if let Ok((amount, slots)) = engine.evaluate(&huge, &portfolio, today) {
            println!("{}", LiquiditySummary::from_slots(&slots, amount));
        }
    }

    println!("━━━ Batch replay ━━━\n");
    let requests: Vec<TransactionRequest> = scenarios.into_iter().map(|(_, r)| r).collect();
    let report = replay(&engine, &portfolio, &requests, today);
    println!("{}", report);
}
