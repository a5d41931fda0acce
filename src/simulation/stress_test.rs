//! Random portfolios for benchmarks and smoke tests.
//!
//! Generated sources use realistic ranges: credit limits in the low
//! thousands with partial balances, savings rates up to 6%, backup cards
//! with a 1.5-3.5% FX spread.

use crate::core::category::SpendCategory;
use crate::core::portfolio::{Portfolio, Preferences};
use crate::core::schedule::ScheduledDebit;
use crate::core::source::{BackupSource, CreditSource, DebitSource};
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Configuration for generating a random portfolio.
#[derive(Debug, Clone)]
pub struct PortfolioConfig {
    pub credit_count: usize,
    pub debit_count: usize,
    pub backup_count: usize,
    /// Upper bound on scheduled debits attached to each credit or debit source.
    pub max_scheduled_debits: usize,
    pub min_credit_limit: Decimal,
    pub max_credit_limit: Decimal,
    pub min_debit_balance: Decimal,
    pub max_debit_balance: Decimal,
    pub pays_in_full: bool,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            credit_count: 3,
            debit_count: 2,
            backup_count: 1,
            max_scheduled_debits: 2,
            min_credit_limit: Decimal::from(1_000),
            max_credit_limit: Decimal::from(15_000),
            min_debit_balance: Decimal::from(200),
            max_debit_balance: Decimal::from(20_000),
            pays_in_full: true,
        }
    }
}

fn random_amount<R: Rng>(rng: &mut R, min: Decimal, max: Decimal) -> Decimal {
    if max <= min {
        return min;
    }
    // Work in whole pence so the result is exact.
    let lo = (min * Decimal::ONE_HUNDRED).trunc().to_i64().unwrap_or(0);
    let hi = (max * Decimal::ONE_HUNDRED).trunc().to_i64().unwrap_or(lo);
    Decimal::new(rng.gen_range(lo..=hi), 2)
}

fn random_rate<R: Rng>(rng: &mut R, max_basis_points: i64) -> Decimal {
    Decimal::new(rng.gen_range(0..=max_basis_points), 4)
}

fn scheduled_debits<R: Rng>(rng: &mut R, max_count: usize, max_amount: Decimal) -> Vec<ScheduledDebit> {
    let count = if max_count == 0 { 0 } else { rng.gen_range(0..=max_count) };
    (0..count)
        .map(|i| {
            ScheduledDebit::named(
                format!("Direct debit {}", i + 1),
                random_amount(rng, dec!(5), max_amount),
                rng.gen_range(1..=28),
            )
        })
        .collect()
}

/// Generate a random portfolio snapshot.
pub fn generate_random_portfolio(config: &PortfolioConfig) -> Portfolio {
    let mut rng = rand::thread_rng();
    let mut portfolio = Portfolio::new("usr_random", "Random User").with_preferences(Preferences {
        pays_in_full: config.pays_in_full,
        ..Default::default()
    });

    for i in 0..config.credit_count {
        let limit = random_amount(&mut rng, config.min_credit_limit, config.max_credit_limit);
        let balance = random_amount(&mut rng, Decimal::ZERO, limit * dec!(0.4));
        let mut card = CreditSource::new(
            format!("credit_{:02}", i),
            format!("Credit Card {}", i + 1),
            limit,
            balance,
        )
        .with_apr(dec!(0.18) + random_rate(&mut rng, 1200))
        .with_grace_days(rng.gen_range(20..=56))
        .with_statement_close_day(rng.gen_range(1..=28));

        for category in SpendCategory::ALL {
            if rng.gen_bool(0.5) {
                card = card.with_cashback(category, random_rate(&mut rng, 500));
            }
        }
        for debit in scheduled_debits(&mut rng, config.max_scheduled_debits, dec!(150)) {
            card = card.with_scheduled_debit(debit);
        }
        portfolio = portfolio.with_credit(card);
    }

    for i in 0..config.debit_count {
        let mut account = DebitSource::new(
            format!("debit_{:02}", i),
            format!("Account {}", i + 1),
            random_amount(&mut rng, config.min_debit_balance, config.max_debit_balance),
            random_rate(&mut rng, 600),
        );
        if i == 0 {
            account = account.primary();
        }
        for debit in scheduled_debits(&mut rng, config.max_scheduled_debits, dec!(300)) {
            account = account.with_scheduled_debit(debit);
        }
        portfolio = portfolio.with_debit(account);
    }

    for i in 0..config.backup_count {
        portfolio = portfolio.with_backup(BackupSource::new(
            format!("backup_{:02}", i),
            format!("Backup Card {}", i + 1),
            random_amount(&mut rng, dec!(500), dec!(5000)),
            dec!(0.015) + random_rate(&mut rng, 200),
            random_amount(&mut rng, Decimal::ZERO, dec!(5)),
        ));
    }

    portfolio
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::CurrencyCode;
    use crate::core::transaction::TransactionRequest;
    use crate::optimization::engine::AllocationEngine;
    use chrono::NaiveDate;

    #[test]
    fn test_random_portfolio_generation() {
        let config = PortfolioConfig {
            credit_count: 4,
            debit_count: 3,
            backup_count: 2,
            ..Default::default()
        };

        let portfolio = generate_random_portfolio(&config);
        assert_eq!(portfolio.credit_cards.len(), 4);
        assert_eq!(portfolio.debit_accounts.len(), 3);
        assert_eq!(portfolio.backup_cards.len(), 2);
        assert!(portfolio.debit_accounts[0].is_primary);
        for card in &portfolio.credit_cards {
            assert!(card.credit_limit >= config.min_credit_limit);
            assert!(card.current_balance <= card.credit_limit);
        }
    }

    #[test]
    fn test_random_portfolio_allocates() {
        let portfolio = generate_random_portfolio(&PortfolioConfig::default());
        let engine = AllocationEngine::default();
        let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let request =
            TransactionRequest::new(dec!(25), CurrencyCode::new("GBP"), SpendCategory::Dining);

        // Backups alone hold at least 500, so a small amount always fits.
        let result = engine.optimise(&request, &portfolio, today).unwrap();
        assert_eq!(result.total_allocated(), dec!(25));
    }
}
