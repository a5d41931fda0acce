//! Sequential replay of several transactions against one portfolio.
//!
//! Each request sees the balances left by the previous successful ones.
//! There is no cross-transaction optimisation: requests are allocated one
//! at a time in the order given.

use crate::core::portfolio::{BalanceChange, Portfolio};
use crate::core::transaction::TransactionRequest;
use crate::error::AllocationError;
use crate::optimization::composer::AllocationResult;
use crate::optimization::engine::AllocationEngine;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one request in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Allocated {
        result: Box<AllocationResult>,
        changes: Vec<BalanceChange>,
    },
    Failed {
        error: String,
        liquidity_failure: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    pub transaction_id: Uuid,
    pub label: String,
    pub outcome: BatchOutcome,
}

impl BatchEntry {
    pub fn is_allocated(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Allocated { .. })
    }

    pub fn result(&self) -> Option<&AllocationResult> {
        match &self.outcome {
            BatchOutcome::Allocated { result, .. } => Some(result),
            BatchOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
    pub total_net_eom_benefit: Decimal,
    pub total_cashback_earned: Decimal,
    pub balance_changes: Vec<BalanceChange>,
    /// Portfolio after every successful allocation was applied.
    pub final_snapshot: Portfolio,
}

impl BatchReport {
    pub fn allocated_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_allocated()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.entries.len() - self.allocated_count()
    }
}

/// Replay `requests` in order against a working copy of `portfolio`.
///
/// Failures are recorded and the replay continues with the next request.
pub fn replay(
    engine: &AllocationEngine,
    portfolio: &Portfolio,
    requests: &[TransactionRequest],
    today: NaiveDate,
) -> BatchReport {
    let mut working = portfolio.clone();
    let mut entries = Vec::with_capacity(requests.len());
    let mut balance_changes = Vec::new();
    let mut total_net = Decimal::ZERO;
    let mut total_cashback = Decimal::ZERO;

    for request in requests {
        let outcome = match engine.optimise(request, &working, today) {
            Ok(result) => {
                let changes = working.commit(&result);
                total_net += result.eom_impact.net_eom_benefit;
                total_cashback += result.eom_impact.total_cashback_earned;
                balance_changes.extend(changes.iter().cloned());
                BatchOutcome::Allocated {
                    result: Box::new(result),
                    changes,
                }
            }
            Err(err) => {
                log::warn!("BATCH     | {} failed: {}", request.label(), err);
                failed(&err)
            }
        };
        entries.push(BatchEntry {
            transaction_id: request.id,
            label: request.label().to_string(),
            outcome,
        });
    }

    log::info!(
        "BATCH     | {} request(s), net EOM {}, cashback {}",
        entries.len(),
        total_net,
        total_cashback
    );

    BatchReport {
        entries,
        total_net_eom_benefit: total_net,
        total_cashback_earned: total_cashback,
        balance_changes,
        final_snapshot: working,
    }
}

fn failed(err: &AllocationError) -> BatchOutcome {
    BatchOutcome::Failed {
        error: err.to_string(),
        liquidity_failure: err.is_liquidity_failure(),
    }
}

impl std::fmt::Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Batch Replay ===")?;
        writeln!(
            f,
            "Transactions: {} ({} allocated, {} failed)",
            self.entries.len(),
            self.allocated_count(),
            self.failed_count()
        )?;
        for (i, entry) in self.entries.iter().enumerate() {
            match &entry.outcome {
                BatchOutcome::Allocated { result, .. } => writeln!(
                    f,
                    "  {:>2}. {:<28} {:<24} net {}",
                    i + 1,
                    entry.label,
                    result.decision,
                    result.eom_impact.net_eom_benefit
                )?,
                BatchOutcome::Failed { error, .. } => {
                    writeln!(f, "  {:>2}. {:<28} FAILED: {}", i + 1, entry.label, error)?
                }
            }
        }
        writeln!(f, "\nTotal net EOM benefit: {}", self.total_net_eom_benefit)?;
        writeln!(f, "Total cashback:        {}", self.total_cashback_earned)?;

        writeln!(f, "\nBalance changes:")?;
        for change in &self.balance_changes {
            writeln!(
                f,
                "  {:<28} {:<16} {} -> {}",
                change.source_name, change.field, change.before, change.after
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::category::SpendCategory;
    use crate::core::currency::CurrencyCode;
    use crate::core::source::{CreditSource, DebitSource};
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 2).unwrap()
    }

    fn request(amount: Decimal) -> TransactionRequest {
        TransactionRequest::new(amount, CurrencyCode::new("GBP"), SpendCategory::Grocery)
    }

    #[test]
    fn test_replay_commits_between_requests() {
        let portfolio = Portfolio::new("u", "User")
            .with_debit(DebitSource::new("current", "Current", dec!(100), dec!(0)).primary());
        let engine = AllocationEngine::default();

        let report = replay(
            &engine,
            &portfolio,
            &[request(dec!(60)), request(dec!(60)), request(dec!(30))],
            today(),
        );

        assert_eq!(report.allocated_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert!(!report.entries[1].is_allocated());
        assert_eq!(report.final_snapshot.debit_accounts[0].balance, dec!(10));
        // caller's snapshot untouched
        assert_eq!(portfolio.debit_accounts[0].balance, dec!(100));
    }

    #[test]
    fn test_replay_totals() {
        let portfolio = Portfolio::new("u", "User").with_credit(
            CreditSource::new("visa", "Visa", dec!(10000), dec!(0))
                .with_cashback(SpendCategory::Grocery, dec!(0.02)),
        );
        let engine = AllocationEngine::default();

        let report = replay(&engine, &portfolio, &[request(dec!(100)), request(dec!(50))], today());

        assert_eq!(report.total_cashback_earned, dec!(3));
        assert_eq!(report.balance_changes.len(), 2);
        assert_eq!(report.final_snapshot.credit_cards[0].current_balance, dec!(150));
    }
}
