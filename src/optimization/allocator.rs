//! Allocation strategies.
//!
//! The problem is: maximise `Σ rate[i] * x[i]` subject to
//! `0 <= x[i] <= capacity[i]` and `Σ x[i] = amount`. With box constraints
//! and a single equality, filling sources in descending rate order is
//! optimal, so no general LP solver is needed.
//!
//! Two strategies share that fill:
//!
//! - [`GreedyFill`] ranks by the realised net benefit rate.
//! - [`NoSplitHeuristic`] first tries to place small amounts on a single
//!   source, and ranks by the mode-adjusted rate.

use crate::core::category::AllocationMode;
use crate::core::source::Tier;
use crate::error::{AllocationError, Result};
use crate::optimization::slot::EvaluatedSlot;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Amount placed on one slot, by index into the slot list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    pub slot: usize,
    pub amount: Decimal,
}

/// A way of splitting `amount` across evaluated slots.
///
/// Implementations must return fills whose amounts are non-negative, within
/// each slot's capacity and sum exactly to `amount`, listed in the order the
/// slots were filled.
pub trait AllocationStrategy {
    fn name(&self) -> &'static str;

    fn allocate(&self, slots: &[EvaluatedSlot<'_>], amount: Decimal) -> Result<Vec<Fill>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Exact,
    Heuristic,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Exact => "exact",
            StrategyKind::Heuristic => "heuristic",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(StrategyKind::Exact),
            "heuristic" => Ok(StrategyKind::Heuristic),
            other => Err(format!("unknown strategy '{other}'")),
        }
    }
}

/// Exact optimum: fill by net benefit rate, highest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyFill;

impl AllocationStrategy for GreedyFill {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn allocate(&self, slots: &[EvaluatedSlot<'_>], amount: Decimal) -> Result<Vec<Fill>> {
        greedy_fill(slots, amount, |s| s.net_benefit_rate)
    }
}

/// Small-transaction heuristic: avoid micro-splits.
///
/// Below `split_threshold`, a single source able to cover the whole amount is
/// preferred, highest ranking rate first. Backups are tried only after every
/// home source, and in interest-only mode debit accounts come before credit
/// cards. Otherwise falls through to the greedy fill on ranking rates.
#[derive(Debug, Clone, Copy)]
pub struct NoSplitHeuristic {
    pub split_threshold: Decimal,
    pub mode: AllocationMode,
}

impl NoSplitHeuristic {
    /// Index of the preferred single source covering `amount`, if any.
    pub fn single_source(&self, slots: &[EvaluatedSlot<'_>], amount: Decimal) -> Option<usize> {
        let mut candidates: Vec<usize> = (0..slots.len())
            .filter(|&i| slots[i].capacity >= amount)
            .collect();

        candidates.sort_by(|&a, &b| {
            self.group(slots[a].tier())
                .cmp(&self.group(slots[b].tier()))
                .then_with(|| by_rate_desc(slots[a].ranking_rate, slots[b].ranking_rate))
        });

        candidates.first().copied()
    }

    /// Preference group for single-source candidates, lowest first.
    /// Backups only cover alone when no home source can.
    fn group(&self, tier: Tier) -> u8 {
        match (self.mode, tier) {
            (_, Tier::Backup) => 2,
            (AllocationMode::InterestOnly, Tier::Credit) => 1,
            _ => 0,
        }
    }
}

impl AllocationStrategy for NoSplitHeuristic {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn allocate(&self, slots: &[EvaluatedSlot<'_>], amount: Decimal) -> Result<Vec<Fill>> {
        if amount < self.split_threshold {
            if let Some(slot) = self.single_source(slots, amount) {
                log::debug!(
                    "NO-SPLIT  | {} covers {} alone ({} mode)",
                    slots[slot].source.name(),
                    amount,
                    self.mode
                );
                return Ok(vec![Fill { slot, amount }]);
            }
        }
        greedy_fill(slots, amount, |s| s.ranking_rate)
    }
}

fn by_rate_desc(a: Decimal, b: Decimal) -> Ordering {
    b.cmp(&a)
}

/// Slot indices ordered by `rate` descending; ties keep slot order.
pub fn rank_by<F>(slots: &[EvaluatedSlot<'_>], rate: F) -> Vec<usize>
where
    F: Fn(&EvaluatedSlot<'_>) -> Decimal,
{
    let mut order: Vec<usize> = (0..slots.len()).collect();
    order.sort_by(|&a, &b| by_rate_desc(rate(&slots[a]), rate(&slots[b])));
    order
}

/// Fill slots in rate order until `amount` is exhausted.
///
/// Each fill is rounded to the currency sub-unit; any rounding residual is
/// absorbed by the last-filled slot so the fills sum exactly to `amount`.
pub fn greedy_fill<F>(slots: &[EvaluatedSlot<'_>], amount: Decimal, rate: F) -> Result<Vec<Fill>>
where
    F: Fn(&EvaluatedSlot<'_>) -> Decimal,
{
    let mut remaining = amount;
    let mut fills = Vec::new();

    for slot in rank_by(slots, rate) {
        if remaining <= Decimal::ZERO {
            break;
        }
        let take = remaining.min(slots[slot].capacity);
        if take <= Decimal::ZERO {
            continue;
        }
        fills.push(Fill { slot, amount: take });
        remaining -= take;
    }

    if remaining > Decimal::ZERO {
        log::error!("FILL      | {} unallocated after exhausting {} slots", remaining, slots.len());
        return Err(AllocationError::SolverInfeasible {
            unallocated: remaining,
        });
    }

    Ok(round_fills(fills, amount))
}

fn round_fills(mut fills: Vec<Fill>, amount: Decimal) -> Vec<Fill> {
    for fill in &mut fills {
        fill.amount = fill
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    }
    let allocated: Decimal = fills.iter().map(|f| f.amount).sum();
    if let Some(last) = fills.last_mut() {
        last.amount += amount - allocated;
    }
    fills.retain(|f| f.amount > Decimal::ZERO);
    fills
}
