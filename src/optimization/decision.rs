use crate::core::source::Tier;
use crate::optimization::composer::AllocationLine;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural label of a finished allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    PassThrough,
    CreditOptimised,
    Split,
    FallbackInternational,
}

impl Decision {
    /// Classify an allocation from its lines alone.
    ///
    /// A backup-tier line forces `FallbackInternational` regardless of the
    /// other lines; then a single debit line with no cashback is
    /// `PassThrough`, a single credit line is `CreditOptimised`, and
    /// anything else is `Split`.
    pub fn classify(lines: &[AllocationLine]) -> Self {
        if lines.iter().any(|l| l.tier == Tier::Backup) {
            return Decision::FallbackInternational;
        }
        match lines {
            [only] if only.tier == Tier::Debit && only.cashback_earned == Decimal::ZERO => {
                Decision::PassThrough
            }
            [only] if only.tier == Tier::Credit => Decision::CreditOptimised,
            _ => Decision::Split,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::PassThrough => "pass_through",
            Decision::CreditOptimised => "credit_optimised",
            Decision::Split => "split",
            Decision::FallbackInternational => "fallback_international",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Decision::PassThrough => "Pass-through — no optimisation needed",
            Decision::CreditOptimised => "Auto-Optimised → Best credit card selected",
            Decision::Split => "Split allocation across multiple sources",
            Decision::FallbackInternational => "International card used as backup",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
