use crate::core::source::Tier;
use crate::optimization::slot::EvaluatedSlot;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Usable capacity across the evaluated sources for one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquiditySummary {
    /// Capacity available per tier.
    pub by_tier: BTreeMap<Tier, Decimal>,
    /// Total capacity across every slot.
    pub total_capacity: Decimal,
    /// Amount the transaction needs, in home currency.
    pub required: Decimal,
}

impl LiquiditySummary {
    pub fn from_slots(slots: &[EvaluatedSlot<'_>], required: Decimal) -> Self {
        let mut by_tier: BTreeMap<Tier, Decimal> = BTreeMap::new();
        for slot in slots {
            *by_tier.entry(slot.tier()).or_insert(Decimal::ZERO) += slot.capacity;
        }
        LiquiditySummary {
            total_capacity: by_tier.values().copied().sum(),
            by_tier,
            required,
        }
    }

    pub fn is_sufficient(&self) -> bool {
        self.total_capacity >= self.required
    }

    /// Zero when fully covered.
    pub fn shortfall(&self) -> Decimal {
        (self.required - self.total_capacity).max(Decimal::ZERO)
    }

    pub fn tier_capacity(&self, tier: Tier) -> Decimal {
        self.by_tier.get(&tier).copied().unwrap_or(Decimal::ZERO)
    }

    /// Capacity over requirement; `1.0` or more means the amount fits.
    pub fn coverage_ratio(&self) -> f64 {
        if self.required == Decimal::ZERO {
            return 0.0;
        }
        (self.total_capacity / self.required).to_f64().unwrap_or(0.0)
    }
}

impl std::fmt::Display for LiquiditySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Liquidity Summary ===")?;
        writeln!(f, "Required:       {}", self.required)?;
        writeln!(f, "Total capacity: {}", self.total_capacity)?;
        writeln!(f, "Coverage:       {:.1}%", self.coverage_ratio() * 100.0)?;

        writeln!(f, "\nPer-Tier Capacity:")?;
        for (tier, amount) in &self.by_tier {
            writeln!(f, "  {}: {}", tier.label(), amount)?;
        }
        Ok(())
    }
}
