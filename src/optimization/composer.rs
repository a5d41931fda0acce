//! Turns strategy fills into the user-facing allocation result.
//!
//! Everything here is a pure derivation of the fills and the snapshot the
//! engine evaluated; nothing calls out.

use crate::core::category::{AllocationMode, SpendCategory};
use crate::core::currency::CurrencyCode;
use crate::core::source::{FundingSource, SourceId, Tier};
use crate::core::transaction::TransactionRequest;
use crate::optimization::allocator::{Fill, StrategyKind};
use crate::optimization::benefit::{AccountInterest, BenefitModel, SavingsProfile};
use crate::optimization::decision::Decision;
use crate::optimization::slot::EvaluatedSlot;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn round_dp(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

fn metric(value: Decimal) -> Decimal {
    round_dp(value, 4)
}

/// One source's share of the transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationLine {
    pub source_id: SourceId,
    pub source_name: String,
    pub tier: Tier,
    pub tier_label: String,
    pub amount: Decimal,
    pub cashback_earned: Decimal,
    pub reward_points_earned: u64,
    pub reward_label: Option<String>,
    pub interest_opportunity_lost: Decimal,
    pub fx_cost: Decimal,
    /// `amount * net_benefit_rate`.
    pub net_benefit: Decimal,
    pub pending_debits_reserved: Decimal,
    pub badge: Option<String>,
}

impl AllocationLine {
    fn from_fill(slot: &EvaluatedSlot<'_>, amount: Decimal, model: &BenefitModel) -> Self {
        let mut line = AllocationLine {
            source_id: slot.source.id().clone(),
            source_name: slot.source.name().to_string(),
            tier: slot.tier(),
            tier_label: slot.tier().label().to_string(),
            amount,
            cashback_earned: Decimal::ZERO,
            reward_points_earned: 0,
            reward_label: None,
            interest_opportunity_lost: Decimal::ZERO,
            fx_cost: Decimal::ZERO,
            net_benefit: metric(amount * slot.net_benefit_rate),
            pending_debits_reserved: round_dp(slot.pending_debits, 2),
            badge: slot.source.badge().map(str::to_string),
        };

        match slot.source {
            FundingSource::Credit(card) => {
                line.cashback_earned = metric(amount * model.cashback_rate(card));
                if card.reward_points.as_ref().is_some_and(|p| !p.is_empty()) {
                    line.reward_points_earned = (amount * model.points_rate(card))
                        .floor()
                        .to_u64()
                        .unwrap_or(0);
                    line.reward_label = card.reward_label.clone();
                }
            }
            FundingSource::Debit(account) => {
                line.interest_opportunity_lost = metric(amount * account.savings_rate_monthly());
            }
            FundingSource::Backup(card) => {
                line.fx_cost = metric(amount * card.fx_spread_rate + card.flat_fee);
            }
        }
        line
    }
}

/// Aggregate effect of the allocation on end-of-month cash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EomImpact {
    pub total_cashback_earned: Decimal,
    pub total_interest_opportunity_lost: Decimal,
    pub total_fx_costs: Decimal,
    pub net_eom_benefit: Decimal,
}

impl EomImpact {
    pub fn from_lines(lines: &[AllocationLine]) -> Self {
        let cashback: Decimal = lines.iter().map(|l| l.cashback_earned).sum();
        let interest: Decimal = lines.iter().map(|l| l.interest_opportunity_lost).sum();
        let fx: Decimal = lines.iter().map(|l| l.fx_cost).sum();
        Self {
            total_cashback_earned: metric(cashback),
            total_interest_opportunity_lost: metric(interest),
            total_fx_costs: metric(fx),
            net_eom_benefit: metric(cashback - interest - fx),
        }
    }
}

/// Savings-interest picture around the transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsContext {
    pub weighted_avg_rate_annual: Decimal,
    pub weighted_avg_rate_monthly: Decimal,
    pub per_account_monthly_interest: Vec<AccountInterest>,
    pub remaining_monthly_interest_after_txn: Decimal,
}

impl SavingsContext {
    fn new(profile: &SavingsProfile, eom: &EomImpact) -> Self {
        Self {
            weighted_avg_rate_annual: round_dp(profile.weighted_rate_annual, 6),
            weighted_avg_rate_monthly: round_dp(profile.weighted_rate_monthly, 6),
            per_account_monthly_interest: profile.accounts.clone(),
            remaining_monthly_interest_after_txn: metric(
                profile.total_monthly_interest() - eom.total_interest_opportunity_lost,
            ),
        }
    }
}

/// Display strings derived from the allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiHints {
    pub headline: String,
    pub earn_label: String,
    pub comparison: String,
    pub card_badge: String,
    pub savings_nudge: String,
    pub net_benefit: Decimal,
    pub total_points_earned: u64,
    pub reward_label: String,
}

fn money(symbol: &str, value: Decimal) -> String {
    format!("{}{:.2}", symbol, round_dp(value, 2))
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl UiHints {
    fn derive(
        decision: Decision,
        lines: &[AllocationLine],
        eom: &EomImpact,
        savings: &SavingsProfile,
        currency: &CurrencyCode,
    ) -> Self {
        let symbol = currency.symbol();
        let primary = lines.first();
        let primary_name = primary.map_or("your account", |l| l.source_name.as_str());

        let headline = match decision {
            Decision::CreditOptimised => format!("Pay with {primary_name}"),
            Decision::Split => {
                let names: Vec<&str> = lines.iter().map(|l| l.source_name.as_str()).collect();
                format!("Split across {}", names.join(" + "))
            }
            Decision::FallbackInternational => format!(
                "Partial backup via {}",
                lines
                    .iter()
                    .find(|l| l.tier == Tier::Backup)
                    .map_or(primary_name, |l| l.source_name.as_str())
            ),
            Decision::PassThrough => format!("Pay from {primary_name} (debit)"),
        };

        let total_points: u64 = lines.iter().map(|l| l.reward_points_earned).sum();
        let reward_label = lines
            .iter()
            .find(|l| l.reward_points_earned > 0)
            .and_then(|l| l.reward_label.clone())
            .unwrap_or_else(|| "pts".to_string());

        let cashback = eom.total_cashback_earned;
        let earn_label = if total_points > 0 {
            format!(
                "Earn {} {} (≈ {})",
                group_thousands(total_points),
                reward_label,
                money(symbol, cashback)
            )
        } else if cashback > Decimal::ZERO {
            format!("Earn {} cashback", money(symbol, cashback))
        } else {
            "No cashback on this route".to_string()
        };

        let net = eom.net_eom_benefit;
        let comparison = if net > Decimal::ZERO {
            format!("You're {} better off than paying from debit", money(symbol, net))
        } else if net < Decimal::ZERO {
            format!(
                "Costs {} more than ideal, but no better option available",
                money(symbol, net.abs())
            )
        } else {
            "Same outcome as paying from debit".to_string()
        };

        let savings_nudge = if decision == Decision::CreditOptimised {
            format!(
                "Your savings keep earning {}/mo while this goes on credit",
                money(symbol, savings.total_monthly_interest())
            )
        } else {
            String::new()
        };

        Self {
            headline,
            earn_label,
            comparison,
            card_badge: primary.and_then(|l| l.badge.clone()).unwrap_or_default(),
            savings_nudge,
            net_benefit: net,
            total_points_earned: total_points,
            reward_label,
        }
    }
}

/// The complete answer for one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub transaction_id: Uuid,
    pub description: Option<String>,
    pub merchant: Option<String>,
    pub amount_original: Decimal,
    pub currency: CurrencyCode,
    pub amount_home: Decimal,
    pub home_currency: CurrencyCode,
    pub category: SpendCategory,
    pub mode: AllocationMode,
    pub strategy: StrategyKind,
    pub decision: Decision,
    pub decision_label: String,
    pub lines: Vec<AllocationLine>,
    pub eom_impact: EomImpact,
    pub savings_context: SavingsContext,
    pub ui_hints: UiHints,
    /// Decorative narrative; never feeds back into the numbers.
    pub explanation: String,
}

impl AllocationResult {
    pub fn total_allocated(&self) -> Decimal {
        self.lines.iter().map(|l| l.amount).sum()
    }

    pub fn line_for(&self, id: &SourceId) -> Option<&AllocationLine> {
        self.lines.iter().find(|l| &l.source_id == id)
    }

    pub fn uses_tier(&self, tier: Tier) -> bool {
        self.lines.iter().any(|l| l.tier == tier)
    }
}

/// Everything the composer needs besides the fills.
#[derive(Debug, Clone, Copy)]
pub struct Composition<'r> {
    pub request: &'r TransactionRequest,
    pub amount_home: Decimal,
    pub home_currency: &'r CurrencyCode,
    pub mode: AllocationMode,
    pub strategy: StrategyKind,
    pub model: &'r BenefitModel,
    pub savings: &'r SavingsProfile,
}

impl<'r> Composition<'r> {
    pub fn compose(&self, slots: &[EvaluatedSlot<'_>], fills: &[Fill]) -> AllocationResult {
        let lines: Vec<AllocationLine> = fills
            .iter()
            .filter(|f| f.amount > Decimal::ZERO)
            .map(|f| AllocationLine::from_fill(&slots[f.slot], f.amount, self.model))
            .collect();

        let decision = Decision::classify(&lines);
        let eom_impact = EomImpact::from_lines(&lines);
        let savings_context = SavingsContext::new(self.savings, &eom_impact);
        let ui_hints = UiHints::derive(decision, &lines, &eom_impact, self.savings, self.home_currency);

        AllocationResult {
            transaction_id: self.request.id,
            description: self.request.description.clone(),
            merchant: self.request.merchant.clone(),
            amount_original: self.request.amount,
            currency: self.request.currency.clone(),
            amount_home: self.amount_home,
            home_currency: self.home_currency.clone(),
            category: self.request.category,
            mode: self.mode,
            strategy: self.strategy,
            decision,
            decision_label: decision.label().to_string(),
            lines,
            eom_impact,
            savings_context,
            ui_hints,
            explanation: String::new(),
        }
    }
}

impl std::fmt::Display for AllocationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = self.home_currency.symbol();
        writeln!(f, "=== Allocation Result ===")?;
        if self.currency != self.home_currency {
            writeln!(
                f,
                "Amount:      {} {} (~{})",
                self.amount_original,
                self.currency,
                money(symbol, self.amount_home)
            )?;
        } else {
            writeln!(f, "Amount:      {}", money(symbol, self.amount_home))?;
        }
        writeln!(f, "Category:    {} ({} mode, {} strategy)", self.category, self.mode, self.strategy)?;
        writeln!(f, "Decision:    {}", self.decision_label)?;
        writeln!(f, "Headline:    {}", self.ui_hints.headline)?;

        writeln!(f, "\n{:<30} {:<14} {:>10} {:>10}", "Source", "Tier", "Charged", "Net")?;
        for line in &self.lines {
            writeln!(
                f,
                "{:<30} {:<14} {:>10} {:>10}",
                line.source_name,
                line.tier_label,
                money(symbol, line.amount),
                line.net_benefit
            )?;
            if line.cashback_earned > Decimal::ZERO {
                writeln!(f, "    cashback earned:        +{}", line.cashback_earned)?;
            }
            if line.reward_points_earned > 0 {
                writeln!(f, "    reward points:          {}", line.reward_points_earned)?;
            }
            if line.interest_opportunity_lost > Decimal::ZERO {
                writeln!(f, "    savings interest lost:  -{}", line.interest_opportunity_lost)?;
            }
            if line.fx_cost > Decimal::ZERO {
                writeln!(f, "    FX cost:                -{}", line.fx_cost)?;
            }
            if line.pending_debits_reserved > Decimal::ZERO {
                writeln!(f, "    scheduled debits held:  {}", line.pending_debits_reserved)?;
            }
        }

        let eom = &self.eom_impact;
        writeln!(f, "\n--- End-of-month impact ---")?;
        writeln!(f, "  Cashback earned:        +{}", eom.total_cashback_earned)?;
        writeln!(f, "  Savings interest lost:  -{}", eom.total_interest_opportunity_lost)?;
        writeln!(f, "  FX / transfer costs:    -{}", eom.total_fx_costs)?;
        writeln!(f, "  Net EOM benefit:         {}", eom.net_eom_benefit)?;

        let ctx = &self.savings_context;
        writeln!(f, "\n--- Savings interest ---")?;
        writeln!(f, "  Blended rate (annual):  {}", ctx.weighted_avg_rate_annual)?;
        for account in &ctx.per_account_monthly_interest {
            if account.annual_rate > Decimal::ZERO {
                writeln!(
                    f,
                    "  {:<22} {} @ {} -> +{}/mo",
                    account.id, account.balance, account.annual_rate, account.monthly_interest
                )?;
            }
        }
        writeln!(f, "  Remaining after txn:    +{}/mo", ctx.remaining_monthly_interest_after_txn)?;

        if !self.explanation.is_empty() {
            writeln!(f, "\n{}", self.explanation)?;
        }
        Ok(())
    }
}
