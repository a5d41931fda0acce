//! Net benefit per unit of currency spent on each source.
//!
//! | Source | pays in full | rate |
//! |---|---|---|
//! | Credit | yes | `cashback + blended_monthly_savings * grace_days / 30` |
//! | Credit | no  | `cashback - apr / 12` |
//! | Debit  | –   | `-savings_rate_monthly` |
//! | Backup | –   | `-(fx_spread + flat_fee / max(amount, 1))` |
//!
//! The backup flat fee is amortised over the whole transaction amount, not
//! the part drawn from the backup card.

use crate::core::category::{AllocationMode, SpendCategory};
use crate::core::source::{CreditSource, DebitSource, FundingSource, SourceId};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

const MONTHS_PER_YEAR: u32 = 12;

/// Monthly interest earned by one debit account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInterest {
    pub id: SourceId,
    pub balance: Decimal,
    pub annual_rate: Decimal,
    pub monthly_interest: Decimal,
}

/// Balance-weighted savings picture across all of a user's debit accounts.
///
/// The blended rate is the opportunity cost of spending a unit of cash now
/// instead of deferring it on credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsProfile {
    pub weighted_rate_annual: Decimal,
    pub weighted_rate_monthly: Decimal,
    pub accounts: Vec<AccountInterest>,
}

impl SavingsProfile {
    pub fn from_accounts(accounts: &[DebitSource]) -> Self {
        let total_balance: Decimal = accounts.iter().map(|a| a.balance).sum();
        let weighted_rate_annual = if total_balance > Decimal::ZERO {
            accounts
                .iter()
                .map(|a| a.balance * a.savings_rate_annual)
                .sum::<Decimal>()
                / total_balance
        } else {
            Decimal::ZERO
        };

        Self {
            weighted_rate_annual,
            weighted_rate_monthly: weighted_rate_annual / Decimal::from(MONTHS_PER_YEAR),
            accounts: accounts
                .iter()
                .map(|a| AccountInterest {
                    id: a.id.clone(),
                    balance: a.balance,
                    annual_rate: a.savings_rate_annual,
                    monthly_interest: a
                        .monthly_interest()
                        .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero),
                })
                .collect(),
        }
    }

    pub fn total_monthly_interest(&self) -> Decimal {
        self.accounts.iter().map(|a| a.monthly_interest).sum()
    }
}

/// Rate model for one transaction: category, payoff behaviour, blended
/// savings rate and the total amount being spent.
#[derive(Debug, Clone, Copy)]
pub struct BenefitModel {
    pub category: SpendCategory,
    pub fallback_category: SpendCategory,
    pub pays_in_full: bool,
    pub blended_savings_monthly: Decimal,
    pub spend_amount: Decimal,
    pub grace_basis_days: u32,
}

impl BenefitModel {
    pub fn cashback_rate(&self, card: &CreditSource) -> Decimal {
        card.cashback_rates
            .rate_for(self.category, self.fallback_category)
    }

    pub fn points_rate(&self, card: &CreditSource) -> Decimal {
        card.reward_points
            .as_ref()
            .map(|p| p.rate_for(self.category, self.fallback_category))
            .unwrap_or(Decimal::ZERO)
    }

    /// Net benefit per unit spent on `source`. Negative values are costs.
    pub fn net_benefit_rate(&self, source: FundingSource<'_>) -> Decimal {
        match source {
            FundingSource::Credit(card) => self.cashback_rate(card) + self.credit_carry_rate(card),
            FundingSource::Debit(account) => -account.savings_rate_monthly(),
            FundingSource::Backup(card) => {
                let amortised_fee = card.flat_fee / self.spend_amount.max(Decimal::ONE);
                -(card.fx_spread_rate + amortised_fee)
            }
        }
    }

    /// Rate used to order sources under `mode`. Interest-only mode drops
    /// credit cashback so that interest preservation alone ranks cards.
    pub fn ranking_rate(&self, source: FundingSource<'_>, mode: AllocationMode) -> Decimal {
        match (source, mode) {
            (FundingSource::Credit(card), AllocationMode::InterestOnly) => {
                self.credit_carry_rate(card)
            }
            _ => self.net_benefit_rate(source),
        }
    }

    /// The non-cashback part of a credit card's rate: interest kept on
    /// savings during the grace period, or APR cost when carrying a balance.
    fn credit_carry_rate(&self, card: &CreditSource) -> Decimal {
        if self.pays_in_full {
            let grace_fraction =
                Decimal::from(card.grace_period_days) / Decimal::from(self.grace_basis_days);
            self.blended_savings_monthly * grace_fraction
        } else {
            -(card.apr_annual / Decimal::from(MONTHS_PER_YEAR))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::BackupSource;
    use rust_decimal_macros::dec;

    fn model(pays_in_full: bool, blended_monthly: Decimal, amount: Decimal) -> BenefitModel {
        BenefitModel {
            category: SpendCategory::Hotel,
            fallback_category: SpendCategory::Other,
            pays_in_full,
            blended_savings_monthly: blended_monthly,
            spend_amount: amount,
            grace_basis_days: 30,
        }
    }

    #[test]
    fn test_weighted_savings_rate() {
        let accounts = vec![
            DebitSource::new("current", "Current", dec!(3000), dec!(0.01)),
            DebitSource::new("isa", "ISA", dec!(1000), dec!(0.05)),
        ];
        let profile = SavingsProfile::from_accounts(&accounts);
        // (3000*0.01 + 1000*0.05) / 4000 = 0.02
        assert_eq!(profile.weighted_rate_annual, dec!(0.02));
        assert_eq!(profile.accounts[1].monthly_interest, dec!(4.1667));
    }

    #[test]
    fn test_weighted_rate_zero_balance() {
        let accounts = vec![DebitSource::new("empty", "Empty", Decimal::ZERO, dec!(0.05))];
        let profile = SavingsProfile::from_accounts(&accounts);
        assert_eq!(profile.weighted_rate_annual, Decimal::ZERO);
        assert_eq!(profile.total_monthly_interest(), Decimal::ZERO);
    }

    #[test]
    fn test_credit_rate_pays_in_full() {
        let card = CreditSource::new("amex", "Amex", dec!(5000), dec!(0))
            .with_cashback(SpendCategory::Hotel, dec!(0.05))
            .with_grace_days(45);
        let rate = model(true, dec!(0.002), dec!(100)).net_benefit_rate(FundingSource::Credit(&card));
        // 0.05 + 0.002 * 45/30
        assert_eq!(rate, dec!(0.053));
    }

    #[test]
    fn test_credit_rate_carrying_balance() {
        let card = CreditSource::new("amex", "Amex", dec!(5000), dec!(0))
            .with_cashback(SpendCategory::Other, dec!(0.01))
            .with_apr(dec!(0.24));
        let rate = model(false, dec!(0.002), dec!(100)).net_benefit_rate(FundingSource::Credit(&card));
        // hotel falls back to "other": 0.01 - 0.24/12
        assert_eq!(rate, dec!(-0.01));
    }

    #[test]
    fn test_debit_rate_is_negative_monthly_savings() {
        let acc = DebitSource::new("isa", "ISA", dec!(1000), dec!(0.06));
        let rate = model(true, dec!(0.002), dec!(100)).net_benefit_rate(FundingSource::Debit(&acc));
        assert_eq!(rate, dec!(-0.005));
    }

    #[test]
    fn test_backup_fee_amortised_over_total_amount() {
        let card = BackupSource::new("sbi", "SBI", dec!(1000), dec!(0.025), dec!(5));
        let rate = model(true, Decimal::ZERO, dec!(500)).net_benefit_rate(FundingSource::Backup(&card));
        assert_eq!(rate, dec!(-0.035));
        // small amounts amortise over at least one unit
        let rate = model(true, Decimal::ZERO, dec!(0.5)).net_benefit_rate(FundingSource::Backup(&card));
        assert_eq!(rate, dec!(-5.025));
    }

    #[test]
    fn test_interest_only_ranking_drops_cashback() {
        let card = CreditSource::new("amex", "Amex", dec!(5000), dec!(0))
            .with_cashback(SpendCategory::Hotel, dec!(0.05));
        let m = model(true, dec!(0.003), dec!(100));
        let source = FundingSource::Credit(&card);
        assert_eq!(m.ranking_rate(source, AllocationMode::InterestOnly), dec!(0.003));
        assert_eq!(m.ranking_rate(source, AllocationMode::Balanced), dec!(0.053));
    }
}
