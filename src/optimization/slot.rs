//! Candidate set for one optimisation call.
//!
//! Slots are built fresh from the portfolio snapshot on every call and are
//! returned in the fixed tie-break order: credit cards by ascending id, then
//! debit accounts (primary first, lowest savings rate first, then id), then
//! backup cards by id. Strategies stable-sort on top of this order, so equal
//! rates always resolve the same way.

use crate::core::category::AllocationMode;
use crate::core::portfolio::Portfolio;
use crate::core::source::{FundingSource, Tier};
use crate::optimization::benefit::BenefitModel;
use crate::optimization::capacity::{backup_capacity, credit_capacity, debit_capacity, Capacity};
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A funding source enriched with this cycle's capacity and its rates for
/// the transaction being optimised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluatedSlot<'a> {
    pub source: FundingSource<'a>,
    pub capacity: Decimal,
    pub pending_debits: Decimal,
    /// Benefit per unit actually realised by spending on this source.
    pub net_benefit_rate: Decimal,
    /// Benefit per unit used for ordering under the active mode.
    pub ranking_rate: Decimal,
}

impl<'a> EvaluatedSlot<'a> {
    fn new(
        source: FundingSource<'a>,
        capacity: Capacity,
        model: &BenefitModel,
        mode: AllocationMode,
    ) -> Self {
        Self {
            source,
            capacity: capacity.usable,
            pending_debits: capacity.pending_debits,
            net_benefit_rate: model.net_benefit_rate(source),
            ranking_rate: model.ranking_rate(source, mode),
        }
    }

    pub fn tier(&self) -> Tier {
        self.source.tier()
    }
}

/// Build the candidate slots, dropping sources whose capacity does not
/// exceed `epsilon`.
pub fn evaluate_slots<'a>(
    portfolio: &'a Portfolio,
    model: &BenefitModel,
    mode: AllocationMode,
    today: NaiveDate,
    epsilon: Decimal,
) -> Vec<EvaluatedSlot<'a>> {
    let max_util = portfolio.preferences.max_utilisation;

    let mut credit: Vec<_> = portfolio.credit_cards.iter().collect();
    credit.sort_by(|a, b| a.id.cmp(&b.id));

    let mut debit: Vec<_> = portfolio.debit_accounts.iter().collect();
    debit.sort_by(|a, b| {
        b.is_primary
            .cmp(&a.is_primary)
            .then(a.savings_rate_annual.cmp(&b.savings_rate_annual))
            .then(a.id.cmp(&b.id))
    });

    let mut backup: Vec<_> = portfolio.backup_cards.iter().collect();
    backup.sort_by(|a, b| a.id.cmp(&b.id));

    let credit_slots = credit.into_iter().map(|card| {
        EvaluatedSlot::new(
            FundingSource::Credit(card),
            credit_capacity(card, today, max_util),
            model,
            mode,
        )
    });
    let debit_slots = debit.into_iter().map(|account| {
        EvaluatedSlot::new(
            FundingSource::Debit(account),
            debit_capacity(account, today),
            model,
            mode,
        )
    });
    let backup_slots = backup.into_iter().map(|card| {
        EvaluatedSlot::new(FundingSource::Backup(card), backup_capacity(card), model, mode)
    });

    credit_slots
        .chain(debit_slots)
        .chain(backup_slots)
        .filter(|slot| slot.capacity > epsilon)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::category::SpendCategory;
    use crate::core::source::{BackupSource, CreditSource, DebitSource};
    use rust_decimal_macros::dec;

    fn model() -> BenefitModel {
        BenefitModel {
            category: SpendCategory::Grocery,
            fallback_category: SpendCategory::Other,
            pays_in_full: true,
            blended_savings_monthly: dec!(0.002),
            spend_amount: dec!(100),
            grace_basis_days: 30,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 10).unwrap()
    }

    #[test]
    fn test_canonical_order() {
        let portfolio = Portfolio::new("u", "User")
            .with_backup(BackupSource::new("z_backup", "Backup", dec!(500), dec!(0.02), dec!(0)))
            .with_debit(DebitSource::new("b_isa", "ISA", dec!(800), dec!(0.045)))
            .with_debit(DebitSource::new("a_saver", "Saver", dec!(800), dec!(0.03)))
            .with_debit(DebitSource::new("c_current", "Current", dec!(800), dec!(0.05)).primary())
            .with_credit(CreditSource::new("zeta", "Zeta", dec!(5000), dec!(0)))
            .with_credit(CreditSource::new("alpha", "Alpha", dec!(5000), dec!(0)));

        let slots = evaluate_slots(&portfolio, &model(), AllocationMode::Balanced, today(), dec!(0.01));
        let ids: Vec<&str> = slots.iter().map(|s| s.source.id().as_str()).collect();
        assert_eq!(ids, ["alpha", "zeta", "c_current", "a_saver", "b_isa", "z_backup"]);
    }

    #[test]
    fn test_tiny_capacity_excluded() {
        let portfolio = Portfolio::new("u", "User")
            .with_debit(DebitSource::new("dust", "Dust", dec!(0.01), dec!(0.01)))
            .with_debit(DebitSource::new("main", "Main", dec!(100), dec!(0.01)));
        let slots = evaluate_slots(&portfolio, &model(), AllocationMode::Balanced, today(), dec!(0.01));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].source.id().as_str(), "main");
    }

    #[test]
    fn test_ranking_rate_tracks_mode() {
        let portfolio = Portfolio::new("u", "User").with_credit(
            CreditSource::new("amex", "Amex", dec!(5000), dec!(0))
                .with_cashback(SpendCategory::Grocery, dec!(0.02)),
        );
        let slots = evaluate_slots(&portfolio, &model(), AllocationMode::InterestOnly, today(), dec!(0.01));
        assert_eq!(slots[0].net_benefit_rate, dec!(0.022));
        assert_eq!(slots[0].ranking_rate, dec!(0.002));
        assert_eq!(slots[0].capacity, dec!(1500));
    }
}
