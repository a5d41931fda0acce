//! Usable spending capacity per source for the current billing cycle.
//!
//! Every calculator clamps at zero and floors the result to whole currency
//! sub-units, so an allocation can always use the full reported capacity
//! without exceeding it.

use crate::core::schedule::CycleWindow;
use crate::core::source::{BackupSource, CreditSource, DebitSource};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Capacity of one source, with the pending debits that were reserved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capacity {
    pub usable: Decimal,
    pub pending_debits: Decimal,
}

impl Capacity {
    fn new(raw: Decimal, pending_debits: Decimal) -> Self {
        Self {
            usable: floor_to_minor(raw.max(Decimal::ZERO)),
            pending_debits,
        }
    }
}

fn floor_to_minor(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

/// `balance - pending debits up to month end`.
pub fn debit_capacity(account: &DebitSource, today: NaiveDate) -> Capacity {
    let pending = CycleWindow::new(today, None).pending_total(&account.scheduled_debits);
    Capacity::new(account.balance - pending, pending)
}

/// The two independent ceilings on a credit card's capacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreditCeilings {
    /// `limit - balance - pending`.
    pub raw_available: Decimal,
    /// `max_utilisation * limit - (balance + pending)`.
    pub utilisation_headroom: Decimal,
    pub pending_debits: Decimal,
}

impl CreditCeilings {
    pub fn compute(card: &CreditSource, today: NaiveDate, max_utilisation: Decimal) -> Self {
        let pending = CycleWindow::new(today, card.statement_close_day)
            .pending_total(&card.scheduled_debits);
        let committed = card.current_balance + pending;
        Self {
            raw_available: card.credit_limit - committed,
            utilisation_headroom: max_utilisation * card.credit_limit - committed,
            pending_debits: pending,
        }
    }

    /// True when the utilisation ceiling is the binding one.
    pub fn utilisation_bound(&self) -> bool {
        self.utilisation_headroom < self.raw_available
    }
}

/// `min(raw available, utilisation headroom)`, pending debits counted up to
/// the statement close day (or month end).
pub fn credit_capacity(card: &CreditSource, today: NaiveDate, max_utilisation: Decimal) -> Capacity {
    let ceilings = CreditCeilings::compute(card, today, max_utilisation);
    Capacity::new(
        ceilings.raw_available.min(ceilings.utilisation_headroom),
        ceilings.pending_debits,
    )
}

/// Backup cards have no scheduled-debit adjustment.
pub fn backup_capacity(card: &BackupSource) -> Capacity {
    Capacity::new(card.balance_home, Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schedule::ScheduledDebit;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_debit_capacity_reserves_pending() {
        let acc = DebitSource::new("current", "Current", dec!(1000), dec!(0.01))
            .with_scheduled_debit(ScheduledDebit::new(dec!(650), 28))
            .with_scheduled_debit(ScheduledDebit::new(dec!(40), 2));
        let cap = debit_capacity(&acc, date(2026, 2, 20));
        assert_eq!(cap.pending_debits, dec!(650));
        assert_eq!(cap.usable, dec!(350));
    }

    #[test]
    fn test_debit_capacity_clamped_at_zero() {
        let acc = DebitSource::new("current", "Current", dec!(100), dec!(0.01))
            .with_scheduled_debit(ScheduledDebit::new(dec!(650), 28));
        let cap = debit_capacity(&acc, date(2026, 2, 20));
        assert_eq!(cap.usable, Decimal::ZERO);
    }

    #[test]
    fn test_credit_capacity_utilisation_bound() {
        let card = CreditSource::new("amex", "Amex", dec!(12000), dec!(1800))
            .with_scheduled_debit(ScheduledDebit::new(dec!(73), 10));
        let ceilings = CreditCeilings::compute(&card, date(2026, 2, 1), dec!(0.30));
        assert_eq!(ceilings.raw_available, dec!(10127));
        assert_eq!(ceilings.utilisation_headroom, dec!(1727));
        assert!(ceilings.utilisation_bound());
        let cap = credit_capacity(&card, date(2026, 2, 1), dec!(0.30));
        assert_eq!(cap.usable, dec!(1727));
    }

    #[test]
    fn test_credit_capacity_raw_bound() {
        let card = CreditSource::new("chase", "Chase", dec!(1000), dec!(950));
        let cap = credit_capacity(&card, date(2026, 2, 1), Decimal::ONE);
        assert_eq!(cap.usable, dec!(50));
    }

    #[test]
    fn test_credit_capacity_over_utilised_is_zero() {
        let card = CreditSource::new("chase", "Chase", dec!(1000), dec!(400));
        let cap = credit_capacity(&card, date(2026, 2, 1), dec!(0.30));
        assert_eq!(cap.usable, Decimal::ZERO);
    }

    #[test]
    fn test_credit_pending_wraps_statement_close() {
        // close day 5, today the 28th of a 30-day month: debits on the 29th and 3rd count
        let card = CreditSource::new("amex", "Amex", dec!(5000), dec!(0))
            .with_statement_close_day(5)
            .with_scheduled_debit(ScheduledDebit::new(dec!(20), 29))
            .with_scheduled_debit(ScheduledDebit::new(dec!(30), 3))
            .with_scheduled_debit(ScheduledDebit::new(dec!(100), 12));
        let cap = credit_capacity(&card, date(2026, 4, 28), Decimal::ONE);
        assert_eq!(cap.pending_debits, dec!(50));
        assert_eq!(cap.usable, dec!(4950));
    }

    #[test]
    fn test_capacity_floored_to_minor_unit() {
        let card = CreditSource::new("odd", "Odd", dec!(1234.57), dec!(0));
        let cap = credit_capacity(&card, date(2026, 2, 1), dec!(0.33));
        // 0.33 * 1234.57 = 407.4081
        assert_eq!(cap.usable, dec!(407.40));
    }

    #[test]
    fn test_backup_capacity() {
        let card = BackupSource::new("sbi", "SBI", dec!(-5), dec!(0.025), dec!(3));
        assert_eq!(backup_capacity(&card).usable, Decimal::ZERO);
    }
}
