use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A recurring debit that fires on a fixed day of each month
/// (direct debits, standing orders, subscriptions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledDebit {
    #[serde(default)]
    pub name: Option<String>,
    pub amount: Decimal,
    #[serde(alias = "day_of_month")]
    pub day: u32,
}

impl ScheduledDebit {
    pub fn new(amount: Decimal, day: u32) -> Self {
        Self {
            name: None,
            amount,
            day,
        }
    }

    pub fn named(name: impl Into<String>, amount: Decimal, day: u32) -> Self {
        Self {
            name: Some(name.into()),
            amount,
            day,
        }
    }
}

/// Number of days in the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// The remaining days of the current billing cycle, from today to the
/// cycle-close day inclusive.
///
/// Without a close day the cycle ends at month end. When today is already
/// past the close day, the window wraps across the month boundary:
/// `{today..=month_end} ∪ {1..=close}`. Day numbers beyond the length of the
/// current month are clamped to its last day.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use funding_allocator::core::schedule::CycleWindow;
///
/// let today = NaiveDate::from_ymd_opt(2026, 4, 28).unwrap();
/// let window = CycleWindow::new(today, Some(5));
/// assert!(window.contains(29));
/// assert!(window.contains(3));
/// assert!(!window.contains(10));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleWindow {
    today: u32,
    close: u32,
    month_end: u32,
}

impl CycleWindow {
    pub fn new(today: NaiveDate, close_day: Option<u32>) -> Self {
        let month_end = days_in_month(today);
        let close = close_day
            .filter(|d| *d > 0)
            .map(|d| d.min(month_end))
            .unwrap_or(month_end);
        Self {
            today: today.day(),
            close,
            month_end,
        }
    }

    /// True when the cycle crosses into next month.
    pub fn wraps(&self) -> bool {
        self.today > self.close
    }

    pub fn contains(&self, day: u32) -> bool {
        let day = day.min(self.month_end);
        if self.wraps() {
            day >= self.today || day <= self.close
        } else {
            day >= self.today && day <= self.close
        }
    }

    /// Total of the scheduled debits that fire inside this window.
    pub fn pending_total(&self, debits: &[ScheduledDebit]) -> Decimal {
        debits
            .iter()
            .filter(|d| self.contains(d.day))
            .map(|d| d.amount)
            .sum()
    }
}
