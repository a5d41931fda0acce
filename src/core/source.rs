use crate::core::category::SpendCategory;
use crate::core::schedule::ScheduledDebit;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unique identifier for a funding source (card or account).
///
/// # Examples
///
/// ```
/// use funding_allocator::core::source::SourceId;
///
/// let amex = SourceId::new("amex_platinum");
/// let chase = SourceId::new("chase_freedom");
/// assert!(amex < chase);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Priority class of a funding source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Tier {
    Credit = 1,
    Debit = 2,
    Backup = 3,
}

impl Tier {
    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Credit => "Credit Card",
            Tier::Debit => "Debit Account",
            Tier::Backup => "Intl Backup",
        }
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.number()
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Tier::Credit),
            2 => Ok(Tier::Debit),
            3 => Ok(Tier::Backup),
            other => Err(format!("invalid tier {other}, expected 1, 2 or 3")),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-category rate table (cashback fractions or points per unit).
///
/// Lookups fall back to a caller-supplied default category when the
/// requested category is missing, and to zero when that is missing too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryRates(BTreeMap<SpendCategory, Decimal>);

impl CategoryRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: SpendCategory, rate: Decimal) -> Self {
        self.0.insert(category, rate);
        self
    }

    pub fn rate_for(&self, category: SpendCategory, fallback: SpendCategory) -> Decimal {
        self.0
            .get(&category)
            .or_else(|| self.0.get(&fallback))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(SpendCategory, Decimal)> for CategoryRates {
    fn from_iter<T: IntoIterator<Item = (SpendCategory, Decimal)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn default_grace_days() -> u32 {
    30
}

fn default_apr() -> Decimal {
    dec!(0.229)
}

/// A credit card: earns cashback, defers payment by the grace period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditSource {
    pub id: SourceId,
    pub name: String,
    pub credit_limit: Decimal,
    pub current_balance: Decimal,
    #[serde(default)]
    pub cashback_rates: CategoryRates,
    #[serde(default = "default_apr", alias = "apr")]
    pub apr_annual: Decimal,
    #[serde(default = "default_grace_days")]
    pub grace_period_days: u32,
    #[serde(default)]
    pub statement_close_day: Option<u32>,
    #[serde(default, alias = "reward_points_per_pound")]
    pub reward_points: Option<CategoryRates>,
    #[serde(default, alias = "reward_type")]
    pub reward_label: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default, alias = "auto_debits")]
    pub scheduled_debits: Vec<ScheduledDebit>,
}

impl CreditSource {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        credit_limit: Decimal,
        current_balance: Decimal,
    ) -> Self {
        Self {
            id: SourceId::new(id),
            name: name.into(),
            credit_limit,
            current_balance,
            cashback_rates: CategoryRates::new(),
            apr_annual: default_apr(),
            grace_period_days: default_grace_days(),
            statement_close_day: None,
            reward_points: None,
            reward_label: None,
            badge: None,
            scheduled_debits: Vec::new(),
        }
    }

    pub fn with_cashback(mut self, category: SpendCategory, rate: Decimal) -> Self {
        self.cashback_rates = self.cashback_rates.with(category, rate);
        self
    }

    pub fn with_points(mut self, category: SpendCategory, per_unit: Decimal) -> Self {
        let points = self.reward_points.take().unwrap_or_default();
        self.reward_points = Some(points.with(category, per_unit));
        self
    }

    pub fn with_reward_label(mut self, label: impl Into<String>) -> Self {
        self.reward_label = Some(label.into());
        self
    }

    pub fn with_apr(mut self, apr_annual: Decimal) -> Self {
        self.apr_annual = apr_annual;
        self
    }

    pub fn with_grace_days(mut self, days: u32) -> Self {
        self.grace_period_days = days;
        self
    }

    pub fn with_statement_close_day(mut self, day: u32) -> Self {
        self.statement_close_day = Some(day);
        self
    }

    pub fn with_badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }

    pub fn with_scheduled_debit(mut self, debit: ScheduledDebit) -> Self {
        self.scheduled_debits.push(debit);
        self
    }

    pub fn available_credit(&self) -> Decimal {
        self.credit_limit - self.current_balance
    }
}

/// A current or savings account: spending drains interest-earning balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebitSource {
    pub id: SourceId,
    pub name: String,
    pub balance: Decimal,
    #[serde(alias = "savings_interest_rate_annual")]
    pub savings_rate_annual: Decimal,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default, alias = "auto_debits")]
    pub scheduled_debits: Vec<ScheduledDebit>,
}

impl DebitSource {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        balance: Decimal,
        savings_rate_annual: Decimal,
    ) -> Self {
        Self {
            id: SourceId::new(id),
            name: name.into(),
            balance,
            savings_rate_annual,
            is_primary: false,
            scheduled_debits: Vec::new(),
        }
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    pub fn with_scheduled_debit(mut self, debit: ScheduledDebit) -> Self {
        self.scheduled_debits.push(debit);
        self
    }

    pub fn savings_rate_monthly(&self) -> Decimal {
        self.savings_rate_annual / Decimal::from(12)
    }

    /// Interest this balance earns in a month.
    pub fn monthly_interest(&self) -> Decimal {
        self.balance * self.savings_rate_monthly()
    }
}

/// Last-resort international card; balance already expressed in home currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSource {
    pub id: SourceId,
    pub name: String,
    #[serde(alias = "balance_gbp_approx")]
    pub balance_home: Decimal,
    pub fx_spread_rate: Decimal,
    #[serde(default, alias = "transfer_fee_flat")]
    pub flat_fee: Decimal,
    #[serde(default, alias = "estimated_transfer_hours")]
    pub transfer_hours: u32,
}

impl BackupSource {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        balance_home: Decimal,
        fx_spread_rate: Decimal,
        flat_fee: Decimal,
    ) -> Self {
        Self {
            id: SourceId::new(id),
            name: name.into(),
            balance_home,
            fx_spread_rate,
            flat_fee,
            transfer_hours: 0,
        }
    }
}

/// Borrowed view over any of the three source kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FundingSource<'a> {
    Credit(&'a CreditSource),
    Debit(&'a DebitSource),
    Backup(&'a BackupSource),
}

impl<'a> FundingSource<'a> {
    pub fn id(&self) -> &'a SourceId {
        match self {
            FundingSource::Credit(c) => &c.id,
            FundingSource::Debit(d) => &d.id,
            FundingSource::Backup(b) => &b.id,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            FundingSource::Credit(c) => &c.name,
            FundingSource::Debit(d) => &d.name,
            FundingSource::Backup(b) => &b.name,
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            FundingSource::Credit(_) => Tier::Credit,
            FundingSource::Debit(_) => Tier::Debit,
            FundingSource::Backup(_) => Tier::Backup,
        }
    }

    pub fn badge(&self) -> Option<&'a str> {
        match self {
            FundingSource::Credit(c) => c.badge.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_rate_fallback() {
        let rates = CategoryRates::new()
            .with(SpendCategory::Hotel, dec!(0.05))
            .with(SpendCategory::Other, dec!(0.01));
        assert_eq!(rates.rate_for(SpendCategory::Hotel, SpendCategory::Other), dec!(0.05));
        assert_eq!(rates.rate_for(SpendCategory::Fuel, SpendCategory::Other), dec!(0.01));
        assert_eq!(
            CategoryRates::new().rate_for(SpendCategory::Fuel, SpendCategory::Other),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_tier_numbers() {
        assert_eq!(Tier::Credit.number(), 1);
        assert_eq!(Tier::Backup.number(), 3);
        assert!(Tier::try_from(4).is_err());
        assert_eq!(serde_json::to_string(&Tier::Debit).unwrap(), "2");
    }

    #[test]
    fn test_credit_source_deserializes_legacy_fields() {
        let json = r#"{
            "id": "amex",
            "name": "Amex Platinum",
            "credit_limit": 12000,
            "current_balance": 1800,
            "cashback_rates": { "hotel": 0.05, "other": 0.01 },
            "apr_annual": 0.299,
            "reward_points_per_pound": { "hotel": 5 },
            "reward_type": "membership_rewards",
            "auto_debits": [ { "name": "Spotify", "amount": 10.99, "day_of_month": 3 } ]
        }"#;
        let card: CreditSource = serde_json::from_str(json).unwrap();
        assert_eq!(card.grace_period_days, 30);
        assert_eq!(card.scheduled_debits.len(), 1);
        assert_eq!(card.scheduled_debits[0].day, 3);
        assert_eq!(card.reward_label.as_deref(), Some("membership_rewards"));
        assert_eq!(card.available_credit(), dec!(10200));
    }

    #[test]
    fn test_debit_monthly_interest() {
        let acc = DebitSource::new("isa", "Cash ISA", dec!(12000), dec!(0.045));
        assert_eq!(acc.monthly_interest(), dec!(45));
    }

    #[test]
    fn test_funding_source_view() {
        let backup = BackupSource::new("sbi", "State Bank of India", dec!(800), dec!(0.025), dec!(5));
        let view = FundingSource::Backup(&backup);
        assert_eq!(view.tier(), Tier::Backup);
        assert_eq!(view.name(), "State Bank of India");
        assert_eq!(view.badge(), None);
    }
}
