use crate::core::category::{AllocationMode, SpendCategory};
use crate::core::currency::CurrencyCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single payment to be funded from the user's sources.
///
/// # Examples
///
/// ```
/// use funding_allocator::core::category::SpendCategory;
/// use funding_allocator::core::currency::CurrencyCode;
/// use funding_allocator::core::transaction::TransactionRequest;
/// use rust_decimal_macros::dec;
///
/// let txn = TransactionRequest::new(dec!(185), CurrencyCode::new("GBP"), SpendCategory::Hotel)
///     .with_merchant("Premier Inn");
///
/// assert_eq!(txn.amount, dec!(185));
/// assert_eq!(txn.label(), "Premier Inn");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub amount: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default)]
    pub category: SpendCategory,
    /// Explicit override of the category-derived allocation mode.
    #[serde(default)]
    pub mode: Option<AllocationMode>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub merchant: Option<String>,
}

impl TransactionRequest {
    /// Create a new request with a random id.
    ///
    /// # Panics
    ///
    /// Panics if `amount` is not positive.
    pub fn new(amount: Decimal, currency: CurrencyCode, category: SpendCategory) -> Self {
        Self::with_id(Uuid::new_v4(), amount, currency, category)
    }

    /// Create a request with a specific id (useful for testing / determinism).
    pub fn with_id(
        id: Uuid,
        amount: Decimal,
        currency: CurrencyCode,
        category: SpendCategory,
    ) -> Self {
        assert!(
            amount > Decimal::ZERO,
            "Transaction amount must be positive, got {}",
            amount
        );
        Self {
            id,
            amount,
            currency,
            category,
            mode: None,
            description: None,
            merchant: None,
        }
    }

    pub fn with_mode(mut self, mode: AllocationMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant = Some(merchant.into());
        self
    }

    /// Mode in effect: the explicit override, else the category default.
    pub fn effective_mode(&self) -> AllocationMode {
        self.mode.unwrap_or_else(|| self.category.default_mode())
    }

    /// Short human label: description, then merchant, then a generic name.
    pub fn label(&self) -> &str {
        self.description
            .as_deref()
            .or(self.merchant.as_deref())
            .unwrap_or("Transaction")
    }
}
