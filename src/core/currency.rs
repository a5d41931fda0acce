use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// ISO 4217-style currency code.
///
/// Codes are normalised to upper case so that `"gbp"` and `"GBP"` compare
/// equal and look up the same FX rate.
///
/// # Examples
///
/// ```
/// use funding_allocator::core::currency::CurrencyCode;
///
/// let gbp = CurrencyCode::new("gbp");
/// assert_eq!(gbp.as_str(), "GBP");
/// assert_eq!(gbp.symbol(), "£");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display symbol used in user-facing strings.
    pub fn symbol(&self) -> &str {
        match self.0.as_str() {
            "GBP" => "£",
            "USD" => "$",
            "EUR" => "€",
            "INR" => "₹",
            "AUD" => "A$",
            other => other,
        }
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("GBP")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CurrencyCode {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// Errors arising from FX rate operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FxError {
    #[error("no FX rate available for {from} -> {to}")]
    RateNotFound {
        from: CurrencyCode,
        to: CurrencyCode,
    },
    #[error("FX rate must be positive, got {rate} for {from} -> {to}")]
    InvalidRate {
        from: CurrencyCode,
        to: CurrencyCode,
        rate: Decimal,
    },
}

/// Fixed table of exchange rates into a single home currency.
///
/// There is no live feed: conversions are deterministic given the table.
/// Rates are stored as "1 unit of `from` = `rate` units of home currency".
///
/// # Examples
///
/// ```
/// use funding_allocator::core::currency::{CurrencyCode, FxRateTable};
/// use rust_decimal_macros::dec;
///
/// let table = FxRateTable::reference();
/// let gbp = table.to_home(dec!(100), &CurrencyCode::new("USD")).unwrap();
/// assert_eq!(gbp, dec!(79.12));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxRateTable {
    /// The currency every transaction is normalised into.
    pub home_currency: CurrencyCode,
    /// Rates into the home currency, keyed by source currency.
    rates: HashMap<CurrencyCode, Decimal>,
}

impl FxRateTable {
    /// Create an empty table for the given home currency.
    pub fn new(home_currency: CurrencyCode) -> Self {
        Self {
            home_currency,
            rates: HashMap::new(),
        }
    }

    /// The built-in GBP table.
    pub fn reference() -> Self {
        let mut table = Self::new(CurrencyCode::new("GBP"));
        for (code, rate) in [
            ("USD", dec!(0.7912)),
            ("EUR", dec!(0.8521)),
            ("INR", dec!(0.00951)),
            ("AUD", dec!(0.5080)),
        ] {
            table.rates.insert(CurrencyCode::new(code), rate);
        }
        table
    }

    /// Set the rate for one unit of `from` expressed in home currency.
    pub fn set_rate(&mut self, from: CurrencyCode, rate: Decimal) -> Result<(), FxError> {
        if rate <= Decimal::ZERO {
            return Err(FxError::InvalidRate {
                from,
                to: self.home_currency.clone(),
                rate,
            });
        }
        self.rates.insert(from, rate);
        Ok(())
    }

    /// Rate from `from` into the home currency.
    pub fn rate_to_home(&self, from: &CurrencyCode) -> Result<Decimal, FxError> {
        if *from == self.home_currency {
            return Ok(Decimal::ONE);
        }
        self.rates
            .get(from)
            .copied()
            .ok_or_else(|| FxError::RateNotFound {
                from: from.clone(),
                to: self.home_currency.clone(),
            })
    }

    /// Convert an amount into the home currency (unrounded).
    pub fn to_home(&self, amount: Decimal, from: &CurrencyCode) -> Result<Decimal, FxError> {
        Ok(amount * self.rate_to_home(from)?)
    }

    /// Currencies with a known rate, sorted, home currency included.
    pub fn currencies(&self) -> Vec<CurrencyCode> {
        let mut codes: Vec<CurrencyCode> = self.rates.keys().cloned().collect();
        codes.push(self.home_currency.clone());
        codes.sort();
        codes.dedup();
        codes
    }
}

impl Default for FxRateTable {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_code_normalised() {
        assert_eq!(CurrencyCode::new(" usd "), CurrencyCode::new("USD"));
    }

    #[test]
    fn test_home_currency_is_parity() {
        let table = FxRateTable::reference();
        let rate = table.rate_to_home(&CurrencyCode::new("GBP")).unwrap();
        assert_eq!(rate, Decimal::ONE);
    }

    #[test]
    fn test_reference_conversion() {
        let table = FxRateTable::reference();
        let converted = table
            .to_home(dec!(10000), &CurrencyCode::new("INR"))
            .unwrap();
        assert_eq!(converted, dec!(95.1));
    }

    #[test]
    fn test_unknown_currency_rejected() {
        let table = FxRateTable::reference();
        let err = table.rate_to_home(&CurrencyCode::new("JPY")).unwrap_err();
        assert!(matches!(err, FxError::RateNotFound { .. }));
    }

    #[test]
    fn test_invalid_rate() {
        let mut table = FxRateTable::new(CurrencyCode::new("GBP"));
        let result = table.set_rate(CurrencyCode::new("CHF"), dec!(-0.5));
        assert!(result.is_err());
    }

    #[test]
    fn test_symbol_falls_back_to_code() {
        assert_eq!(CurrencyCode::new("CHF").symbol(), "CHF");
        assert_eq!(CurrencyCode::new("EUR").symbol(), "€");
    }

    #[test]
    fn test_currency_code_serde_normalises() {
        let code: CurrencyCode = serde_json::from_str("\"eur\"").unwrap();
        assert_eq!(code.as_str(), "EUR");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"EUR\"");
    }
}
