use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Merchant spend category of a transaction.
///
/// Cashback and reward-points tables are keyed by category. Several
/// category names used by upstream data feeds are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendCategory {
    Hotel,
    Travel,
    Grocery,
    #[serde(alias = "online_shopping")]
    Shopping,
    #[serde(alias = "fuel_transport")]
    Fuel,
    Dining,
    #[serde(alias = "general")]
    Other,
}

impl SpendCategory {
    pub const ALL: [SpendCategory; 7] = [
        SpendCategory::Hotel,
        SpendCategory::Travel,
        SpendCategory::Grocery,
        SpendCategory::Shopping,
        SpendCategory::Fuel,
        SpendCategory::Dining,
        SpendCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpendCategory::Hotel => "hotel",
            SpendCategory::Travel => "travel",
            SpendCategory::Grocery => "grocery",
            SpendCategory::Shopping => "shopping",
            SpendCategory::Fuel => "fuel",
            SpendCategory::Dining => "dining",
            SpendCategory::Other => "other",
        }
    }

    /// Categories where card rewards are worth chasing.
    pub fn is_reward_favourable(&self) -> bool {
        matches!(
            self,
            SpendCategory::Hotel
                | SpendCategory::Travel
                | SpendCategory::Fuel
                | SpendCategory::Shopping
        )
    }

    /// The allocation mode implied by this category.
    pub fn default_mode(&self) -> AllocationMode {
        if self.is_reward_favourable() {
            AllocationMode::Balanced
        } else {
            AllocationMode::InterestOnly
        }
    }
}

impl Default for SpendCategory {
    fn default() -> Self {
        SpendCategory::Other
    }
}

impl fmt::Display for SpendCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown spend category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for SpendCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hotel" => Ok(SpendCategory::Hotel),
            "travel" => Ok(SpendCategory::Travel),
            "grocery" => Ok(SpendCategory::Grocery),
            "shopping" | "online_shopping" => Ok(SpendCategory::Shopping),
            "fuel" | "fuel_transport" => Ok(SpendCategory::Fuel),
            "dining" => Ok(SpendCategory::Dining),
            "other" | "general" => Ok(SpendCategory::Other),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// How credit-card cashback is weighed when ranking sources.
///
/// In `Balanced` mode cashback counts at full value. In `InterestOnly` mode
/// cashback is removed from the ranking rate so that preserving savings
/// interest drives the ordering; reported cashback is unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    Balanced,
    InterestOnly,
}

impl AllocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationMode::Balanced => "balanced",
            AllocationMode::InterestOnly => "interest_only",
        }
    }
}

impl fmt::Display for AllocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllocationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "balanced" => Ok(AllocationMode::Balanced),
            "interest_only" | "interest-only" => Ok(AllocationMode::InterestOnly),
            other => Err(format!("unknown allocation mode '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_favourable_set() {
        let favourable: Vec<_> = SpendCategory::ALL
            .iter()
            .filter(|c| c.is_reward_favourable())
            .collect();
        assert_eq!(favourable.len(), 4);
        assert!(!SpendCategory::Grocery.is_reward_favourable());
    }

    #[test]
    fn test_default_mode_follows_category() {
        assert_eq!(SpendCategory::Hotel.default_mode(), AllocationMode::Balanced);
        assert_eq!(SpendCategory::Other.default_mode(), AllocationMode::InterestOnly);
    }

    #[test]
    fn test_aliases_parse() {
        assert_eq!("fuel_transport".parse(), Ok(SpendCategory::Fuel));
        assert_eq!("General".parse(), Ok(SpendCategory::Other));
        let cat: SpendCategory = serde_json::from_str("\"online_shopping\"").unwrap();
        assert_eq!(cat, SpendCategory::Shopping);
    }

    #[test]
    fn test_unknown_category() {
        assert!("casino".parse::<SpendCategory>().is_err());
    }
}
