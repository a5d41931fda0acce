use crate::core::source::{BackupSource, CreditSource, DebitSource, SourceId, Tier};
use crate::optimization::composer::AllocationResult;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_max_utilisation() -> Decimal {
    dec!(0.30)
}

/// Per-user optimisation preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Whether the user clears the credit statement in full each month.
    #[serde(default = "default_true", alias = "always_pay_credit_in_full")]
    pub pays_in_full: bool,
    /// Ceiling on reported utilisation (balance / limit) per credit card.
    #[serde(default = "default_max_utilisation", alias = "max_credit_utilization")]
    pub max_utilisation: Decimal,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            pays_in_full: true,
            max_utilisation: default_max_utilisation(),
        }
    }
}

/// Read-only snapshot of one user's funding sources.
///
/// The engine borrows a portfolio per call and never mutates it. Applying
/// an allocation back to balances happens on an owned copy via
/// [`Portfolio::commit`], which is the caller's decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    #[serde(default, alias = "id")]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub credit_cards: Vec<CreditSource>,
    #[serde(default)]
    pub debit_accounts: Vec<DebitSource>,
    #[serde(default, alias = "backup_international_cards")]
    pub backup_cards: Vec<BackupSource>,
}

/// One balance movement produced by committing an allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceChange {
    pub source_id: SourceId,
    pub source_name: String,
    pub tier: Tier,
    pub field: String,
    pub before: Decimal,
    pub after: Decimal,
    pub delta: Decimal,
}

impl Portfolio {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn with_credit(mut self, card: CreditSource) -> Self {
        self.credit_cards.push(card);
        self
    }

    pub fn with_debit(mut self, account: DebitSource) -> Self {
        self.debit_accounts.push(account);
        self
    }

    pub fn with_backup(mut self, card: BackupSource) -> Self {
        self.backup_cards.push(card);
        self
    }

    pub fn source_count(&self) -> usize {
        self.credit_cards.len() + self.debit_accounts.len() + self.backup_cards.len()
    }

    pub fn total_debit_balance(&self) -> Decimal {
        self.debit_accounts.iter().map(|a| a.balance).sum()
    }

    /// Apply an allocation to this snapshot: credit balances grow, debit and
    /// backup balances shrink. Returns the before/after diff per line.
    ///
    /// Lines whose source id is not present in the snapshot are skipped.
    pub fn commit(&mut self, result: &AllocationResult) -> Vec<BalanceChange> {
        let mut changes = Vec::with_capacity(result.lines.len());

        for line in &result.lines {
            let change = match line.tier {
                Tier::Credit => self
                    .credit_cards
                    .iter_mut()
                    .find(|c| c.id == line.source_id)
                    .map(|card| {
                        let before = card.current_balance;
                        card.current_balance += line.amount;
                        change_for(&card.id, &card.name, Tier::Credit, "current_balance", before, card.current_balance)
                    }),
                Tier::Debit => self
                    .debit_accounts
                    .iter_mut()
                    .find(|a| a.id == line.source_id)
                    .map(|acc| {
                        let before = acc.balance;
                        acc.balance -= line.amount;
                        change_for(&acc.id, &acc.name, Tier::Debit, "balance", before, acc.balance)
                    }),
                Tier::Backup => self
                    .backup_cards
                    .iter_mut()
                    .find(|b| b.id == line.source_id)
                    .map(|card| {
                        let before = card.balance_home;
                        card.balance_home -= line.amount;
                        change_for(&card.id, &card.name, Tier::Backup, "balance_home", before, card.balance_home)
                    }),
            };

            match change {
                Some(change) => {
                    log::debug!(
                        "COMMIT | {:<6} {:<24} | {} -> {} ({:+})",
                        line.tier.number(),
                        change.source_name,
                        change.before,
                        change.after,
                        change.delta
                    );
                    changes.push(change);
                }
                None => log::warn!("COMMIT | source {} not in snapshot, skipped", line.source_id),
            }
        }

        changes
    }
}

fn change_for(
    id: &SourceId,
    name: &str,
    tier: Tier,
    field: &str,
    before: Decimal,
    after: Decimal,
) -> BalanceChange {
    BalanceChange {
        source_id: id.clone(),
        source_name: name.to_string(),
        tier,
        field: field.to_string(),
        before,
        after,
        delta: after - before,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_defaults() {
        let prefs: Preferences = serde_json::from_str("{}").unwrap();
        assert!(prefs.pays_in_full);
        assert_eq!(prefs.max_utilisation, dec!(0.30));
    }

    #[test]
    fn test_portfolio_legacy_keys() {
        let json = r#"{
            "id": "usr_003",
            "name": "Sam",
            "preferences": { "always_pay_credit_in_full": false, "max_credit_utilization": 0.5 },
            "debit_accounts": [
                { "id": "monzo", "name": "Monzo", "balance": 900, "savings_interest_rate_annual": 0.02, "is_primary": true }
            ],
            "backup_international_cards": [
                { "id": "sbi", "name": "SBI", "balance_gbp_approx": 400, "fx_spread_rate": 0.025, "transfer_fee_flat": 3 }
            ]
        }"#;
        let portfolio: Portfolio = serde_json::from_str(json).unwrap();
        assert_eq!(portfolio.user_id, "usr_003");
        assert!(!portfolio.preferences.pays_in_full);
        assert_eq!(portfolio.source_count(), 2);
        assert_eq!(portfolio.backup_cards[0].flat_fee, dec!(3));
        assert_eq!(portfolio.total_debit_balance(), dec!(900));
    }
}
