//! # funding-allocator
//!
//! Splits a single payment across a user's funding sources so as to
//! maximise end-of-month cash.
//!
//! Given a portfolio snapshot (credit cards, debit/savings accounts and
//! international backup cards) and one transaction, the engine computes how
//! much each source can safely absorb this cycle, the net benefit of every
//! unit spent on it, and the allocation with the highest total benefit.
//!
//! ## Architecture
//!
//! - **core** — Foundational types: currencies, categories, sources, schedules, portfolios
//! - **optimization** — Capacity, benefit rates, allocation strategies, result composition
//! - **simulation** — Sequential batch replay and random portfolio generation
//! - **narrative** — Optional human-readable explanations
//!
//! ```
//! use funding_allocator::prelude::*;
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let portfolio = Portfolio::new("usr_001", "Alex")
//!     .with_credit(
//!         CreditSource::new("amex", "Amex Gold", dec!(5000), dec!(0))
//!             .with_cashback(SpendCategory::Hotel, dec!(0.05)),
//!     )
//!     .with_debit(DebitSource::new("current", "Current", dec!(1500), dec!(0.01)).primary());
//!
//! let request = TransactionRequest::new(dec!(120), CurrencyCode::new("GBP"), SpendCategory::Hotel);
//! let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
//! let result = AllocationEngine::default().optimise(&request, &portfolio, today).unwrap();
//!
//! assert_eq!(result.decision, Decision::CreditOptimised);
//! assert_eq!(result.eom_impact.total_cashback_earned, dec!(6));
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod narrative;
pub mod optimization;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::core::category::{AllocationMode, SpendCategory};
    pub use crate::core::currency::{CurrencyCode, FxRateTable};
    pub use crate::core::portfolio::{BalanceChange, Portfolio, Preferences};
    pub use crate::core::schedule::ScheduledDebit;
    pub use crate::core::source::{BackupSource, CreditSource, DebitSource, SourceId, Tier};
    pub use crate::core::transaction::TransactionRequest;
    pub use crate::error::{AllocationError, Result};
    pub use crate::optimization::allocator::StrategyKind;
    pub use crate::optimization::composer::{AllocationLine, AllocationResult};
    pub use crate::optimization::decision::Decision;
    pub use crate::optimization::engine::AllocationEngine;
}
