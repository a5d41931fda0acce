//! Foundational value types: currencies, categories, funding sources,
//! scheduled debits, transaction requests and portfolio snapshots.

pub mod category;
pub mod currency;
pub mod portfolio;
pub mod schedule;
pub mod source;
pub mod transaction;
