//! Capacity, benefit rates, allocation strategies and result composition.

pub mod allocator;
pub mod benefit;
pub mod capacity;
pub mod composer;
pub mod decision;
pub mod engine;
pub mod liquidity;
pub mod slot;
