//! Sequential batch replay and random portfolio generation.

pub mod batch;
pub mod stress_test;
