use crate::core::currency::FxError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Terminal failures of a single allocation call.
///
/// None of these leave any partial allocation behind: the engine never
/// mutates balances, so a failed call has no side effects.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AllocationError {
    #[error("transaction amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    #[error("cannot convert transaction currency: {0}")]
    UnknownCurrency(#[from] FxError),

    #[error("no available funding source for {requested}")]
    NoAvailableSource { requested: Decimal },

    #[error(
        "insufficient liquidity: requested {requested}, available {available} (shortfall {shortfall})"
    )]
    InsufficientLiquidity {
        requested: Decimal,
        available: Decimal,
        shortfall: Decimal,
    },

    #[error("optimisation failed: {unallocated} left unallocated despite sufficient capacity")]
    SolverInfeasible { unallocated: Decimal },
}

impl AllocationError {
    /// True for the failures callers surface as "not enough money".
    pub fn is_liquidity_failure(&self) -> bool {
        matches!(
            self,
            AllocationError::NoAvailableSource { .. } | AllocationError::InsufficientLiquidity { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AllocationError>;
