//! Error types for fixed-point pool arithmetic
//!
//! Every fallible operation in the fixed-point layer, the scaling layer and the
//! pool math engines reports one of these variants. Engines are stateless, so an
//! error never leaves partial state behind: the caller simply discards the call.

use crate::common::fixed_point::FixedPoint;
use thiserror::Error;

/// Errors that can occur during fixed-point pool math
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MathError {
    /// Out-of-range weights, targets, token counts, indices or a negative result
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A zero denominator where a non-zero value is mathematically required
    #[error("Division by zero in fixed-point arithmetic")]
    DivisionByZero,

    /// Requested output is not smaller than the available balance
    #[error("Insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity {
        requested: FixedPoint,
        available: FixedPoint,
    },

    /// Swap fee percentage outside the configured bounds
    #[error("Swap fee percentage {fee} outside allowed range [{min}, {max}]")]
    FeeOutOfRange {
        fee: FixedPoint,
        min: FixedPoint,
        max: FixedPoint,
    },

    /// Intermediate or final value exceeds 256 bits
    #[error("Overflow: value exceeds 256-bit range")]
    Overflow,

    /// Invalid decimal string format
    #[error("Invalid decimal string: '{input}' - expected numeric format")]
    InvalidDecimal { input: String },
}

impl MathError {
    /// Shorthand for [`MathError::InvalidInput`]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }
}

/// Result alias used by every math entry point
pub type MathResult<T> = Result<T, MathError>;
