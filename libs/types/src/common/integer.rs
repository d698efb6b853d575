//! Checked integer arithmetic on raw 256-bit values
//!
//! These helpers operate on plain integers, not on 18-decimal fixed-point
//! values: no scaling factor is applied. The Newton solvers and BPT supply
//! ratios use them wherever the on-chain code uses integer math.

use crate::common::errors::{MathError, MathResult};
use ethnum::U256;

/// Checked addition
#[inline]
pub fn add(a: U256, b: U256) -> MathResult<U256> {
    a.checked_add(b).ok_or(MathError::Overflow)
}

/// Checked subtraction; a negative result is an input error
#[inline]
pub fn sub(a: U256, b: U256) -> MathResult<U256> {
    a.checked_sub(b)
        .ok_or_else(|| MathError::invalid(format!("subtraction underflow: {a} - {b}")))
}

/// Checked multiplication
#[inline]
pub fn mul(a: U256, b: U256) -> MathResult<U256> {
    a.checked_mul(b).ok_or(MathError::Overflow)
}

/// Truncating division
#[inline]
pub fn div_down(a: U256, b: U256) -> MathResult<U256> {
    if b == U256::ZERO {
        return Err(MathError::DivisionByZero);
    }
    Ok(a / b)
}

/// Ceiling division; an exact zero numerator stays zero
#[inline]
pub fn div_up(a: U256, b: U256) -> MathResult<U256> {
    if b == U256::ZERO {
        return Err(MathError::DivisionByZero);
    }
    if a == U256::ZERO {
        Ok(U256::ZERO)
    } else {
        Ok(U256::ONE + (a - U256::ONE) / b)
    }
}

/// Absolute difference, used by the solvers' convergence checks
#[inline]
pub fn abs_diff(a: U256, b: U256) -> U256 {
    if a > b {
        a - b
    } else {
        b - a
    }
}
