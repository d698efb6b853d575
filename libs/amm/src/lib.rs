//! # Parity AMM Library - Bit-Exact Pool Mathematics
//!
//! ## Purpose
//!
//! Off-chain replica of the integer math that stable, weighted and linear pool
//! contracts run on-chain. Results match the contracts to the last raw unit:
//! same rounding direction per step, same Newton iterations, same log/exp
//! decomposition for fractional powers.
//!
//! ## Integration Points
//!
//! - **Input**: balances and parameters already upscaled to 18 decimals with
//!   [`parity_types::precision`]; swap fees deducted or added by the caller via
//!   [`parity_types::SwapFeePercentage`]
//! - **Output**: 18-decimal amounts, to be downscaled in the pool's favour
//! - **Engines**: [`StableMath`], [`WeightedMath`], [`LinearMath`]; no shared
//!   state, every call takes a full balance snapshot
//!
//! ## Rounding Discipline
//!
//! Amounts paid out by the pool round down, amounts the pool requires round up.
//! Each engine picks `*_down` or `*_up` per step to keep that guarantee.
//!
//! ## Example
//!
//! ```rust
//! use parity_amm::{AmplificationParameter, StableMath};
//! use parity_types::FixedPoint;
//!
//! let amp = AmplificationParameter::new(100).unwrap();
//! let balances = [FixedPoint::from_integer(1000), FixedPoint::from_integer(1000)];
//!
//! let out = StableMath::calc_out_given_in(amp, &balances, 0, 1, FixedPoint::from_integer(10)).unwrap();
//! assert!(out < FixedPoint::from_integer(10));
//! ```

pub mod linear_math;
pub mod stable_math;
pub mod weighted_math;

mod validation;

pub use linear_math::{LinearMath, LinearParams};
pub use stable_math::{AmplificationParameter, Convergence, NewtonSolution, StableMath};
pub use weighted_math::WeightedMath;

/// Common types for pool calculations
pub use parity_types::{FixedPoint, MathError, MathResult, SwapFeePercentage};
