//! # Parity Types Library
//!
//! Fixed-point arithmetic and decimal scaling for off-chain replication of
//! on-chain AMM pool math.
//!
//! ## Design Philosophy
//!
//! - **Bit-Exact Parity**: every result matches the integer computation the pool
//!   contracts perform, including the last digit
//! - **No Precision Loss**: all values are 18-decimal scaled 256-bit integers
//! - **Explicit Rounding**: each multiplication and division names its direction
//! - **Clear Boundaries**: native token precision is converted only in [`precision`]
//!
//! ## Quick Start
//!
//! ### Fixed-Point Calculations
//! ```rust
//! use parity_types::FixedPoint;
//!
//! let balance = FixedPoint::from_decimal_str("1000").unwrap();
//! let weight = FixedPoint::from_decimal_str("0.5").unwrap();
//!
//! // Rounding direction is always explicit
//! let down = balance.pow_down(weight).unwrap();
//! let up = balance.pow_up(weight).unwrap();
//! assert!(down < up);
//! ```
//!
//! ### Native Token Precision
//! ```rust
//! use parity_types::{precision::upscale, TokenDecimals, U256};
//!
//! let usdc = TokenDecimals::new(6).unwrap();
//! let scaled = upscale(U256::new(2_500_000), usdc).unwrap();
//! assert_eq!(scaled.to_string(), "2.5");
//! ```
//!
//! ## Integration Points
//!
//! - **parity-amm**: stable, weighted and linear pool engines build on
//!   [`FixedPoint`] and [`common::integer`]
//! - **parity-config**: converts configured fee bounds into [`FeeBounds`]

pub mod common;

// Scaling between native token decimals and fixed point
pub mod precision;

pub use common::errors::{MathError, MathResult};
pub use common::fixed_point::FixedPoint;
pub use common::{integer, log_exp};
pub use precision::{FeeBounds, SwapFeePercentage, TokenDecimals};

// 256-bit integer types used for raw values
pub use ethnum::{I256, U256};
