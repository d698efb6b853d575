//! Precision Scaling Between Native Token Decimals and 18-Decimal Fixed Point
//!
//! Every pool engine works on balances expressed with 18 fractional digits. Token
//! amounts arrive in their native precision and must be converted on the way in
//! and out.
//!
//! ## Precision Requirements by Token
//!
//! - **WETH / DAI**: 18 decimal places, scaling factor 1
//! - **WBTC**: 8 decimal places, scaling factor 10^10
//! - **USDC / USDT**: 6 decimal places, scaling factor 10^12
//!
//! ## Critical Rules
//!
//! 1. **Upscaling is exact**: multiplying by 10^(18 - d) never loses precision
//! 2. **Downscaling picks a direction**: `downscale_down` for amounts the pool pays
//!    out, `downscale_up` for amounts the pool requires
//! 3. **Fees are validated once**: a [`SwapFeePercentage`] cannot hold a value
//!    outside its [`FeeBounds`]
//!
//! ## Example Usage
//!
//! ```rust
//! use parity_types::precision::{upscale, downscale_down, TokenDecimals};
//! use parity_types::U256;
//!
//! let usdc = TokenDecimals::new(6).unwrap();
//! let scaled = upscale(U256::new(5_000_000), usdc).unwrap(); // 5.0 USDC
//! assert_eq!(scaled.to_string(), "5");
//! assert_eq!(downscale_down(scaled, usdc).unwrap(), U256::new(5_000_000));
//! ```

use crate::common::errors::{MathError, MathResult};
use crate::common::fixed_point::FixedPoint;
use crate::common::integer;
use ethnum::U256;
use std::fmt;

/// Number of fractional digits a token uses natively (0..=18)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenDecimals(u8);

impl TokenDecimals {
    /// Highest supported precision; matches the fixed-point scale
    pub const MAX: u8 = 18;

    pub fn new(decimals: u8) -> MathResult<Self> {
        if decimals > Self::MAX {
            return Err(MathError::invalid(format!(
                "token decimals {decimals} exceed {}",
                Self::MAX
            )));
        }
        Ok(Self(decimals))
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    /// `10^(18 - decimals)`
    pub fn scaling_factor(self) -> U256 {
        U256::new(10).pow(u32::from(Self::MAX - self.0))
    }
}

impl fmt::Display for TokenDecimals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Native amount to 18-decimal fixed point
pub fn upscale(amount: U256, decimals: TokenDecimals) -> MathResult<FixedPoint> {
    integer::mul(amount, decimals.scaling_factor()).map(FixedPoint::from_raw)
}

/// 18-decimal fixed point to native amount, rounding down
pub fn downscale_down(amount: FixedPoint, decimals: TokenDecimals) -> MathResult<U256> {
    integer::div_down(amount.raw(), decimals.scaling_factor())
}

/// 18-decimal fixed point to native amount, rounding up
pub fn downscale_up(amount: FixedPoint, decimals: TokenDecimals) -> MathResult<U256> {
    integer::div_up(amount.raw(), decimals.scaling_factor())
}

/// Upscale a balance vector against a parallel decimals vector
pub fn upscale_all(amounts: &[U256], decimals: &[TokenDecimals]) -> MathResult<Vec<FixedPoint>> {
    check_lengths(amounts.len(), decimals.len())?;
    amounts
        .iter()
        .zip(decimals)
        .map(|(amount, d)| upscale(*amount, *d))
        .collect()
}

/// Downscale an output vector, rounding every entry down
pub fn downscale_all_down(
    amounts: &[FixedPoint],
    decimals: &[TokenDecimals],
) -> MathResult<Vec<U256>> {
    check_lengths(amounts.len(), decimals.len())?;
    amounts
        .iter()
        .zip(decimals)
        .map(|(amount, d)| downscale_down(*amount, *d))
        .collect()
}

fn check_lengths(amounts: usize, decimals: usize) -> MathResult<()> {
    if amounts != decimals {
        return Err(MathError::invalid(format!(
            "{amounts} amounts but {decimals} token decimals"
        )));
    }
    Ok(())
}

/// Inclusive bounds on the swap fee percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeBounds {
    pub min: FixedPoint,
    pub max: FixedPoint,
}

impl FeeBounds {
    /// 0.0001%
    pub const DEFAULT_MIN: FixedPoint = FixedPoint::from_raw_u128(1_000_000_000_000);
    /// 10%
    pub const DEFAULT_MAX: FixedPoint = FixedPoint::from_raw_u128(100_000_000_000_000_000);

    pub fn new(min: FixedPoint, max: FixedPoint) -> MathResult<Self> {
        if min > max {
            return Err(MathError::invalid(format!(
                "fee bounds inverted: min {min} > max {max}"
            )));
        }
        if max >= FixedPoint::ONE {
            return Err(MathError::invalid(format!("fee bound {max} must be below 1")));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, fee: FixedPoint) -> bool {
        fee >= self.min && fee <= self.max
    }
}

impl Default for FeeBounds {
    fn default() -> Self {
        Self {
            min: Self::DEFAULT_MIN,
            max: Self::DEFAULT_MAX,
        }
    }
}

/// Largest protocol share of swap fees (50%)
pub const MAX_PROTOCOL_SWAP_FEE_PERCENTAGE: FixedPoint =
    FixedPoint::from_raw_u128(500_000_000_000_000_000);

/// Protocol fee percentages live in `[0, 0.5]`
pub fn validate_protocol_swap_fee(fee: FixedPoint) -> MathResult<FixedPoint> {
    if fee > MAX_PROTOCOL_SWAP_FEE_PERCENTAGE {
        return Err(MathError::FeeOutOfRange {
            fee,
            min: FixedPoint::ZERO,
            max: MAX_PROTOCOL_SWAP_FEE_PERCENTAGE,
        });
    }
    Ok(fee)
}

/// Swap fee as a fraction of the traded amount, validated against [`FeeBounds`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SwapFeePercentage(FixedPoint);

impl SwapFeePercentage {
    /// Validate against the default bounds
    pub fn new(fee: FixedPoint) -> MathResult<Self> {
        Self::with_bounds(fee, FeeBounds::default())
    }

    pub fn with_bounds(fee: FixedPoint, bounds: FeeBounds) -> MathResult<Self> {
        if !bounds.contains(fee) {
            return Err(MathError::FeeOutOfRange {
                fee,
                min: bounds.min,
                max: bounds.max,
            });
        }
        Ok(Self(fee))
    }

    #[inline]
    pub fn value(self) -> FixedPoint {
        self.0
    }

    /// Fee charged on `amount`, rounded up
    pub fn fee_amount(self, amount: FixedPoint) -> MathResult<FixedPoint> {
        amount.mul_up(self.0)
    }

    /// Amount left after the fee for given-in swaps: `a - a * fee` (fee rounded up)
    pub fn subtract_swap_fee_amount(self, amount: FixedPoint) -> MathResult<FixedPoint> {
        amount.try_sub(self.fee_amount(amount)?)
    }

    /// Gross amount for given-out swaps: `a / (1 - fee)` rounded up
    pub fn add_swap_fee_amount(self, amount: FixedPoint) -> MathResult<FixedPoint> {
        amount.div_up(self.0.complement())
    }
}

impl fmt::Display for SwapFeePercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
