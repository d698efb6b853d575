//! 18-decimal fixed-point arithmetic with explicit rounding direction
//!
//! `FixedPoint` stores a non-negative real number as an unsigned 256-bit
//! integer scaled by 10^18, the same representation the on-chain pool contracts
//! use. Every multiplication and division exists in a round-down and a
//! round-up flavour, and callers pick one deliberately: amounts owed to the
//! pool round up, amounts owed to the user round down.
//!
//! ## Design Principles
//!
//! - **No Silent Wrapping**: every operation is checked; overflow is an error
//! - **Pinned Rounding**: `mul_up`/`div_up` never round an exact zero up
//! - **Pinned Power Algorithm**: non-integer powers go through [`crate::log_exp`],
//!   the exact integer ln/exp decomposition used on-chain
//!
//! ```
//! use parity_types::FixedPoint;
//!
//! let a = FixedPoint::from_decimal_str("1.5").unwrap();
//! let b = FixedPoint::from_decimal_str("0.3").unwrap();
//! assert_eq!(a.mul_down(b).unwrap().to_string(), "0.45");
//! ```

use crate::common::errors::{MathError, MathResult};
use crate::common::log_exp;
use ethnum::U256;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

const SCALE: U256 = U256::new(1_000_000_000_000_000_000);

// 2^96 - 1
const MAX_DECIMAL_MANTISSA: u128 = 79_228_162_514_264_337_593_543_950_335;

/// Non-negative 18-decimal fixed-point number
///
/// Examples:
/// - 1.0 = FixedPoint(1_000_000_000_000_000_000)
/// - 0.01 = FixedPoint(10_000_000_000_000_000)
/// - 10^-18 = FixedPoint(1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedPoint(U256);

impl FixedPoint {
    /// Number of fractional decimal digits
    pub const DECIMALS: u32 = 18;

    /// Zero
    pub const ZERO: Self = Self(U256::ZERO);

    /// Smallest representable increment (10^-18)
    pub const EPSILON: Self = Self(U256::ONE);

    /// 1.0
    pub const ONE: Self = Self(SCALE);

    /// 2.0
    pub const TWO: Self = Self(U256::new(2_000_000_000_000_000_000));

    /// 4.0
    pub const FOUR: Self = Self(U256::new(4_000_000_000_000_000_000));

    /// Relative error bound of [`log_exp::pow`] (10^-14)
    pub const MAX_POW_RELATIVE_ERROR: Self = Self(U256::new(10_000));

    /// Smallest base for which `x^y` is accurate for any exponent (0.7)
    pub const MIN_POW_BASE_FREE_EXPONENT: Self = Self(U256::new(700_000_000_000_000_000));

    /// Create from a raw scaled integer
    #[inline]
    pub const fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    /// Create from a raw scaled `u128`
    #[inline]
    pub const fn from_raw_u128(raw: u128) -> Self {
        Self(U256::new(raw))
    }

    /// Create from a whole number (`7` becomes `7.0`)
    ///
    /// Cannot overflow: `u128::MAX * 10^18` is far below `2^256`.
    pub fn from_integer(value: u128) -> Self {
        Self(U256::new(value) * SCALE)
    }

    /// Create from an exact decimal
    ///
    /// Rejects negative values and values with more than 18 fractional digits.
    pub fn from_decimal(value: Decimal) -> MathResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(MathError::invalid(format!(
                "fixed-point values are non-negative, got {value}"
            )));
        }
        let scale = value.scale();
        if scale > Self::DECIMALS {
            return Err(MathError::invalid(format!(
                "{value} has {scale} fractional digits, at most 18 are representable"
            )));
        }
        let mantissa = U256::new(value.mantissa().unsigned_abs());
        let factor = U256::new(10).pow(Self::DECIMALS - scale);
        mantissa
            .checked_mul(factor)
            .map(Self)
            .ok_or(MathError::Overflow)
    }

    /// Create from a decimal string with exact parsing
    ///
    /// This is the primary way to build values from human-readable input such
    /// as configuration files and test fixtures.
    pub fn from_decimal_str(s: &str) -> MathResult<Self> {
        let decimal = Decimal::from_str(s.trim()).map_err(|_| MathError::InvalidDecimal {
            input: s.to_string(),
        })?;
        Self::from_decimal(decimal)
    }

    /// Convert to a `Decimal`, `None` if the value exceeds its 96-bit mantissa
    pub fn to_decimal(self) -> Option<Decimal> {
        let ten = U256::new(10);
        let mut mantissa = self.0;
        let mut scale = Self::DECIMALS;
        while scale > 0 && mantissa % ten == U256::ZERO {
            mantissa /= ten;
            scale -= 1;
        }
        if mantissa > U256::new(MAX_DECIMAL_MANTISSA) {
            return None;
        }
        Decimal::try_from_i128_with_scale(mantissa.as_u128() as i128, scale).ok()
    }

    /// Get the raw scaled integer value
    #[inline]
    pub const fn raw(self) -> U256 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == U256::ZERO
    }

    // CHECKED ARITHMETIC - plain addition and subtraction of scaled values

    /// Checked addition
    pub fn try_add(self, rhs: Self) -> MathResult<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(MathError::Overflow)
    }

    /// Checked subtraction; a negative result is an input error
    pub fn try_sub(self, rhs: Self) -> MathResult<Self> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or_else(|| MathError::invalid(format!("negative result: {self} - {rhs}")))
    }

    // FIXED-POINT ARITHMETIC - one scaling factor is removed or added per call

    /// `floor(a * b / 10^18)`
    pub fn mul_down(self, rhs: Self) -> MathResult<Self> {
        let product = self.0.checked_mul(rhs.0).ok_or(MathError::Overflow)?;
        Ok(Self(product / SCALE))
    }

    /// `ceil(a * b / 10^18)`, zero when the product is zero
    pub fn mul_up(self, rhs: Self) -> MathResult<Self> {
        let product = self.0.checked_mul(rhs.0).ok_or(MathError::Overflow)?;
        if product == U256::ZERO {
            Ok(Self::ZERO)
        } else {
            Ok(Self((product - U256::ONE) / SCALE + U256::ONE))
        }
    }

    /// `floor(a * 10^18 / b)`
    pub fn div_down(self, rhs: Self) -> MathResult<Self> {
        if rhs.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        if self.is_zero() {
            return Ok(Self::ZERO);
        }
        let inflated = self.0.checked_mul(SCALE).ok_or(MathError::Overflow)?;
        Ok(Self(inflated / rhs.0))
    }

    /// `ceil(a * 10^18 / b)`, zero when the numerator is zero
    pub fn div_up(self, rhs: Self) -> MathResult<Self> {
        if rhs.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        if self.is_zero() {
            return Ok(Self::ZERO);
        }
        let inflated = self.0.checked_mul(SCALE).ok_or(MathError::Overflow)?;
        Ok(Self((inflated - U256::ONE) / rhs.0 + U256::ONE))
    }

    /// `max(1 - x, 0)`
    #[inline]
    pub fn complement(self) -> Self {
        if self.0 < SCALE {
            Self(SCALE - self.0)
        } else {
            Self::ZERO
        }
    }

    /// `x^y` rounded down
    ///
    /// Exponents 1, 2 and 4 are computed with plain multiplications; anything
    /// else goes through [`log_exp::pow`] and subtracts its maximum error.
    pub fn pow_down(self, exponent: Self) -> MathResult<Self> {
        if exponent == Self::ONE {
            Ok(self)
        } else if exponent == Self::TWO {
            self.mul_down(self)
        } else if exponent == Self::FOUR {
            let square = self.mul_down(self)?;
            square.mul_down(square)
        } else {
            let raw = Self(log_exp::pow(self.0, exponent.0)?);
            let max_error = raw.mul_up(Self::MAX_POW_RELATIVE_ERROR)?.try_add(Self::EPSILON)?;
            if raw < max_error {
                Ok(Self::ZERO)
            } else {
                raw.try_sub(max_error)
            }
        }
    }

    /// `x^y` rounded up
    pub fn pow_up(self, exponent: Self) -> MathResult<Self> {
        if exponent == Self::ONE {
            Ok(self)
        } else if exponent == Self::TWO {
            self.mul_up(self)
        } else if exponent == Self::FOUR {
            let square = self.mul_up(self)?;
            square.mul_up(square)
        } else {
            let raw = Self(log_exp::pow(self.0, exponent.0)?);
            let max_error = raw.mul_up(Self::MAX_POW_RELATIVE_ERROR)?.try_add(Self::EPSILON)?;
            raw.try_add(max_error)
        }
    }
}

impl From<U256> for FixedPoint {
    fn from(raw: U256) -> Self {
        Self(raw)
    }
}

impl FromStr for FixedPoint {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal_str(s)
    }
}

/// Exact decimal expansion, trailing zeros trimmed
impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let integer = self.0 / SCALE;
        let fraction = (self.0 % SCALE).as_u128();
        if fraction == 0 {
            return write!(f, "{integer}");
        }
        let digits = format!("{fraction:018}");
        write!(f, "{integer}.{}", digits.trim_end_matches('0'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(s: &str) -> FixedPoint {
        FixedPoint::from_decimal_str(s).unwrap()
    }

    #[test]
    fn test_fixed_point_creation() {
        assert_eq!(fp("1").raw(), U256::new(1_000_000_000_000_000_000));
        assert_eq!(fp("0.01").raw(), U256::new(10_000_000_000_000_000));
        assert_eq!(fp("0.000000000000000001"), FixedPoint::EPSILON);
        assert_eq!(FixedPoint::from_integer(42), fp("42.000"));
    }

    #[test]
    fn test_fixed_point_rejects_bad_input() {
        assert!(matches!(
            FixedPoint::from_decimal_str("-1"),
            Err(MathError::InvalidInput(_))
        ));
        assert!(matches!(
            FixedPoint::from_decimal_str("0.0000000000000000001"),
            Err(MathError::InvalidInput(_))
        ));
        assert!(matches!(
            FixedPoint::from_decimal_str("abc"),
            Err(MathError::InvalidDecimal { .. })
        ));
    }

    #[test]
    fn test_display_round_trip() {
        for s in ["0", "1", "0.5", "123.456789", "0.000000000000000001"] {
            assert_eq!(fp(s).to_string(), s);
        }
        assert_eq!(fp("2.50").to_decimal().unwrap().to_string(), "2.5");
    }

    #[test]
    fn test_mul_rounding() {
        let third = FixedPoint::ONE.div_down(FixedPoint::from_integer(3)).unwrap();
        assert_eq!(third.raw(), U256::new(333_333_333_333_333_333));

        // 0.333333333333333333 * 0.5 = 0.1666666666666666665
        let half = fp("0.5");
        assert_eq!(third.mul_down(half).unwrap().raw(), U256::new(166_666_666_666_666_666));
        assert_eq!(third.mul_up(half).unwrap().raw(), U256::new(166_666_666_666_666_667));

        // exact products are not rounded up
        assert_eq!(fp("0.5").mul_up(fp("4")).unwrap(), fp("2"));
        assert_eq!(FixedPoint::ZERO.mul_up(fp("4")).unwrap(), FixedPoint::ZERO);
    }

    #[test]
    fn test_div_rounding() {
        let one = FixedPoint::ONE;
        let three = FixedPoint::from_integer(3);
        assert_eq!(one.div_down(three).unwrap().raw(), U256::new(333_333_333_333_333_333));
        assert_eq!(one.div_up(three).unwrap().raw(), U256::new(333_333_333_333_333_334));
        assert_eq!(fp("6").div_up(three).unwrap(), fp("2"));
        assert_eq!(FixedPoint::ZERO.div_up(three).unwrap(), FixedPoint::ZERO);
        assert_eq!(one.div_down(FixedPoint::ZERO), Err(MathError::DivisionByZero));
        assert_eq!(one.div_up(FixedPoint::ZERO), Err(MathError::DivisionByZero));
    }

    #[test]
    fn test_complement() {
        assert_eq!(fp("0.3").complement(), fp("0.7"));
        assert_eq!(FixedPoint::ONE.complement(), FixedPoint::ZERO);
        assert_eq!(fp("1.5").complement(), FixedPoint::ZERO);
        assert_eq!(FixedPoint::ZERO.complement(), FixedPoint::ONE);
    }

    #[test]
    fn test_overflow_is_reported() {
        let huge = FixedPoint::from_raw(U256::MAX);
        assert_eq!(huge.mul_down(fp("2")), Err(MathError::Overflow));
        assert_eq!(huge.div_down(fp("2")), Err(MathError::Overflow));
        assert_eq!(huge.try_add(FixedPoint::EPSILON), Err(MathError::Overflow));
        assert!(matches!(
            FixedPoint::ZERO.try_sub(FixedPoint::EPSILON),
            Err(MathError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_pow_fast_paths() {
        let x = fp("1.1");
        assert_eq!(x.pow_down(FixedPoint::ONE).unwrap(), x);
        assert_eq!(x.pow_up(FixedPoint::TWO).unwrap(), fp("1.21"));
        assert_eq!(x.pow_down(FixedPoint::FOUR).unwrap(), fp("1.4641"));
    }

    #[test]
    fn test_pow_error_band() {
        // log_exp::pow(2, 0.5) = 1.414213562373095047, widened by 14143 + 1 either way
        let x = fp("2");
        let y = fp("0.5");
        assert_eq!(x.pow_down(y).unwrap().raw(), U256::new(1_414_213_562_373_080_903));
        assert_eq!(x.pow_up(y).unwrap().raw(), U256::new(1_414_213_562_373_109_191));
    }
}
