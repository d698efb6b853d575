//! Exponentiation and logarithms on signed 18-decimal fixed-point values
//!
//! Integer-only decomposition of `ln` and `exp` as run by the on-chain pool
//! contracts: the argument is reduced by a table of precomputed powers of `e`
//! and the remainder goes through a short Taylor (for `exp`) or hyperbolic
//! arctangent (for `ln`) series. Results are bit-exact with the contracts,
//! which is why this is not replaced by floating point.
//!
//! All divisions truncate toward zero.

use crate::common::errors::{MathError, MathResult};
use ethnum::{I256, U256};

const ONE_18: I256 = I256::new(1_000_000_000_000_000_000);
const ONE_20: I256 = I256::new(100_000_000_000_000_000_000);
const ONE_36: I256 = I256::new(1_000_000_000_000_000_000_000_000_000_000_000_000);

/// Largest accepted `exp` argument: `e^130` still fits in 256 bits with 18 decimals
pub const MAX_NATURAL_EXPONENT: I256 = I256::new(130_000_000_000_000_000_000);
/// Smallest accepted `exp` argument: `e^-41` is the last non-zero result
pub const MIN_NATURAL_EXPONENT: I256 = I256::new(-41_000_000_000_000_000_000);

// Around 1.0 the 36-decimal logarithm is used for extra precision.
const LN_36_LOWER_BOUND: I256 = I256::new(900_000_000_000_000_000);
const LN_36_UPPER_BOUND: I256 = I256::new(1_100_000_000_000_000_000);

// 2^254 / 10^20
const MILD_EXPONENT_BOUND: U256 =
    U256::from_words(850_705_917_302_346_158, 224_054_337_009_387_692_103_295_210_631_848_224_050);

// 18 decimals, powers of two: e^128 and e^64 (integers, no decimals)
const X0: I256 = I256::new(128_000_000_000_000_000_000);
const A0: I256 = I256::from_words(
    114_249_481_722_274_167,
    -14_319_561_884_865_554_126_253_256_034_230_468_608,
);
const X1: I256 = I256::new(64_000_000_000_000_000_000);
const A1: I256 = I256::new(6_235_149_080_811_616_882_910_000_000);

// 20 decimals: x_n and e^x_n for x_n = 32, 16, ..., 0.0625
const X: [I256; 10] = [
    I256::new(3_200_000_000_000_000_000_000),
    I256::new(1_600_000_000_000_000_000_000),
    I256::new(800_000_000_000_000_000_000),
    I256::new(400_000_000_000_000_000_000),
    I256::new(200_000_000_000_000_000_000),
    I256::new(100_000_000_000_000_000_000),
    I256::new(50_000_000_000_000_000_000),
    I256::new(25_000_000_000_000_000_000),
    I256::new(12_500_000_000_000_000_000),
    I256::new(6_250_000_000_000_000_000),
];
const A: [I256; 10] = [
    I256::new(7_896_296_018_268_069_516_100_000_000_000_000),
    I256::new(888_611_052_050_787_263_676_000_000),
    I256::new(298_095_798_704_172_827_474_000),
    I256::new(5_459_815_003_314_423_907_810),
    I256::new(738_905_609_893_065_022_723),
    I256::new(271_828_182_845_904_523_536),
    I256::new(164_872_127_070_012_814_685),
    I256::new(128_402_541_668_774_148_407),
    I256::new(113_314_845_306_682_631_683),
    I256::new(106_449_445_891_785_942_956),
];

// exp only reduces by the first eight table entries
const EXP_REDUCTION_STEPS: usize = 8;
const EXP_TAYLOR_TERMS: i128 = 12;
const HUNDRED: I256 = I256::new(100);

/// `x^y` for unsigned 18-decimal `x` and `y`
///
/// Computed as `exp(y * ln(x))`. `0^y` is 0 and `x^0` is 1.
pub fn pow(x: U256, y: U256) -> MathResult<U256> {
    if y == U256::ZERO {
        return Ok(ONE_18.as_u256());
    }
    if x == U256::ZERO {
        return Ok(U256::ZERO);
    }
    if x >> 255 != U256::ZERO {
        return Err(MathError::invalid("pow base exceeds 2^255"));
    }
    if y >= MILD_EXPONENT_BOUND {
        return Err(MathError::invalid("pow exponent out of bounds"));
    }

    let x = x.as_i256();
    let y = y.as_i256();

    let ln_x_times_y = if LN_36_LOWER_BOUND < x && x < LN_36_UPPER_BOUND {
        let ln_36_x = ln_36(x);
        // Split ln_36(x) so that the product with y does not overflow
        (ln_36_x / ONE_18) * y + ((ln_36_x % ONE_18) * y) / ONE_18
    } else {
        ln_unbounded(x) * y
    };
    let ln_x_times_y = ln_x_times_y / ONE_18;

    if !(MIN_NATURAL_EXPONENT..=MAX_NATURAL_EXPONENT).contains(&ln_x_times_y) {
        return Err(MathError::invalid("pow product out of bounds"));
    }

    Ok(exp(ln_x_times_y)?.as_u256())
}

/// Natural exponentiation `e^x` for 18-decimal `x` in `[-41, 130]`
pub fn exp(x: I256) -> MathResult<I256> {
    if !(MIN_NATURAL_EXPONENT..=MAX_NATURAL_EXPONENT).contains(&x) {
        return Err(MathError::invalid(format!("exp argument {x} out of bounds")));
    }

    if x < I256::ZERO {
        // e^-x = 1 / e^x; the result would otherwise lose the fractional part
        return Ok((ONE_18 * ONE_18) / exp(-x)?);
    }

    let mut x = x;
    let first_an = if x >= X0 {
        x -= X0;
        A0
    } else if x >= X1 {
        x -= X1;
        A1
    } else {
        I256::ONE
    };

    // Switch to 20 decimals for the remaining reduction
    x *= HUNDRED;

    let mut product = ONE_20;
    for (xn, an) in X.iter().zip(A.iter()).take(EXP_REDUCTION_STEPS) {
        if x >= *xn {
            x -= *xn;
            product = (product * *an) / ONE_20;
        }
    }

    // Taylor series on the remainder, now below 0.25
    let mut series_sum = ONE_20 + x;
    let mut term = x;
    for n in 2..=EXP_TAYLOR_TERMS {
        term = ((term * x) / ONE_20) / I256::new(n);
        series_sum += term;
    }

    Ok((((product * series_sum) / ONE_20) * first_an) / HUNDRED)
}

/// Natural logarithm of a positive 18-decimal value
pub fn ln(a: I256) -> MathResult<I256> {
    if a <= I256::ZERO {
        return Err(MathError::invalid(format!("ln argument {a} is not positive")));
    }
    if LN_36_LOWER_BOUND < a && a < LN_36_UPPER_BOUND {
        Ok(ln_36(a) / ONE_18)
    } else {
        Ok(ln_unbounded(a))
    }
}

/// Logarithm of `arg` with base `base`, both positive 18-decimal values
pub fn log(arg: I256, base: I256) -> MathResult<I256> {
    if arg <= I256::ZERO || base <= I256::ZERO {
        return Err(MathError::invalid("log arguments must be positive"));
    }
    let log_base = ln_scaled_36(base);
    if log_base == I256::ZERO {
        return Err(MathError::DivisionByZero);
    }
    let log_arg = ln_scaled_36(arg);
    Ok((log_arg * ONE_18) / log_base)
}

fn ln_scaled_36(a: I256) -> I256 {
    if LN_36_LOWER_BOUND < a && a < LN_36_UPPER_BOUND {
        ln_36(a)
    } else {
        ln_unbounded(a) * ONE_18
    }
}

/// 18-decimal `ln` for any positive argument, `a > 0` is the caller's job
fn ln_unbounded(mut a: I256) -> I256 {
    if a < ONE_18 {
        // ln(a) = -ln(1/a)
        return -ln_unbounded((ONE_18 * ONE_18) / a);
    }

    let mut sum = I256::ZERO;
    if a >= A0 * ONE_18 {
        a /= A0;
        sum += X0;
    }
    if a >= A1 * ONE_18 {
        a /= A1;
        sum += X1;
    }

    sum *= HUNDRED;
    a *= HUNDRED;

    for (xn, an) in X.iter().zip(A.iter()) {
        if a >= *an {
            a = (a * ONE_20) / *an;
            sum += *xn;
        }
    }

    // ln(a) = 2 * atanh(z) with z = (a - 1) / (a + 1), odd terms up to z^11
    let z = ((a - ONE_20) * ONE_20) / (a + ONE_20);
    let z_squared = (z * z) / ONE_20;

    let mut num = z;
    let mut series_sum = num;
    for d in [3, 5, 7, 9, 11] {
        num = (num * z_squared) / ONE_20;
        series_sum += num / I256::new(d);
    }
    series_sum *= I256::new(2);

    (sum + series_sum) / HUNDRED
}

/// 36-decimal `ln` for arguments close to 1.0
fn ln_36(x: I256) -> I256 {
    let x = x * ONE_18;

    let z = ((x - ONE_36) * ONE_36) / (x + ONE_36);
    let z_squared = (z * z) / ONE_36;

    let mut num = z;
    let mut series_sum = num;
    for d in [3, 5, 7, 9, 11, 13, 15] {
        num = (num * z_squared) / ONE_36;
        series_sum += num / I256::new(d);
    }

    series_sum * I256::new(2)
}
