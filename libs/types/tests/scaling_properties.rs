//! Fixed-Point and Scaling Property Tests
//!
//! Rounding and precision properties that must hold for every input, not just
//! the reference vectors in the unit tests.

use parity_types::precision::{downscale_down, downscale_up, upscale};
use parity_types::{FixedPoint, TokenDecimals, U256};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

prop_compose! {
    fn token_decimals()
        (d in 0u8..=18u8) -> TokenDecimals {
        TokenDecimals::new(d).unwrap()
    }
}

prop_compose! {
    fn native_amount()
        (amount in 0u128..=u128::MAX / 2) -> U256 {
        U256::new(amount)
    }
}

prop_compose! {
    // Fixed-point values up to ~10^20 tokens
    fn fixed_point()
        (raw in 0u128..100_000_000_000_000_000_000_000_000_000_000_000_000u128) -> FixedPoint {
        FixedPoint::from_raw_u128(raw)
    }
}

prop_compose! {
    fn non_zero_fixed_point()
        (raw in 1u128..100_000_000_000_000_000_000_000_000_000_000_000_000u128) -> FixedPoint {
        FixedPoint::from_raw_u128(raw)
    }
}

proptest! {
    #[test]
    fn scaling_round_trip_is_exact(amount in native_amount(), decimals in token_decimals()) {
        let scaled = upscale(amount, decimals).unwrap();
        prop_assert_eq!(downscale_down(scaled, decimals).unwrap(), amount);
        prop_assert_eq!(downscale_up(scaled, decimals).unwrap(), amount);
    }

    #[test]
    fn downscaling_brackets_the_exact_value(value in fixed_point(), decimals in token_decimals()) {
        let down = downscale_down(value, decimals).unwrap();
        let up = downscale_up(value, decimals).unwrap();

        prop_assert!(down <= up);
        prop_assert!(up - down <= U256::ONE);
        prop_assert!(upscale(down, decimals).unwrap() <= value);
        prop_assert!(upscale(up, decimals).unwrap() >= value);
    }

    #[test]
    fn mul_rounding_differs_by_at_most_one(a in fixed_point(), b in fixed_point()) {
        let down = a.mul_down(b).unwrap();
        let up = a.mul_up(b).unwrap();

        prop_assert!(down <= up);
        prop_assert!(up.raw() - down.raw() <= U256::ONE);
        prop_assert_eq!(down, b.mul_down(a).unwrap());
    }

    #[test]
    fn div_rounding_differs_by_at_most_one(a in fixed_point(), b in non_zero_fixed_point()) {
        let down = a.div_down(b).unwrap();
        let up = a.div_up(b).unwrap();

        prop_assert!(down <= up);
        prop_assert!(up.raw() - down.raw() <= U256::ONE);
    }

    #[test]
    fn complement_never_exceeds_one(x in fixed_point()) {
        let c = x.complement();
        prop_assert!(c <= FixedPoint::ONE);
        if x <= FixedPoint::ONE {
            prop_assert_eq!(c.try_add(x).unwrap(), FixedPoint::ONE);
        }
    }

    #[test]
    fn pow_down_never_exceeds_pow_up(
        base in 1_000_000_000_000_000u128..1_000_000_000_000_000_000_000u128,
        exponent in 10_000_000_000_000_000u128..5_000_000_000_000_000_000u128,
    ) {
        let base = FixedPoint::from_raw_u128(base);
        let exponent = FixedPoint::from_raw_u128(exponent);
        prop_assert!(base.pow_down(exponent).unwrap() <= base.pow_up(exponent).unwrap());
    }

    #[test]
    fn decimal_text_round_trip(mantissa in 0i64..i64::MAX, scale in 0u32..=18u32) {
        let decimal = Decimal::new(mantissa, scale).normalize();
        let value = FixedPoint::from_decimal(decimal).unwrap();
        prop_assert_eq!(value.to_decimal().unwrap(), decimal);
        prop_assert_eq!(value.to_string().parse::<FixedPoint>().unwrap(), value);
    }
}

#[test]
fn test_decimal_boundaries() {
    let too_precise = FixedPoint::from_decimal(dec!(0.0000000000000000001)).unwrap_err();
    assert!(matches!(too_precise, parity_types::MathError::InvalidInput(_)));

    let billion = FixedPoint::from_decimal(dec!(1000000000)).unwrap();
    assert_eq!(billion, FixedPoint::from_integer(1_000_000_000));
    assert_eq!(billion.to_decimal().unwrap(), dec!(1000000000));

    // 96-bit mantissa limit on the way out
    assert!(FixedPoint::from_integer(u128::MAX).to_decimal().is_none());
}
