//! End-to-end swap scenarios
//!
//! Native token amounts go through the full pipeline: upscale, fee, engine,
//! downscale in the pool's favour.

use parity_amm::{
    AmplificationParameter, LinearMath, LinearParams, StableMath, SwapFeePercentage, WeightedMath,
};
use parity_types::precision::{downscale_down, downscale_up, upscale, upscale_all, TokenDecimals};
use parity_types::{FixedPoint, U256};
use rust_decimal_macros::dec;

fn usdc() -> TokenDecimals {
    TokenDecimals::new(6).unwrap()
}

fn wbtc() -> TokenDecimals {
    TokenDecimals::new(8).unwrap()
}

fn dai() -> TokenDecimals {
    TokenDecimals::new(18).unwrap()
}

#[test]
fn test_stable_usdc_to_dai_given_in() {
    let decimals = [usdc(), dai()];
    let balances = upscale_all(
        &[
            U256::new(1_000_000_000_000),                 // 1M USDC
            U256::new(1_000_000_000_000_000_000_000_000), // 1M DAI
        ],
        &decimals,
    )
    .unwrap();
    let amp = AmplificationParameter::new(100).unwrap();
    let fee = SwapFeePercentage::new(FixedPoint::from_decimal(dec!(0.0004)).unwrap()).unwrap();

    let amount_in = upscale(U256::new(1_000_000_000), usdc()).unwrap(); // 1000 USDC
    let after_fee = fee.subtract_swap_fee_amount(amount_in).unwrap();
    let out = StableMath::calc_out_given_in(amp, &balances, 0, 1, after_fee).unwrap();
    let dai_out = downscale_down(out, dai()).unwrap();

    // 999.6 after the fee, less a sliver of curve slippage
    let lower = U256::new(999_000_000_000_000_000_000);
    let upper = U256::new(999_600_000_000_000_000_000);
    assert!(dai_out > lower && dai_out < upper, "got {dai_out}");
}

#[test]
fn test_weighted_wbtc_for_exact_weth() {
    let half = FixedPoint::from_decimal(dec!(0.5)).unwrap();
    let fee = SwapFeePercentage::new(FixedPoint::from_decimal(dec!(0.003)).unwrap()).unwrap();

    let balance_in = upscale(U256::new(10_000_000_000), wbtc()).unwrap(); // 100 WBTC
    let balance_out = FixedPoint::from_integer(100);

    let exact_in = WeightedMath::calc_in_given_out(
        balance_in,
        half,
        balance_out,
        half,
        FixedPoint::from_integer(1),
    )
    .unwrap();
    let gross_in = fee.add_swap_fee_amount(exact_in).unwrap();
    let sats_in = downscale_up(gross_in, wbtc()).unwrap();

    // 100 / 99 before the fee, divided by 0.997 after it
    assert!(sats_in > U256::new(101_010_101));
    assert!(sats_in < U256::new(101_320_000));
}

#[test]
fn test_empty_pools_mint_nothing() {
    let amp = AmplificationParameter::new(100).unwrap();
    let fee = SwapFeePercentage::new(FixedPoint::from_decimal(dec!(0.01)).unwrap()).unwrap();

    let stable_bpt = StableMath::calc_bpt_out_given_exact_tokens_in(
        amp,
        &[FixedPoint::ZERO, FixedPoint::ZERO],
        &[FixedPoint::ONE, FixedPoint::ZERO],
        FixedPoint::ZERO,
        fee,
    )
    .unwrap();
    assert_eq!(stable_bpt, FixedPoint::ZERO);

    let params = LinearParams::new(
        FixedPoint::from_decimal(dec!(0.01)).unwrap(),
        FixedPoint::ONE,
        FixedPoint::from_integer(1000),
        FixedPoint::from_integer(2000),
    )
    .unwrap();
    let linear_bpt = LinearMath::calc_bpt_out_per_main_in(
        FixedPoint::ONE,
        FixedPoint::ZERO,
        FixedPoint::ZERO,
        FixedPoint::ZERO,
        &params,
    )
    .unwrap();
    assert_eq!(linear_bpt, FixedPoint::ZERO);
}

#[test]
fn test_linear_wrapped_in_below_target_zone() {
    let params = LinearParams::new(
        FixedPoint::from_decimal(dec!(0.01)).unwrap(),
        FixedPoint::ONE,
        FixedPoint::from_integer(1000),
        FixedPoint::from_integer(2000),
    )
    .unwrap();

    let main_out = LinearMath::calc_main_out_per_wrapped_in(
        FixedPoint::from_integer(100),
        FixedPoint::from_integer(500),
        &params,
    )
    .unwrap();

    assert!(main_out < FixedPoint::from_integer(100));
    assert_eq!(main_out.to_decimal().unwrap().round_dp(4), dec!(99.0099));
}

#[test]
fn test_native_amounts_survive_scaling() {
    for (decimals, amount) in [
        (usdc(), U256::new(123_456_789)),
        (wbtc(), U256::new(2_100_000_000_000_000)),
        (dai(), U256::new(7)),
    ] {
        let scaled = upscale(amount, decimals).unwrap();
        assert_eq!(downscale_down(scaled, decimals).unwrap(), amount);
        assert_eq!(downscale_up(scaled, decimals).unwrap(), amount);
    }

    // One raw unit past a whole satoshi splits the two directions
    let sat = upscale(U256::ONE, wbtc()).unwrap();
    let nudged = sat.try_add(FixedPoint::EPSILON).unwrap();
    assert_eq!(downscale_down(nudged, wbtc()).unwrap(), U256::ONE);
    assert_eq!(downscale_up(nudged, wbtc()).unwrap(), U256::new(2));
}
