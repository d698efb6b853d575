//! Weighted constant-product math
//!
//! Invariant `V = prod(balance_i ^ weight_i)` with normalized weights. Every
//! exponentiation goes through [`FixedPoint::pow_down`] / [`FixedPoint::pow_up`],
//! so results carry the same error band as the on-chain pool.

use crate::validation::validate_swap_indices;
use parity_types::precision::validate_protocol_swap_fee;
use parity_types::{FixedPoint, MathError, MathResult, SwapFeePercentage};

pub const MIN_TOKENS: usize = 2;
pub const MAX_TOKENS: usize = 8;

/// 1%
pub const MIN_WEIGHT: FixedPoint = FixedPoint::from_raw_u128(10_000_000_000_000_000);

// Swap limits, as a fraction of the balance
pub const MAX_IN_RATIO: FixedPoint = FixedPoint::from_raw_u128(300_000_000_000_000_000);
pub const MAX_OUT_RATIO: FixedPoint = FixedPoint::from_raw_u128(300_000_000_000_000_000);

// Single-token join/exit limits on the invariant ratio
pub const MAX_INVARIANT_RATIO: FixedPoint = FixedPoint::from_raw_u128(3_000_000_000_000_000_000);
pub const MIN_INVARIANT_RATIO: FixedPoint = FixedPoint::from_raw_u128(700_000_000_000_000_000);

/// Weighted pool math functions
pub struct WeightedMath;

impl WeightedMath {
    /// Check the normalized weight vector: 2..=8 entries, each at least 1%, summing to one
    pub fn validate_weights(weights: &[FixedPoint]) -> MathResult<()> {
        if !(MIN_TOKENS..=MAX_TOKENS).contains(&weights.len()) {
            return Err(MathError::invalid(format!(
                "weighted pools hold {MIN_TOKENS} to {MAX_TOKENS} tokens, got {}",
                weights.len()
            )));
        }
        let mut total = FixedPoint::ZERO;
        for weight in weights {
            if *weight < MIN_WEIGHT || *weight >= FixedPoint::ONE {
                return Err(MathError::invalid(format!(
                    "weight {weight} outside [{MIN_WEIGHT}, 1)"
                )));
            }
            total = total.try_add(*weight)?;
        }
        if total != FixedPoint::ONE {
            return Err(MathError::invalid(format!("weights sum to {total}, expected 1")));
        }
        Ok(())
    }

    /// `prod(balance_i ^ weight_i)`, rounded down
    pub fn calculate_invariant(
        weights: &[FixedPoint],
        balances: &[FixedPoint],
    ) -> MathResult<FixedPoint> {
        Self::validate_weights(weights)?;
        validate_lengths(weights.len(), balances.len())?;

        let mut invariant = FixedPoint::ONE;
        for (weight, balance) in weights.iter().zip(balances) {
            invariant = invariant.mul_down(balance.pow_down(*weight)?)?;
        }
        if invariant.is_zero() {
            return Err(MathError::invalid("weighted invariant is zero"));
        }
        Ok(invariant)
    }

    /// Tokens out for an exact amount in (fee already deducted), rounded down
    ///
    /// `out = balance_out * (1 - (balance_in / (balance_in + amount_in)) ^ (w_in / w_out))`
    pub fn calc_out_given_in(
        balance_in: FixedPoint,
        weight_in: FixedPoint,
        balance_out: FixedPoint,
        weight_out: FixedPoint,
        amount_in: FixedPoint,
    ) -> MathResult<FixedPoint> {
        if amount_in > balance_in.mul_down(MAX_IN_RATIO)? {
            return Err(MathError::invalid(format!(
                "amount in {amount_in} exceeds {MAX_IN_RATIO} of balance {balance_in}"
            )));
        }

        // Base rounded up and exponent rounded down: the power is overstated,
        // so its complement and the output are understated
        let denominator = balance_in.try_add(amount_in)?;
        let base = balance_in.div_up(denominator)?;
        let exponent = weight_in.div_down(weight_out)?;
        let power = base.pow_up(exponent)?;

        balance_out.mul_down(power.complement())
    }

    /// Tokens in for an exact amount out (fee not included), rounded up
    ///
    /// `in = balance_in * ((balance_out / (balance_out - amount_out)) ^ (w_out / w_in) - 1)`
    pub fn calc_in_given_out(
        balance_in: FixedPoint,
        weight_in: FixedPoint,
        balance_out: FixedPoint,
        weight_out: FixedPoint,
        amount_out: FixedPoint,
    ) -> MathResult<FixedPoint> {
        if amount_out >= balance_out {
            return Err(MathError::InsufficientLiquidity {
                requested: amount_out,
                available: balance_out,
            });
        }
        if amount_out > balance_out.mul_down(MAX_OUT_RATIO)? {
            return Err(MathError::invalid(format!(
                "amount out {amount_out} exceeds {MAX_OUT_RATIO} of balance {balance_out}"
            )));
        }

        let base = balance_out.div_up(balance_out.try_sub(amount_out)?)?;
        let exponent = weight_out.div_up(weight_in)?;
        let power = base.pow_up(exponent)?;

        let ratio = power.try_sub(FixedPoint::ONE)?;
        balance_in.mul_up(ratio)
    }

    /// Swap between two positions of a full pool snapshot
    pub fn calc_out_given_in_indexed(
        weights: &[FixedPoint],
        balances: &[FixedPoint],
        index_in: usize,
        index_out: usize,
        amount_in: FixedPoint,
    ) -> MathResult<FixedPoint> {
        validate_lengths(weights.len(), balances.len())?;
        validate_swap_indices(balances.len(), index_in, index_out)?;
        Self::calc_out_given_in(
            balances[index_in],
            weights[index_in],
            balances[index_out],
            weights[index_out],
            amount_in,
        )
    }

    /// Indexed counterpart of [`WeightedMath::calc_in_given_out`]
    pub fn calc_in_given_out_indexed(
        weights: &[FixedPoint],
        balances: &[FixedPoint],
        index_in: usize,
        index_out: usize,
        amount_out: FixedPoint,
    ) -> MathResult<FixedPoint> {
        validate_lengths(weights.len(), balances.len())?;
        validate_swap_indices(balances.len(), index_in, index_out)?;
        Self::calc_in_given_out(
            balances[index_in],
            weights[index_in],
            balances[index_out],
            weights[index_out],
            amount_out,
        )
    }

    /// BPT minted for an arbitrary deposit, rounded down
    pub fn calc_bpt_out_given_exact_tokens_in(
        balances: &[FixedPoint],
        weights: &[FixedPoint],
        amounts_in: &[FixedPoint],
        bpt_total_supply: FixedPoint,
        swap_fee: SwapFeePercentage,
    ) -> MathResult<FixedPoint> {
        Self::validate_weights(weights)?;
        validate_lengths(weights.len(), balances.len())?;
        validate_lengths(balances.len(), amounts_in.len())?;

        let mut balance_ratios_with_fee = Vec::with_capacity(balances.len());
        let mut invariant_ratio_with_fees = FixedPoint::ZERO;
        for ((balance, weight), amount_in) in balances.iter().zip(weights).zip(amounts_in) {
            let ratio = balance.try_add(*amount_in)?.div_down(*balance)?;
            invariant_ratio_with_fees = invariant_ratio_with_fees.try_add(ratio.mul_down(*weight)?)?;
            balance_ratios_with_fee.push(ratio);
        }

        let mut invariant_ratio = FixedPoint::ONE;
        for (((balance, weight), amount_in), ratio) in balances
            .iter()
            .zip(weights)
            .zip(amounts_in)
            .zip(&balance_ratios_with_fee)
        {
            // Fee only on the amount above the proportional deposit
            let amount_in_without_fee = if *ratio > invariant_ratio_with_fees {
                let non_taxable =
                    balance.mul_down(invariant_ratio_with_fees.try_sub(FixedPoint::ONE)?)?;
                let taxable = amount_in.try_sub(non_taxable)?;
                non_taxable.try_add(swap_fee.subtract_swap_fee_amount(taxable)?)?
            } else {
                *amount_in
            };

            let balance_ratio = balance.try_add(amount_in_without_fee)?.div_down(*balance)?;
            invariant_ratio = invariant_ratio.mul_down(balance_ratio.pow_down(*weight)?)?;
        }

        if invariant_ratio > FixedPoint::ONE {
            bpt_total_supply.mul_down(invariant_ratio.try_sub(FixedPoint::ONE)?)
        } else {
            Ok(FixedPoint::ZERO)
        }
    }

    /// Tokens of one kind required to mint exactly `bpt_amount_out`, rounded up
    pub fn calc_token_in_given_exact_bpt_out(
        balance: FixedPoint,
        normalized_weight: FixedPoint,
        bpt_amount_out: FixedPoint,
        bpt_total_supply: FixedPoint,
        swap_fee: SwapFeePercentage,
    ) -> MathResult<FixedPoint> {
        let invariant_ratio = bpt_total_supply
            .try_add(bpt_amount_out)?
            .div_up(bpt_total_supply)?;
        if invariant_ratio > MAX_INVARIANT_RATIO {
            return Err(MathError::invalid(format!(
                "invariant ratio {invariant_ratio} above {MAX_INVARIANT_RATIO}"
            )));
        }

        let balance_ratio = invariant_ratio.pow_up(FixedPoint::ONE.div_up(normalized_weight)?)?;
        let amount_in_without_fee = balance.mul_up(balance_ratio.try_sub(FixedPoint::ONE)?)?;

        // Only the share not covered by the token's own weight is swapped
        let taxable = amount_in_without_fee.mul_up(normalized_weight.complement())?;
        let non_taxable = amount_in_without_fee.try_sub(taxable)?;
        non_taxable.try_add(swap_fee.add_swap_fee_amount(taxable)?)
    }

    /// BPT burned for an arbitrary withdrawal, rounded up
    pub fn calc_bpt_in_given_exact_tokens_out(
        balances: &[FixedPoint],
        weights: &[FixedPoint],
        amounts_out: &[FixedPoint],
        bpt_total_supply: FixedPoint,
        swap_fee: SwapFeePercentage,
    ) -> MathResult<FixedPoint> {
        Self::validate_weights(weights)?;
        validate_lengths(weights.len(), balances.len())?;
        validate_lengths(balances.len(), amounts_out.len())?;

        let mut balance_ratios_without_fee = Vec::with_capacity(balances.len());
        let mut invariant_ratio_without_fees = FixedPoint::ZERO;
        for ((balance, weight), amount_out) in balances.iter().zip(weights).zip(amounts_out) {
            let ratio = balance.try_sub(*amount_out)?.div_up(*balance)?;
            invariant_ratio_without_fees =
                invariant_ratio_without_fees.try_add(ratio.mul_up(*weight)?)?;
            balance_ratios_without_fee.push(ratio);
        }

        let mut invariant_ratio = FixedPoint::ONE;
        for (((balance, weight), amount_out), ratio) in balances
            .iter()
            .zip(weights)
            .zip(amounts_out)
            .zip(&balance_ratios_without_fee)
        {
            let amount_out_with_fee = if invariant_ratio_without_fees > *ratio {
                let non_taxable = balance.mul_down(invariant_ratio_without_fees.complement())?;
                let taxable = amount_out.try_sub(non_taxable)?;
                non_taxable.try_add(swap_fee.add_swap_fee_amount(taxable)?)?
            } else {
                *amount_out
            };

            let balance_ratio = balance.try_sub(amount_out_with_fee)?.div_down(*balance)?;
            invariant_ratio = invariant_ratio.mul_down(balance_ratio.pow_down(*weight)?)?;
        }

        bpt_total_supply.mul_up(invariant_ratio.complement())
    }

    /// Tokens of one kind returned for burning exactly `bpt_amount_in`, rounded down
    pub fn calc_token_out_given_exact_bpt_in(
        balance: FixedPoint,
        normalized_weight: FixedPoint,
        bpt_amount_in: FixedPoint,
        bpt_total_supply: FixedPoint,
        swap_fee: SwapFeePercentage,
    ) -> MathResult<FixedPoint> {
        let invariant_ratio = bpt_total_supply
            .try_sub(bpt_amount_in)?
            .div_up(bpt_total_supply)?;
        if invariant_ratio < MIN_INVARIANT_RATIO {
            return Err(MathError::invalid(format!(
                "invariant ratio {invariant_ratio} below {MIN_INVARIANT_RATIO}"
            )));
        }

        let balance_ratio = invariant_ratio.pow_up(FixedPoint::ONE.div_down(normalized_weight)?)?;
        let amount_out_without_fee = balance.mul_down(balance_ratio.complement())?;

        let taxable = amount_out_without_fee.mul_up(normalized_weight.complement())?;
        let non_taxable = amount_out_without_fee.try_sub(taxable)?;
        non_taxable.try_add(swap_fee.subtract_swap_fee_amount(taxable)?)
    }

    /// Proportional exit: every balance scaled by `bpt_amount_in / supply`
    pub fn calc_tokens_out_given_exact_bpt_in(
        balances: &[FixedPoint],
        bpt_amount_in: FixedPoint,
        bpt_total_supply: FixedPoint,
    ) -> MathResult<Vec<FixedPoint>> {
        let bpt_ratio = bpt_amount_in.div_down(bpt_total_supply)?;
        balances.iter().map(|b| b.mul_down(bpt_ratio)).collect()
    }

    /// Protocol share of the swap fees collected in one token while the
    /// invariant grew from `previous_invariant` to `current_invariant`
    pub fn calc_due_token_protocol_swap_fee_amount(
        balance: FixedPoint,
        normalized_weight: FixedPoint,
        previous_invariant: FixedPoint,
        current_invariant: FixedPoint,
        protocol_swap_fee: FixedPoint,
    ) -> MathResult<FixedPoint> {
        let protocol_swap_fee = validate_protocol_swap_fee(protocol_swap_fee)?;
        if current_invariant <= previous_invariant {
            return Ok(FixedPoint::ZERO);
        }

        // Clamped so pow_up stays inside its accurate domain; the power is the
        // subtrahend, so it rounds up
        let base = previous_invariant
            .div_up(current_invariant)?
            .max(FixedPoint::MIN_POW_BASE_FREE_EXPONENT);
        let exponent = FixedPoint::ONE.div_down(normalized_weight)?;

        let accrued_fees = balance.mul_down(base.pow_up(exponent)?.complement())?;
        accrued_fees.mul_down(protocol_swap_fee)
    }
}

fn validate_lengths(expected: usize, actual: usize) -> MathResult<()> {
    if expected != actual {
        return Err(MathError::invalid(format!(
            "length mismatch: {expected} weights or balances but {actual} values"
        )));
    }
    Ok(())
}
