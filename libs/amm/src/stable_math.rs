//! StableSwap invariant math for pools of near-parity tokens
//!
//! Reproduces the on-chain stable pool computation step for step: the invariant
//! and single-balance solves are Newton iterations over plain integers, capped
//! at [`MAX_ITERATIONS`] with a tolerance of one raw unit. A solver that hits the
//! cap is not an error: the last estimate is returned and a warning is logged.
//!
//! All balances and amounts are 18-decimal fixed point (already upscaled).

use crate::validation::{validate_swap_indices, validate_token_index};
use parity_types::precision::validate_protocol_swap_fee;
use parity_types::{integer, FixedPoint, MathError, MathResult, SwapFeePercentage, U256};
use tracing::{debug, warn};

/// Amplification values carry three extra decimals
pub const AMP_PRECISION: u64 = 1_000;
pub const MIN_AMP: u64 = 1;
pub const MAX_AMP: u64 = 5_000;

pub const MIN_TOKENS: usize = 2;
pub const MAX_TOKENS: usize = 5;

/// Newton iteration cap shared by both solvers
pub const MAX_ITERATIONS: u32 = 255;
/// Two consecutive estimates this close (raw units) count as converged
pub const CONVERGENCE_TOLERANCE: u64 = 1;

const AMP_PRECISION_U256: U256 = U256::new(AMP_PRECISION as u128);

/// Amplification coefficient `A·n^(n-1)` multiplied by [`AMP_PRECISION`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmplificationParameter(U256);

impl AmplificationParameter {
    /// From a plain value in `[1, 5000]`
    pub fn new(amp: u64) -> MathResult<Self> {
        if !(MIN_AMP..=MAX_AMP).contains(&amp) {
            return Err(MathError::invalid(format!(
                "amplification {amp} outside [{MIN_AMP}, {MAX_AMP}]"
            )));
        }
        Ok(Self(U256::new(u128::from(amp * AMP_PRECISION))))
    }

    /// From a value that already includes [`AMP_PRECISION`]
    pub fn from_precise(raw: U256) -> MathResult<Self> {
        let min = U256::new(u128::from(MIN_AMP * AMP_PRECISION));
        let max = U256::new(u128::from(MAX_AMP * AMP_PRECISION));
        if raw < min || raw > max {
            return Err(MathError::invalid(format!(
                "precise amplification {raw} outside [{min}, {max}]"
            )));
        }
        Ok(Self(raw))
    }

    #[inline]
    pub fn precise(self) -> U256 {
        self.0
    }
}

/// Outcome of a capped Newton iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    Converged { iterations: u32 },
    /// Iteration cap reached; the value is the last estimate
    NotReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewtonSolution {
    pub value: FixedPoint,
    pub convergence: Convergence,
}

impl NewtonSolution {
    pub fn converged(&self) -> bool {
        matches!(self.convergence, Convergence::Converged { .. })
    }
}

/// StableSwap math functions
pub struct StableMath;

impl StableMath {
    /// Invariant `D` of the current balances, last estimate if the cap is hit
    pub fn calculate_invariant(
        amp: AmplificationParameter,
        balances: &[FixedPoint],
    ) -> MathResult<FixedPoint> {
        Self::solve_invariant(amp, balances).map(|s| s.value)
    }

    /// Newton solve for `D`, reporting how the iteration ended
    ///
    /// An all-zero pool has a zero invariant; a zero balance in a non-empty pool
    /// is a `DivisionByZero`.
    pub fn solve_invariant(
        amp: AmplificationParameter,
        balances: &[FixedPoint],
    ) -> MathResult<NewtonSolution> {
        validate_token_count(balances.len())?;

        let sum = sum_raw(balances)?;
        if sum == U256::ZERO {
            return Ok(NewtonSolution {
                value: FixedPoint::ZERO,
                convergence: Convergence::Converged { iterations: 0 },
            });
        }

        let num_tokens = U256::new(balances.len() as u128);
        let amp_times_total = integer::mul(amp.precise(), num_tokens)?;
        let tolerance = U256::new(u128::from(CONVERGENCE_TOLERANCE));

        let mut invariant = sum;
        let mut previous = invariant;
        for iteration in 1..=MAX_ITERATIONS {
            let mut d_p = invariant;
            for balance in balances {
                d_p = integer::div_down(
                    integer::mul(d_p, invariant)?,
                    integer::mul(balance.raw(), num_tokens)?,
                )?;
            }
            previous = invariant;

            let numerator = integer::mul(
                integer::add(
                    integer::div_down(integer::mul(amp_times_total, sum)?, AMP_PRECISION_U256)?,
                    integer::mul(d_p, num_tokens)?,
                )?,
                invariant,
            )?;
            let denominator = integer::add(
                integer::div_down(
                    integer::mul(integer::sub(amp_times_total, AMP_PRECISION_U256)?, invariant)?,
                    AMP_PRECISION_U256,
                )?,
                integer::mul(integer::add(num_tokens, U256::ONE)?, d_p)?,
            )?;
            invariant = integer::div_down(numerator, denominator)?;

            if integer::abs_diff(invariant, previous) <= tolerance {
                debug!(iterations = iteration, invariant = %invariant, "stable invariant converged");
                return Ok(NewtonSolution {
                    value: FixedPoint::from_raw(invariant),
                    convergence: Convergence::Converged { iterations: iteration },
                });
            }
        }

        warn!(
            cap = MAX_ITERATIONS,
            previous = %previous,
            last = %invariant,
            "stable invariant did not converge, returning last estimate"
        );
        Ok(NewtonSolution {
            value: FixedPoint::from_raw(invariant),
            convergence: Convergence::NotReached,
        })
    }

    /// Balance of `token_index` that keeps `invariant` given every other balance
    pub fn get_token_balance_given_invariant_and_all_other_balances(
        amp: AmplificationParameter,
        balances: &[FixedPoint],
        invariant: FixedPoint,
        token_index: usize,
    ) -> MathResult<FixedPoint> {
        Self::solve_token_balance(amp, balances, invariant, token_index).map(|s| s.value)
    }

    /// Newton solve for a single balance; rounds every step up
    ///
    /// The current value of `balances[token_index]` only cancels out of the
    /// product term, so callers may pass any non-zero placeholder there.
    pub fn solve_token_balance(
        amp: AmplificationParameter,
        balances: &[FixedPoint],
        invariant: FixedPoint,
        token_index: usize,
    ) -> MathResult<NewtonSolution> {
        validate_token_count(balances.len())?;
        validate_token_index(balances.len(), token_index)?;

        let num_tokens = U256::new(balances.len() as u128);
        let amp_times_total = integer::mul(amp.precise(), num_tokens)?;
        let invariant = invariant.raw();
        let tolerance = U256::new(u128::from(CONVERGENCE_TOLERANCE));

        let mut sum = balances[0].raw();
        let mut p_d = integer::mul(balances[0].raw(), num_tokens)?;
        for balance in &balances[1..] {
            p_d = integer::div_down(
                integer::mul(integer::mul(p_d, balance.raw())?, num_tokens)?,
                invariant,
            )?;
            sum = integer::add(sum, balance.raw())?;
        }
        let sum_others = integer::sub(sum, balances[token_index].raw())?;

        let invariant_squared = integer::mul(invariant, invariant)?;
        let c = integer::mul(
            integer::mul(
                integer::div_up(invariant_squared, integer::mul(amp_times_total, p_d)?)?,
                AMP_PRECISION_U256,
            )?,
            balances[token_index].raw(),
        )?;
        let b = integer::add(
            sum_others,
            integer::mul(integer::div_down(invariant, amp_times_total)?, AMP_PRECISION_U256)?,
        )?;

        let mut token_balance = integer::div_up(
            integer::add(invariant_squared, c)?,
            integer::add(invariant, b)?,
        )?;
        let mut previous = token_balance;
        for iteration in 1..=MAX_ITERATIONS {
            previous = token_balance;
            let numerator = integer::add(integer::mul(token_balance, token_balance)?, c)?;
            let denominator = integer::sub(
                integer::add(integer::mul(token_balance, U256::new(2))?, b)?,
                invariant,
            )?;
            token_balance = integer::div_up(numerator, denominator)?;

            if integer::abs_diff(token_balance, previous) <= tolerance {
                debug!(iterations = iteration, token_index, "stable balance converged");
                return Ok(NewtonSolution {
                    value: FixedPoint::from_raw(token_balance),
                    convergence: Convergence::Converged { iterations: iteration },
                });
            }
        }

        warn!(
            cap = MAX_ITERATIONS,
            token_index,
            previous = %previous,
            last = %token_balance,
            "stable balance did not converge, returning last estimate"
        );
        Ok(NewtonSolution {
            value: FixedPoint::from_raw(token_balance),
            convergence: Convergence::NotReached,
        })
    }

    /// Tokens out for an exact amount in, rounded down; zero for an empty pool
    pub fn calc_out_given_in(
        amp: AmplificationParameter,
        balances: &[FixedPoint],
        index_in: usize,
        index_out: usize,
        amount_in: FixedPoint,
    ) -> MathResult<FixedPoint> {
        validate_swap_indices(balances.len(), index_in, index_out)?;
        let invariant = Self::calculate_invariant(amp, balances)?;
        if invariant.is_zero() {
            return Ok(FixedPoint::ZERO);
        }

        let mut new_balances = balances.to_vec();
        new_balances[index_in] = new_balances[index_in].try_add(amount_in)?;

        let final_balance_out = Self::get_token_balance_given_invariant_and_all_other_balances(
            amp,
            &new_balances,
            invariant,
            index_out,
        )?;

        // One unit less than the exact difference
        balances[index_out]
            .try_sub(final_balance_out)?
            .try_sub(FixedPoint::EPSILON)
    }

    /// Tokens in for an exact amount out, rounded up
    pub fn calc_in_given_out(
        amp: AmplificationParameter,
        balances: &[FixedPoint],
        index_in: usize,
        index_out: usize,
        amount_out: FixedPoint,
    ) -> MathResult<FixedPoint> {
        validate_swap_indices(balances.len(), index_in, index_out)?;
        if amount_out >= balances[index_out] {
            return Err(MathError::InsufficientLiquidity {
                requested: amount_out,
                available: balances[index_out],
            });
        }
        let invariant = Self::calculate_invariant(amp, balances)?;

        let mut new_balances = balances.to_vec();
        new_balances[index_out] = new_balances[index_out].try_sub(amount_out)?;

        let final_balance_in = Self::get_token_balance_given_invariant_and_all_other_balances(
            amp,
            &new_balances,
            invariant,
            index_in,
        )?;

        final_balance_in
            .try_sub(balances[index_in])?
            .try_add(FixedPoint::EPSILON)
    }

    /// BPT minted for an arbitrary deposit
    ///
    /// Returns zero for an empty pool rather than dividing by its zero invariant.
    pub fn calc_bpt_out_given_exact_tokens_in(
        amp: AmplificationParameter,
        balances: &[FixedPoint],
        amounts_in: &[FixedPoint],
        bpt_total_supply: FixedPoint,
        swap_fee: SwapFeePercentage,
    ) -> MathResult<FixedPoint> {
        validate_lengths(balances.len(), amounts_in.len())?;
        let current_invariant = Self::calculate_invariant(amp, balances)?;
        if current_invariant.is_zero() {
            return Ok(FixedPoint::ZERO);
        }

        let sum = FixedPoint::from_raw(sum_raw(balances)?);

        // Ratio of each balance increase, weighted by the balance's share of the pool
        let mut balance_ratios_with_fee = Vec::with_capacity(balances.len());
        let mut invariant_ratio_with_fees = FixedPoint::ZERO;
        for (balance, amount_in) in balances.iter().zip(amounts_in) {
            let current_weight = balance.div_down(sum)?;
            let ratio = balance.try_add(*amount_in)?.div_down(*balance)?;
            invariant_ratio_with_fees =
                invariant_ratio_with_fees.try_add(ratio.mul_down(current_weight)?)?;
            balance_ratios_with_fee.push(ratio);
        }

        // Fees apply only to the part of each deposit above the proportional amount
        let fee_complement = swap_fee.value().complement();
        let mut new_balances = Vec::with_capacity(balances.len());
        for ((balance, amount_in), ratio) in
            balances.iter().zip(amounts_in).zip(&balance_ratios_with_fee)
        {
            let amount_in_without_fee = if *ratio > invariant_ratio_with_fees {
                let non_taxable =
                    balance.mul_down(invariant_ratio_with_fees.try_sub(FixedPoint::ONE)?)?;
                let taxable = amount_in.try_sub(non_taxable)?;
                non_taxable.try_add(taxable.mul_down(fee_complement)?)?
            } else {
                *amount_in
            };
            new_balances.push(balance.try_add(amount_in_without_fee)?);
        }

        let new_invariant = Self::calculate_invariant(amp, &new_balances)?;
        let invariant_ratio = new_invariant.div_down(current_invariant)?;
        if invariant_ratio > FixedPoint::ONE {
            bpt_total_supply.mul_down(invariant_ratio.try_sub(FixedPoint::ONE)?)
        } else {
            Ok(FixedPoint::ZERO)
        }
    }

    /// Tokens of one kind required to mint exactly `bpt_amount_out`, rounded up
    pub fn calc_token_in_given_exact_bpt_out(
        amp: AmplificationParameter,
        balances: &[FixedPoint],
        token_index: usize,
        bpt_amount_out: FixedPoint,
        bpt_total_supply: FixedPoint,
        swap_fee: SwapFeePercentage,
    ) -> MathResult<FixedPoint> {
        validate_token_index(balances.len(), token_index)?;
        let current_invariant = Self::calculate_invariant(amp, balances)?;
        if current_invariant.is_zero() {
            return Ok(FixedPoint::ZERO);
        }
        let new_invariant = bpt_total_supply
            .try_add(bpt_amount_out)?
            .div_up(bpt_total_supply)?
            .mul_up(current_invariant)?;

        let new_balance = Self::get_token_balance_given_invariant_and_all_other_balances(
            amp,
            balances,
            new_invariant,
            token_index,
        )?;
        let amount_in_without_fee = new_balance.try_sub(balances[token_index])?;

        let (non_taxable, taxable) =
            split_taxable(balances, token_index, amount_in_without_fee)?;
        non_taxable.try_add(taxable.div_up(swap_fee.value().complement())?)
    }

    /// BPT burned for an arbitrary withdrawal, rounded up
    pub fn calc_bpt_in_given_exact_tokens_out(
        amp: AmplificationParameter,
        balances: &[FixedPoint],
        amounts_out: &[FixedPoint],
        bpt_total_supply: FixedPoint,
        swap_fee: SwapFeePercentage,
    ) -> MathResult<FixedPoint> {
        validate_lengths(balances.len(), amounts_out.len())?;
        let current_invariant = Self::calculate_invariant(amp, balances)?;
        if current_invariant.is_zero() {
            return Ok(FixedPoint::ZERO);
        }
        let sum = FixedPoint::from_raw(sum_raw(balances)?);

        let mut balance_ratios_without_fee = Vec::with_capacity(balances.len());
        let mut invariant_ratio_without_fees = FixedPoint::ZERO;
        for (balance, amount_out) in balances.iter().zip(amounts_out) {
            let current_weight = balance.div_up(sum)?;
            let ratio = balance.try_sub(*amount_out)?.div_up(*balance)?;
            invariant_ratio_without_fees =
                invariant_ratio_without_fees.try_add(ratio.mul_up(current_weight)?)?;
            balance_ratios_without_fee.push(ratio);
        }

        let fee_complement = swap_fee.value().complement();
        let mut new_balances = Vec::with_capacity(balances.len());
        for ((balance, amount_out), ratio) in
            balances.iter().zip(amounts_out).zip(&balance_ratios_without_fee)
        {
            let amount_out_with_fee = if invariant_ratio_without_fees > *ratio {
                let non_taxable = balance.mul_down(invariant_ratio_without_fees.complement())?;
                let taxable = amount_out.try_sub(non_taxable)?;
                non_taxable.try_add(taxable.div_up(fee_complement)?)?
            } else {
                *amount_out
            };
            new_balances.push(balance.try_sub(amount_out_with_fee)?);
        }

        let new_invariant = Self::calculate_invariant(amp, &new_balances)?;
        let invariant_ratio = new_invariant.div_down(current_invariant)?;
        bpt_total_supply.mul_up(invariant_ratio.complement())
    }

    /// Tokens of one kind returned for burning exactly `bpt_amount_in`, rounded down
    pub fn calc_token_out_given_exact_bpt_in(
        amp: AmplificationParameter,
        balances: &[FixedPoint],
        token_index: usize,
        bpt_amount_in: FixedPoint,
        bpt_total_supply: FixedPoint,
        swap_fee: SwapFeePercentage,
    ) -> MathResult<FixedPoint> {
        validate_token_index(balances.len(), token_index)?;
        let current_invariant = Self::calculate_invariant(amp, balances)?;
        if current_invariant.is_zero() {
            return Ok(FixedPoint::ZERO);
        }
        let new_invariant = bpt_total_supply
            .try_sub(bpt_amount_in)?
            .div_up(bpt_total_supply)?
            .mul_up(current_invariant)?;

        let new_balance = Self::get_token_balance_given_invariant_and_all_other_balances(
            amp,
            balances,
            new_invariant,
            token_index,
        )?;
        let amount_out_without_fee = balances[token_index].try_sub(new_balance)?;

        let (non_taxable, taxable) =
            split_taxable(balances, token_index, amount_out_without_fee)?;
        non_taxable.try_add(taxable.mul_down(swap_fee.value().complement())?)
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

    /// Protocol share of the swap fees accrued in `token_index` since
    /// `last_invariant` was recorded
    pub fn calc_due_token_protocol_swap_fee_amount(
        amp: AmplificationParameter,
        balances: &[FixedPoint],
        last_invariant: FixedPoint,
        token_index: usize,
        protocol_swap_fee: FixedPoint,
    ) -> MathResult<FixedPoint> {
        let protocol_swap_fee = validate_protocol_swap_fee(protocol_swap_fee)?;
        let final_balance = Self::get_token_balance_given_invariant_and_all_other_balances(
            amp,
            balances,
            last_invariant,
            token_index,
        )?;
        if balances[token_index] <= final_balance {
            return Ok(FixedPoint::ZERO);
        }
        balances[token_index]
            .try_sub(final_balance)?
            .mul_down(protocol_swap_fee)
    }
}

fn validate_token_count(count: usize) -> MathResult<()> {
    if !(MIN_TOKENS..=MAX_TOKENS).contains(&count) {
        return Err(MathError::invalid(format!(
            "stable pools hold {MIN_TOKENS} to {MAX_TOKENS} tokens, got {count}"
        )));
    }
    Ok(())
}

fn validate_lengths(balances: usize, amounts: usize) -> MathResult<()> {
    if balances != amounts {
        return Err(MathError::invalid(format!(
            "{balances} balances but {amounts} amounts"
        )));
    }
    Ok(())
}

fn sum_raw(balances: &[FixedPoint]) -> MathResult<U256> {
    balances
        .iter()
        .try_fold(U256::ZERO, |acc, b| integer::add(acc, b.raw()))
}

/// Split a single-token amount into the part covered by the token's current
/// share of the pool and the taxable remainder (rounded up)
fn split_taxable(
    balances: &[FixedPoint],
    token_index: usize,
    amount: FixedPoint,
) -> MathResult<(FixedPoint, FixedPoint)> {
    let sum = FixedPoint::from_raw(sum_raw(balances)?);
    let current_weight = balances[token_index].div_down(sum)?;
    let taxable = amount.mul_up(current_weight.complement())?;
    let non_taxable = amount.try_sub(taxable)?;
    Ok((non_taxable, taxable))
}
