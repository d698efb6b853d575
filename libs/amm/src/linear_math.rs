//! Linear pool math: main token, wrapped token and BPT
//!
//! The pool prices main and wrapped tokens at the wrapped token's `rate`. Main
//! balances inside `[lower_target, upper_target]` are taken at face value;
//! outside the zone every unit carries a `fee` penalty, applied through the
//! *nominal* main balance. BPT is priced against the invariant
//! `nominal_main + wrapped * rate`.

use parity_types::{integer, FixedPoint, MathError, MathResult};

/// Fee, rate and target zone of a linear pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearParams {
    pub fee: FixedPoint,
    pub rate: FixedPoint,
    pub lower_target: FixedPoint,
    pub upper_target: FixedPoint,
}

/// Position of a main balance relative to the target zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Below,
    Within,
    Above,
}

impl LinearParams {
    pub fn new(
        fee: FixedPoint,
        rate: FixedPoint,
        lower_target: FixedPoint,
        upper_target: FixedPoint,
    ) -> MathResult<Self> {
        if fee >= FixedPoint::ONE {
            return Err(MathError::invalid(format!("linear fee {fee} must be below 1")));
        }
        if rate.is_zero() {
            return Err(MathError::invalid("wrapped token rate must be positive"));
        }
        if lower_target > upper_target {
            return Err(MathError::invalid(format!(
                "lower target {lower_target} above upper target {upper_target}"
            )));
        }
        Ok(Self {
            fee,
            rate,
            lower_target,
            upper_target,
        })
    }

    fn zone_of(&self, balance: FixedPoint) -> Zone {
        if balance < self.lower_target {
            Zone::Below
        } else if balance <= self.upper_target {
            Zone::Within
        } else {
            Zone::Above
        }
    }

    /// Real main balance to nominal main balance
    pub fn to_nominal(&self, real: FixedPoint) -> MathResult<FixedPoint> {
        match self.zone_of(real) {
            Zone::Below => {
                let penalty = self.lower_target.try_sub(real)?.mul_down(self.fee)?;
                real.try_sub(penalty).map_err(|_| {
                    MathError::invalid(format!("nominal main balance of {real} is negative"))
                })
            }
            Zone::Within => Ok(real),
            Zone::Above => {
                let penalty = real.try_sub(self.upper_target)?.mul_down(self.fee)?;
                real.try_sub(penalty)
            }
        }
    }

    /// Nominal main balance back to the real main balance
    ///
    /// The zone is first guessed from the nominal value; if the candidate lands
    /// in another zone it is re-solved there.
    pub fn from_nominal(&self, nominal: FixedPoint) -> MathResult<FixedPoint> {
        let guess = self.zone_of(nominal);
        let candidate = self.from_nominal_in_zone(nominal, guess)?;
        let landed = self.zone_of(candidate);
        if landed == guess {
            Ok(candidate)
        } else {
            self.from_nominal_in_zone(nominal, landed)
        }
    }

    fn from_nominal_in_zone(&self, nominal: FixedPoint, zone: Zone) -> MathResult<FixedPoint> {
        match zone {
            // real = (nominal + fee * lower) / (1 + fee)
            Zone::Below => nominal
                .try_add(self.fee.mul_down(self.lower_target)?)?
                .div_down(FixedPoint::ONE.try_add(self.fee)?),
            Zone::Within => Ok(nominal),
            // real = (nominal - fee * upper) / (1 - fee)
            Zone::Above => nominal
                .try_sub(self.fee.mul_down(self.upper_target)?)?
                .div_down(self.fee.complement()),
        }
    }

    fn invariant_up(&self, nominal_main: FixedPoint, wrapped: FixedPoint) -> MathResult<FixedPoint> {
        nominal_main.try_add(wrapped.mul_up(self.rate)?)
    }

    fn invariant_down(&self, nominal_main: FixedPoint, wrapped: FixedPoint) -> MathResult<FixedPoint> {
        nominal_main.try_add(wrapped.mul_down(self.rate)?)
    }
}

/// Linear pool math functions
pub struct LinearMath;

impl LinearMath {
    /// BPT out for an exact main token deposit; zero when no BPT exists yet
    pub fn calc_bpt_out_per_main_in(
        main_in: FixedPoint,
        main_balance: FixedPoint,
        wrapped_balance: FixedPoint,
        bpt_supply: FixedPoint,
        params: &LinearParams,
    ) -> MathResult<FixedPoint> {
        if bpt_supply.is_zero() {
            return Ok(FixedPoint::ZERO);
        }
        let previous_nominal = params.to_nominal(main_balance)?;
        let after_nominal = params.to_nominal(main_balance.try_add(main_in)?)?;
        let delta_nominal = after_nominal.try_sub(previous_nominal)?;
        let invariant = params.invariant_up(previous_nominal, wrapped_balance)?;
        scale_down(bpt_supply, delta_nominal, invariant)
    }

    /// BPT in for an exact main token withdrawal, rounded up
    pub fn calc_bpt_in_per_main_out(
        main_out: FixedPoint,
        main_balance: FixedPoint,
        wrapped_balance: FixedPoint,
        bpt_supply: FixedPoint,
        params: &LinearParams,
    ) -> MathResult<FixedPoint> {
        let previous_nominal = params.to_nominal(main_balance)?;
        let after_nominal = params.to_nominal(remaining_main(main_balance, main_out)?)?;
        let delta_nominal = previous_nominal.try_sub(after_nominal)?;
        let invariant = params.invariant_down(previous_nominal, wrapped_balance)?;
        scale_up(bpt_supply, delta_nominal, invariant)
    }

    /// Wrapped out for an exact main token deposit
    pub fn calc_wrapped_out_per_main_in(
        main_in: FixedPoint,
        main_balance: FixedPoint,
        params: &LinearParams,
    ) -> MathResult<FixedPoint> {
        let previous_nominal = params.to_nominal(main_balance)?;
        let after_nominal = params.to_nominal(main_balance.try_add(main_in)?)?;
        after_nominal
            .try_sub(previous_nominal)?
            .div_down(params.rate)
    }

    /// Wrapped in for an exact main token withdrawal
    pub fn calc_wrapped_in_per_main_out(
        main_out: FixedPoint,
        main_balance: FixedPoint,
        params: &LinearParams,
    ) -> MathResult<FixedPoint> {
        let previous_nominal = params.to_nominal(main_balance)?;
        let after_nominal = params.to_nominal(remaining_main(main_balance, main_out)?)?;
        previous_nominal
            .try_sub(after_nominal)?
            .div_up(params.rate)
    }

    /// Main in required to mint exactly `bpt_out`
    pub fn calc_main_in_per_bpt_out(
        bpt_out: FixedPoint,
        main_balance: FixedPoint,
        wrapped_balance: FixedPoint,
        bpt_supply: FixedPoint,
        params: &LinearParams,
    ) -> MathResult<FixedPoint> {
        let previous_nominal = params.to_nominal(main_balance)?;
        let invariant = params.invariant_up(previous_nominal, wrapped_balance)?;
        let delta_nominal = scale_up(invariant, bpt_out, bpt_supply)?;
        params
            .from_nominal(previous_nominal.try_add(delta_nominal)?)?
            .try_sub(main_balance)
    }

    /// Main out for burning exactly `bpt_in`
    pub fn calc_main_out_per_bpt_in(
        bpt_in: FixedPoint,
        main_balance: FixedPoint,
        wrapped_balance: FixedPoint,
        bpt_supply: FixedPoint,
        params: &LinearParams,
    ) -> MathResult<FixedPoint> {
        let previous_nominal = params.to_nominal(main_balance)?;
        let invariant = params.invariant_down(previous_nominal, wrapped_balance)?;
        let delta_nominal = scale_down(invariant, bpt_in, bpt_supply)?;
        let after_nominal = previous_nominal.try_sub(delta_nominal).map_err(|_| {
            MathError::invalid(format!("burning {bpt_in} BPT drains the main balance"))
        })?;
        main_balance.try_sub(params.from_nominal(after_nominal)?)
    }

    /// Main out for an exact wrapped token deposit
    pub fn calc_main_out_per_wrapped_in(
        wrapped_in: FixedPoint,
        main_balance: FixedPoint,
        params: &LinearParams,
    ) -> MathResult<FixedPoint> {
        let previous_nominal = params.to_nominal(main_balance)?;
        let delta_nominal = wrapped_in.mul_down(params.rate)?;
        let after_nominal = previous_nominal.try_sub(delta_nominal).map_err(|_| {
            MathError::invalid(format!(
                "{wrapped_in} wrapped exceeds the nominal main balance {previous_nominal}"
            ))
        })?;
        main_balance.try_sub(params.from_nominal(after_nominal)?)
    }

    /// Main in required for an exact wrapped token withdrawal
    pub fn calc_main_in_per_wrapped_out(
        wrapped_out: FixedPoint,
        main_balance: FixedPoint,
        params: &LinearParams,
    ) -> MathResult<FixedPoint> {
        let previous_nominal = params.to_nominal(main_balance)?;
        let delta_nominal = wrapped_out.mul_up(params.rate)?;
        params
            .from_nominal(previous_nominal.try_add(delta_nominal)?)?
            .try_sub(main_balance)
    }

    /// BPT out for an exact wrapped token deposit; zero when no BPT exists yet
    pub fn calc_bpt_out_per_wrapped_in(
        wrapped_in: FixedPoint,
        main_balance: FixedPoint,
        wrapped_balance: FixedPoint,
        bpt_supply: FixedPoint,
        params: &LinearParams,
    ) -> MathResult<FixedPoint> {
        if bpt_supply.is_zero() {
            return Ok(FixedPoint::ZERO);
        }
        let nominal_main = params.to_nominal(main_balance)?;
        let invariant = params.invariant_up(nominal_main, wrapped_balance)?;
        scale_down(bpt_supply, wrapped_in.mul_down(params.rate)?, invariant)
    }

    /// BPT in for an exact wrapped token withdrawal, rounded up
    pub fn calc_bpt_in_per_wrapped_out(
        wrapped_out: FixedPoint,
        main_balance: FixedPoint,
        wrapped_balance: FixedPoint,
        bpt_supply: FixedPoint,
        params: &LinearParams,
    ) -> MathResult<FixedPoint> {
        let nominal_main = params.to_nominal(main_balance)?;
        let invariant = params.invariant_down(nominal_main, wrapped_balance)?;
        scale_up(bpt_supply, wrapped_out.mul_up(params.rate)?, invariant)
    }

    /// Wrapped in required to mint exactly `bpt_out`
    pub fn calc_wrapped_in_per_bpt_out(
        bpt_out: FixedPoint,
        main_balance: FixedPoint,
        wrapped_balance: FixedPoint,
        bpt_supply: FixedPoint,
        params: &LinearParams,
    ) -> MathResult<FixedPoint> {
        let nominal_main = params.to_nominal(main_balance)?;
        let invariant = params.invariant_up(nominal_main, wrapped_balance)?;
        scale_up(invariant, bpt_out, bpt_supply)?.div_up(params.rate)
    }

    /// Wrapped out for burning exactly `bpt_in`
    pub fn calc_wrapped_out_per_bpt_in(
        bpt_in: FixedPoint,
        main_balance: FixedPoint,
        wrapped_balance: FixedPoint,
        bpt_supply: FixedPoint,
        params: &LinearParams,
    ) -> MathResult<FixedPoint> {
        let nominal_main = params.to_nominal(main_balance)?;
        let invariant = params.invariant_down(nominal_main, wrapped_balance)?;
        scale_down(invariant, bpt_in, bpt_supply)?.div_down(params.rate)
    }
}

fn remaining_main(main_balance: FixedPoint, main_out: FixedPoint) -> MathResult<FixedPoint> {
    main_balance.try_sub(main_out).map_err(|_| {
        MathError::invalid(format!(
            "main out {main_out} exceeds main balance {main_balance}"
        ))
    })
}

/// `floor(a * b / c)` on raw values
fn scale_down(a: FixedPoint, b: FixedPoint, c: FixedPoint) -> MathResult<FixedPoint> {
    integer::div_down(integer::mul(a.raw(), b.raw())?, c.raw()).map(FixedPoint::from_raw)
}

/// `ceil(a * b / c)` on raw values
fn scale_up(a: FixedPoint, b: FixedPoint, c: FixedPoint) -> MathResult<FixedPoint> {
    integer::div_up(integer::mul(a.raw(), b.raw())?, c.raw()).map(FixedPoint::from_raw)
}
