//! Stairstep exponential price decrease
//!
//! Like [`ExponentialDecrease`](crate::ExponentialDecrease) but the price
//! only drops once every `step` seconds, by `cut` per step.

use serde::{Deserialize, Serialize};

use stablecoin_common::{
    constants::precision::RAY,
    errors::{StablecoinError, StablecoinResult},
    math,
    types::{Address, CallContext, U256},
    AccessControlConfig,
};

use crate::{check_cut, emit_file, seconds, PriceCalculator};

const CONTRACT: &str = "StairstepExponentialDecrease";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StairstepExponentialDecrease {
    pub address: Address,
    /// Per-step multiplicative decrease [ray], at most one
    pub cut: U256,
    /// Seconds between drops
    pub step: u64,
}

impl StairstepExponentialDecrease {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            cut: U256::ZERO,
            step: 0,
        }
    }

    pub fn with_params(address: Address, cut: U256, step: u64) -> StablecoinResult<Self> {
        Ok(Self {
            address,
            cut: check_cut(CONTRACT, cut)?,
            step,
        })
    }

    /// Set `cut` or `step` (owner)
    pub fn file(&mut self, ctx: &mut CallContext, acl: &AccessControlConfig, what: &str, data: U256) -> StablecoinResult<()> {
        acl.require_owner(ctx.sender)?;
        match what {
            "cut" => self.cut = check_cut(CONTRACT, data)?,
            "step" => self.step = seconds(data)?,
            _ => return Err(StablecoinError::UnrecognizedParam { contract: CONTRACT }),
        }
        emit_file(ctx, CONTRACT, what, data);
        Ok(())
    }
}

impl PriceCalculator for StairstepExponentialDecrease {
    fn price(&self, top: U256, dur: u64) -> StablecoinResult<U256> {
        let steps = dur.checked_div(self.step).ok_or(StablecoinError::DivisionByZero)?;
        math::rmul(top, math::rpow(self.cut, steps, RAY)?)
    }

    fn name(&self) -> &'static str {
        CONTRACT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stablecoin_common::events::{EventType, StablecoinEvent};

    fn owner() -> Address {
        Address::with_last_byte(1)
    }

    fn top() -> U256 {
        RAY * U256::from(100u64)
    }

    fn ray(s: &str) -> U256 {
        s.parse().unwrap()
    }

    fn setup() -> (StairstepExponentialDecrease, AccessControlConfig, CallContext) {
        let mut ctx = CallContext::new(owner(), 1_000);
        let acl = AccessControlConfig::new(owner());
        let mut calc = StairstepExponentialDecrease::new(Address::with_last_byte(0x13));
        calc.file(&mut ctx, &acl, "cut", ray("990000000000000000000000000")).unwrap();
        calc.file(&mut ctx, &acl, "step", U256::from(10u64)).unwrap();
        (calc, acl, ctx)
    }

    #[test]
    fn test_file_params() {
        let (calc, _, ctx) = setup();

        assert_eq!(calc.step, 10);
        let files = ctx.events.filter_by_type(EventType::LogFile);
        assert_eq!(files.len(), 2);
        assert!(matches!(
            files[1],
            StablecoinEvent::LogFile { what, data, .. } if what == "step" && *data == U256::from(10u64)
        ));
    }

    #[test]
    fn test_file_errors() {
        let (mut calc, acl, mut ctx) = setup();

        let result = calc.file(&mut ctx, &acl, "cut", RAY * U256::from(2u64));
        assert_eq!(result.unwrap_err().to_string(), "StairstepExponentialDecrease/cut-gt-RAY");

        let result = calc.file(&mut ctx, &acl, "tau", U256::from(1u64));
        assert_eq!(result.unwrap_err().to_string(), "StairstepExponentialDecrease/file-unrecognized-param");
    }

    #[test]
    fn test_stairstep_price() {
        let (calc, _, _) = setup();

        assert_eq!(calc.price(top(), 0).unwrap(), top());
        assert_eq!(calc.price(top(), 9).unwrap(), top());
        assert_eq!(calc.price(top(), 10).unwrap(), RAY * U256::from(99u64));
        assert_eq!(calc.price(top(), 25).unwrap(), ray("98010000000000000000000000000"));
        assert_eq!(calc.price(top(), 59).unwrap(), ray("95099004990000000000000000000"));
        assert_eq!(calc.price(top(), 60).unwrap(), ray("94148014940100000000000000000"));
    }

    #[test]
    fn test_zero_step() {
        let calc = StairstepExponentialDecrease::with_params(Address::ZERO, RAY, 0).unwrap();
        assert!(matches!(calc.price(top(), 5), Err(StablecoinError::DivisionByZero)));
    }
}
