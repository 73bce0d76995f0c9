//! Exponential price decrease: the price is multiplied by `cut` every second.

use serde::{Deserialize, Serialize};

use stablecoin_common::{
    constants::precision::RAY,
    errors::{StablecoinError, StablecoinResult},
    math,
    types::{Address, CallContext, U256},
    AccessControlConfig,
};

use crate::{check_cut, emit_file, PriceCalculator};

const CONTRACT: &str = "ExponentialDecrease";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExponentialDecrease {
    pub address: Address,
    /// Per-second multiplicative decrease [ray], at most one
    pub cut: U256,
}

impl ExponentialDecrease {
    pub fn new(address: Address) -> Self {
        Self { address, cut: U256::ZERO }
    }

    pub fn with_cut(address: Address, cut: U256) -> StablecoinResult<Self> {
        Ok(Self {
            address,
            cut: check_cut(CONTRACT, cut)?,
        })
    }

    /// Set `cut` (owner)
    pub fn file(&mut self, ctx: &mut CallContext, acl: &AccessControlConfig, what: &str, data: U256) -> StablecoinResult<()> {
        acl.require_owner(ctx.sender)?;
        match what {
            "cut" => self.cut = check_cut(CONTRACT, data)?,
            _ => return Err(StablecoinError::UnrecognizedParam { contract: CONTRACT }),
        }
        emit_file(ctx, CONTRACT, what, data);
        Ok(())
    }
}

impl PriceCalculator for ExponentialDecrease {
    fn price(&self, top: U256, dur: u64) -> StablecoinResult<U256> {
        math::rmul(top, math::rpow(self.cut, dur, RAY)?)
    }

    fn name(&self) -> &'static str {
        CONTRACT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address::with_last_byte(1)
    }

    fn top() -> U256 {
        RAY * U256::from(100u64)
    }

    fn ray(s: &str) -> U256 {
        s.parse().unwrap()
    }

    fn setup() -> (ExponentialDecrease, AccessControlConfig, CallContext) {
        let mut ctx = CallContext::new(owner(), 1_000);
        let acl = AccessControlConfig::new(owner());
        let mut calc = ExponentialDecrease::new(Address::with_last_byte(0x12));
        calc.file(&mut ctx, &acl, "cut", ray("990000000000000000000000000")).unwrap();
        (calc, acl, ctx)
    }

    #[test]
    fn test_file_cut_bounds() {
        let (mut calc, acl, mut ctx) = setup();

        let result = calc.file(&mut ctx, &acl, "cut", RAY + U256::from(1u64));
        assert_eq!(result.unwrap_err().to_string(), "ExponentialDecrease/cut-gt-RAY");
        assert_eq!(calc.cut, ray("990000000000000000000000000"));

        // exactly one ray is a flat price
        calc.file(&mut ctx, &acl, "cut", RAY).unwrap();
        assert_eq!(calc.price(top(), 10_000).unwrap(), top());
    }

    #[test]
    fn test_file_rejects_unknown_param() {
        let (mut calc, acl, mut ctx) = setup();

        let result = calc.file(&mut ctx, &acl, "step", U256::from(1u64));
        assert!(matches!(result, Err(StablecoinError::UnrecognizedParam { contract: "ExponentialDecrease" })));

        let result = ctx.call_as(Address::with_last_byte(2), |ctx| calc.file(ctx, &acl, "cut", RAY));
        assert!(matches!(result, Err(StablecoinError::NotOwner)));
    }

    #[test]
    fn test_exponential_price() {
        let (calc, _, _) = setup();

        assert_eq!(calc.price(top(), 0).unwrap(), top());
        assert_eq!(calc.price(top(), 1).unwrap(), RAY * U256::from(99u64));
        assert_eq!(calc.price(top(), 2).unwrap(), ray("98010000000000000000000000000"));
        assert_eq!(calc.price(top(), 3).unwrap(), ray("97029900000000000000000000000"));
        assert_eq!(calc.price(top(), 10).unwrap(), ray("90438207500880449001000000000"));
        assert_eq!(calc.price(top(), 60).unwrap(), ray("54715664239076147619474137100"));
    }

    #[test]
    fn test_price_is_monotonic() {
        let (calc, _, _) = setup();

        let mut previous = calc.price(top(), 0).unwrap();
        for dur in 1..120 {
            let current = calc.price(top(), dur).unwrap();
            assert!(current <= previous);
            previous = current;
        }
    }
}
