//! Linear price decrease: the price reaches zero `tau` seconds after start.

use serde::{Deserialize, Serialize};

use stablecoin_common::{
    constants::precision::RAY,
    errors::{StablecoinError, StablecoinResult},
    math,
    types::{Address, CallContext, U256},
    AccessControlConfig,
};

use crate::{emit_file, seconds, PriceCalculator};

const CONTRACT: &str = "LinearDecrease";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearDecrease {
    pub address: Address,
    /// Seconds after auction start when the price reaches zero
    pub tau: u64,
}

impl LinearDecrease {
    pub fn new(address: Address) -> Self {
        Self::with_tau(address, 0)
    }

    pub fn with_tau(address: Address, tau: u64) -> Self {
        Self { address, tau }
    }

    /// Set `tau` (owner)
    pub fn file(&mut self, ctx: &mut CallContext, acl: &AccessControlConfig, what: &str, data: U256) -> StablecoinResult<()> {
        acl.require_owner(ctx.sender)?;
        match what {
            "tau" => self.tau = seconds(data)?,
            _ => return Err(StablecoinError::UnrecognizedParam { contract: CONTRACT }),
        }
        emit_file(ctx, CONTRACT, what, data);
        Ok(())
    }
}

impl PriceCalculator for LinearDecrease {
    fn price(&self, top: U256, dur: u64) -> StablecoinResult<U256> {
        if dur >= self.tau {
            return Ok(U256::ZERO);
        }
        let remaining = math::mul(U256::from(self.tau - dur), RAY)? / U256::from(self.tau);
        math::rmul(top, remaining)
    }

    fn name(&self) -> &'static str {
        CONTRACT
    }
}
