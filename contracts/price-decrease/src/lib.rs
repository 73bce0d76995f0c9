//! Auction Price Decrease Calculators
//!
//! Given the starting price of a collateral auction (`top`) and the seconds
//! elapsed since it started (`dur`), each calculator returns the current
//! price. All prices share the scale of `top`; decay factors are rays.
//!
//! ## Curves
//!
//! - **Linear**: `top * (tau - dur) / tau`, zero once `dur >= tau`
//! - **Exponential**: `top * cut^dur`
//! - **Stairstep exponential**: `top * cut^(dur / step)`
//!
//! Parameters are changed through `file`, which is restricted to the owner
//! role and logged as `LogFile`.

use serde::{Deserialize, Serialize};

use stablecoin_common::{
    constants::precision::RAY,
    errors::{StablecoinError, StablecoinResult},
    events::StablecoinEvent,
    types::{Address, CallContext, U256},
};

pub mod exponential;
pub mod linear;
pub mod stairstep;

pub use exponential::ExponentialDecrease;
pub use linear::LinearDecrease;
pub use stairstep::StairstepExponentialDecrease;

/// Auction price as a function of elapsed time
pub trait PriceCalculator {
    /// Price `dur` seconds after an auction started at `top`
    fn price(&self, top: U256, dur: u64) -> StablecoinResult<U256>;

    /// Contract name used in revert reasons and logs
    fn name(&self) -> &'static str;
}

// ============ Curve Configuration ============

/// Serializable description of a calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecreaseCurve {
    Linear { tau: u64 },
    Exponential { cut: U256 },
    StairstepExponential { cut: U256, step: u64 },
}

impl DecreaseCurve {
    /// Instantiate the calculator at `address`
    pub fn build(&self, address: Address) -> StablecoinResult<Box<dyn PriceCalculator>> {
        Ok(match *self {
            Self::Linear { tau } => Box::new(LinearDecrease::with_tau(address, tau)),
            Self::Exponential { cut } => Box::new(ExponentialDecrease::with_cut(address, cut)?),
            Self::StairstepExponential { cut, step } => {
                Box::new(StairstepExponentialDecrease::with_params(address, cut, step)?)
            }
        })
    }
}

// ============ Shared Helpers ============

/// `cut` must not grow the price
pub(crate) fn check_cut(contract: &'static str, cut: U256) -> StablecoinResult<U256> {
    if cut > RAY {
        return Err(StablecoinError::CutAboveRay { contract });
    }
    Ok(cut)
}

/// Seconds parameter passed through `file`
pub(crate) fn seconds(data: U256) -> StablecoinResult<u64> {
    u64::try_from(data).map_err(|_| StablecoinError::Overflow)
}

pub(crate) fn emit_file(ctx: &mut CallContext, contract: &'static str, what: &str, data: U256) {
    ctx.emit(StablecoinEvent::LogFile {
        contract: contract.into(),
        what: what.into(),
        data,
        timestamp: ctx.timestamp,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ray_str(s: &str) -> U256 {
        s.parse().unwrap()
    }

    #[test]
    fn test_curve_from_json() {
        let json = r#"{"kind":"stairstep_exponential","cut":"1000000000000000000000000000","step":10}"#;
        let curve: DecreaseCurve = serde_json::from_str(json).unwrap();
        assert_eq!(curve, DecreaseCurve::StairstepExponential { cut: RAY, step: 10 });

        let calc = curve.build(Address::with_last_byte(0x5e)).unwrap();
        assert_eq!(calc.name(), "StairstepExponentialDecrease");
        assert_eq!(calc.price(RAY, 1_000).unwrap(), RAY);
    }

    #[test]
    fn test_build_each_curve() {
        let top = RAY * U256::from(100u64);
        let cut = ray_str("990000000000000000000000000");
        let address = Address::with_last_byte(0x5e);

        let linear = DecreaseCurve::Linear { tau: 3_600 }.build(address).unwrap();
        let exponential = DecreaseCurve::Exponential { cut }.build(address).unwrap();
        let stairstep = DecreaseCurve::StairstepExponential { cut, step: 10 }.build(address).unwrap();

        assert_eq!(linear.price(top, 1_800).unwrap(), RAY * U256::from(50u64));
        assert_eq!(exponential.price(top, 1).unwrap(), RAY * U256::from(99u64));
        assert_eq!(stairstep.price(top, 10).unwrap(), RAY * U256::from(99u64));
    }

    #[test]
    fn test_build_rejects_cut_above_ray() {
        let curve = DecreaseCurve::Exponential { cut: RAY + U256::from(1u64) };
        let result = curve.build(Address::ZERO);
        assert_eq!(result.err().unwrap().to_string(), "ExponentialDecrease/cut-gt-RAY");
    }

    #[test]
    fn test_seconds_overflow() {
        assert_eq!(seconds(U256::from(60u64)).unwrap(), 60);
        assert!(matches!(seconds(U256::MAX), Err(StablecoinError::Overflow)));
    }
}
