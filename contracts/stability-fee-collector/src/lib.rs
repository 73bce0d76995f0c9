//! Stability Fee Collector
//!
//! Compounds each pool's per-second stability fee into its debt accumulated
//! rate and credits the new debt to the system debt engine.
//!
//! ## Accrual
//!
//! ```text
//! new_rate = (global_rate + pool_rate) ^ (now - last) * old_rate
//! ```
//!
//! `global_rate` is added on top of every pool's own rate and defaults to
//! zero. Accrual is permissionless; anyone may call `collect`.

use serde::{Deserialize, Serialize};

use stablecoin_book_keeper::BookKeeper;
use stablecoin_common::{
    constants::precision::RAY,
    errors::{StablecoinError, StablecoinResult},
    events::StablecoinEvent,
    math,
    types::{Address, CallContext, CollateralPoolId, U256},
    Role,
};

const CONTRACT: &str = "StabilityFeeCollector";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityFeeCollector {
    pub address: Address,
    /// Added to every pool's stability fee rate [ray]
    pub global_stability_fee_rate: U256,
    /// Receives accrued stability fees
    pub system_debt_engine: Address,
    pub paused: bool,
}

impl StabilityFeeCollector {
    pub fn new(address: Address, system_debt_engine: Address) -> Self {
        Self {
            address,
            global_stability_fee_rate: U256::ZERO,
            system_debt_engine,
            paused: false,
        }
    }

    // ============ Owner Setters ============

    pub fn set_global_stability_fee_rate(
        &mut self,
        ctx: &mut CallContext,
        book_keeper: &BookKeeper,
        ray: U256,
    ) -> StablecoinResult<()> {
        book_keeper.access_control().require_owner(ctx.sender)?;

        self.global_stability_fee_rate = ray;
        ctx.emit(StablecoinEvent::UintParameterSet {
            contract: CONTRACT.into(),
            pool: None,
            param: "GlobalStabilityFeeRate".into(),
            value: ray,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    pub fn set_system_debt_engine(
        &mut self,
        ctx: &mut CallContext,
        book_keeper: &BookKeeper,
        engine: Address,
    ) -> StablecoinResult<()> {
        book_keeper.access_control().require_owner(ctx.sender)?;
        if engine.is_zero() {
            return Err(StablecoinError::ZeroAddress {
                contract: CONTRACT,
                param: "system-debt-engine",
            });
        }

        self.system_debt_engine = engine;
        ctx.emit(StablecoinEvent::AddressParameterSet {
            contract: CONTRACT.into(),
            pool: None,
            param: "SystemDebtEngine".into(),
            value: engine,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    pub fn pause(&mut self, ctx: &mut CallContext, book_keeper: &BookKeeper) -> StablecoinResult<()> {
        book_keeper.access_control().require_owner_or_gov(ctx.sender)?;
        if self.paused {
            return Err(StablecoinError::Paused);
        }
        self.paused = true;
        ctx.emit(StablecoinEvent::Paused {
            contract: CONTRACT.into(),
            account: ctx.sender,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    pub fn unpause(&mut self, ctx: &mut CallContext, book_keeper: &BookKeeper) -> StablecoinResult<()> {
        book_keeper.access_control().require_owner_or_gov(ctx.sender)?;
        if !self.paused {
            return Err(StablecoinError::NotPaused);
        }
        self.paused = false;
        ctx.emit(StablecoinEvent::Unpaused {
            contract: CONTRACT.into(),
            account: ctx.sender,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    // ============ Accrual ============

    /// Debt accumulated rate `pool` would have at time `at`
    pub fn preview_rate(&self, book_keeper: &BookKeeper, pool: CollateralPoolId, at: u64) -> StablecoinResult<U256> {
        let config = book_keeper.pool_config();
        if !config.is_initialized(pool) {
            return Err(StablecoinError::PoolNotInitialized { contract: CONTRACT });
        }

        let last = config.last_accumulation_time(pool);
        if at < last {
            return Err(StablecoinError::InvalidNow {
                now: at,
                last_accumulation_time: last,
            });
        }

        let per_second = math::add(self.global_stability_fee_rate, config.stability_fee_rate(pool))?;
        let growth = math::rpow(per_second, at - last, RAY)?;
        math::rmul(growth, config.debt_accumulated_rate(pool))
    }

    /// Accrue `pool` up to now; returns the new debt accumulated rate
    pub fn collect(
        &self,
        ctx: &mut CallContext,
        book_keeper: &mut BookKeeper,
        pool: CollateralPoolId,
    ) -> StablecoinResult<U256> {
        // 1. Collector must be running and allowed to write the ledger
        if self.paused {
            return Err(StablecoinError::Paused);
        }
        book_keeper.access_control().require_role(Role::StabilityFeeCollector, self.address)?;

        // 2. Compute the compounded rate
        let previous_rate = book_keeper.pool_config().debt_accumulated_rate(pool);
        let new_rate = self.preview_rate(book_keeper, pool, ctx.timestamp)?;
        let rate_delta = math::diff(new_rate, previous_rate)?;

        // 3. Credit the fees and stamp the accumulation time
        let (collector, engine) = (self.address, self.system_debt_engine);
        ctx.call_as(collector, |ctx| {
            book_keeper.accrue_stability_fee(ctx, pool, engine, rate_delta)?;
            book_keeper.pool_config_mut().update_last_accumulation_time(ctx, pool)
        })?;

        ctx.emit(StablecoinEvent::StabilityFeeCollected {
            pool,
            previous_rate,
            new_rate,
            beneficiary: engine,
            timestamp: ctx.timestamp,
        });
        Ok(new_rate)
    }
}
