//! Collateral Pool Configuration
//!
//! Per-pool risk parameters and the accounting values the ledger and the
//! stability fee collector keep in sync (total debt share, accumulated rate,
//! last accumulation time).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use stablecoin_common::{
    constants::{liquidation, precision::RAY, stability_fee::MAX_STABILITY_FEE_RATE},
    errors::{StablecoinError, StablecoinResult},
    events::StablecoinEvent,
    types::{Address, CallContext, CollateralPoolId, U256},
    AccessControlConfig, Role,
};

const CONTRACT: &str = "CollateralPoolConfig";

// ============ Pool State ============

/// One collateral pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralPool {
    /// Sum of position debt shares [wad]
    pub total_debt_share: U256,
    /// Debt per debt share, grows with the stability fee [ray]
    pub debt_accumulated_rate: U256,
    /// Collateral price over liquidation ratio [ray]
    pub price_with_safety_margin: U256,
    /// Pool debt ceiling [rad]
    pub debt_ceiling: U256,
    /// Minimum debt of an open position [rad]
    pub debt_floor: U256,
    pub price_feed: Address,
    /// Minimum collateralization [ray]
    pub liquidation_ratio: U256,
    /// Per-second stability fee [ray]
    pub stability_fee_rate: U256,
    pub last_accumulation_time: u64,
    pub adapter: Address,
    pub close_factor_bps: u64,
    pub liquidator_incentive_bps: u64,
    pub treasury_fees_bps: u64,
    /// Liquidation strategy contract
    pub strategy: Address,
}

/// Parameters of `init_collateral_pool`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralPoolParams {
    pub debt_ceiling: U256,
    pub debt_floor: U256,
    pub price_feed: Address,
    pub liquidation_ratio: U256,
    pub stability_fee_rate: U256,
    pub adapter: Address,
    pub close_factor_bps: u64,
    pub liquidator_incentive_bps: u64,
    pub treasury_fees_bps: u64,
    pub strategy: Address,
}

/// Values the ledger reads on every position change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollateralPoolInfo {
    pub debt_accumulated_rate: U256,
    pub total_debt_share: U256,
    pub price_with_safety_margin: U256,
    pub debt_ceiling: U256,
    pub debt_floor: U256,
}

// ============ Validation ============

fn validate_stability_fee_rate(rate: U256) -> StablecoinResult<()> {
    if rate < RAY || rate > MAX_STABILITY_FEE_RATE {
        return Err(StablecoinError::InvalidStabilityFeeRate { rate });
    }
    Ok(())
}

fn validate_liquidation_ratio(ratio: U256) -> StablecoinResult<()> {
    if ratio < RAY {
        return Err(StablecoinError::InvalidLiquidationRatio);
    }
    Ok(())
}

fn validate_close_factor_bps(value: u64) -> StablecoinResult<()> {
    if value == 0 || value > liquidation::MAX_CLOSE_FACTOR_BPS {
        return Err(StablecoinError::InvalidBps { param: "close-factor-bps", value });
    }
    Ok(())
}

fn validate_liquidator_incentive_bps(value: u64) -> StablecoinResult<()> {
    if !(liquidation::MIN_LIQUIDATOR_INCENTIVE_BPS..=liquidation::MAX_LIQUIDATOR_INCENTIVE_BPS)
        .contains(&value)
    {
        return Err(StablecoinError::InvalidBps { param: "liquidator-incentive-bps", value });
    }
    Ok(())
}

fn validate_treasury_fees_bps(value: u64) -> StablecoinResult<()> {
    if value > liquidation::MAX_TREASURY_FEES_BPS {
        return Err(StablecoinError::InvalidBps { param: "treasury-fees-bps", value });
    }
    Ok(())
}

// ============ Contract ============

/// Collateral pool registry
///
/// Holds the protocol's [`AccessControlConfig`]; every other contract checks
/// roles against it through the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralPoolConfig {
    pub address: Address,
    access_control: AccessControlConfig,
    pools: BTreeMap<CollateralPoolId, CollateralPool>,
}

impl CollateralPoolConfig {
    pub fn new(address: Address, access_control: AccessControlConfig) -> Self {
        Self {
            address,
            access_control,
            pools: BTreeMap::new(),
        }
    }

    pub fn access_control(&self) -> &AccessControlConfig {
        &self.access_control
    }

    pub fn access_control_mut(&mut self) -> &mut AccessControlConfig {
        &mut self.access_control
    }

    /// Create a pool with rate = RAY and accumulation starting now
    pub fn init_collateral_pool(
        &mut self,
        ctx: &mut CallContext,
        pool: CollateralPoolId,
        params: CollateralPoolParams,
    ) -> StablecoinResult<()> {
        self.access_control.require_owner(ctx.sender)?;

        if self.is_initialized(pool) {
            return Err(StablecoinError::PoolAlreadyInitialized);
        }
        validate_stability_fee_rate(params.stability_fee_rate)?;
        validate_liquidation_ratio(params.liquidation_ratio)?;
        validate_close_factor_bps(params.close_factor_bps)?;
        validate_liquidator_incentive_bps(params.liquidator_incentive_bps)?;
        validate_treasury_fees_bps(params.treasury_fees_bps)?;

        self.pools.insert(
            pool,
            CollateralPool {
                total_debt_share: U256::ZERO,
                debt_accumulated_rate: RAY,
                price_with_safety_margin: U256::ZERO,
                debt_ceiling: params.debt_ceiling,
                debt_floor: params.debt_floor,
                price_feed: params.price_feed,
                liquidation_ratio: params.liquidation_ratio,
                stability_fee_rate: params.stability_fee_rate,
                last_accumulation_time: ctx.timestamp,
                adapter: params.adapter,
                close_factor_bps: params.close_factor_bps,
                liquidator_incentive_bps: params.liquidator_incentive_bps,
                treasury_fees_bps: params.treasury_fees_bps,
                strategy: params.strategy,
            },
        );

        ctx.emit(StablecoinEvent::UintParameterSet {
            contract: CONTRACT.into(),
            pool: Some(pool),
            param: "DebtCeiling".into(),
            value: params.debt_ceiling,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    // ============ Owner Setters ============

    pub fn set_debt_ceiling(&mut self, ctx: &mut CallContext, pool: CollateralPoolId, rad: U256) -> StablecoinResult<()> {
        self.update_uint(ctx, Role::Owner, pool, "DebtCeiling", rad, |p| &mut p.debt_ceiling)
    }

    pub fn set_debt_floor(&mut self, ctx: &mut CallContext, pool: CollateralPoolId, rad: U256) -> StablecoinResult<()> {
        self.update_uint(ctx, Role::Owner, pool, "DebtFloor", rad, |p| &mut p.debt_floor)
    }

    pub fn set_liquidation_ratio(&mut self, ctx: &mut CallContext, pool: CollateralPoolId, ray: U256) -> StablecoinResult<()> {
        self.access_control.require_owner(ctx.sender)?;
        validate_liquidation_ratio(ray)?;
        self.update_uint(ctx, Role::Owner, pool, "LiquidationRatio", ray, |p| &mut p.liquidation_ratio)
    }

    pub fn set_stability_fee_rate(&mut self, ctx: &mut CallContext, pool: CollateralPoolId, ray: U256) -> StablecoinResult<()> {
        self.access_control.require_owner(ctx.sender)?;
        validate_stability_fee_rate(ray)?;
        self.update_uint(ctx, Role::Owner, pool, "StabilityFeeRate", ray, |p| &mut p.stability_fee_rate)
    }

    pub fn set_close_factor_bps(&mut self, ctx: &mut CallContext, pool: CollateralPoolId, bps: u64) -> StablecoinResult<()> {
        self.access_control.require_owner(ctx.sender)?;
        validate_close_factor_bps(bps)?;
        self.update_bps(ctx, pool, "CloseFactorBps", bps, |p| &mut p.close_factor_bps)
    }

    pub fn set_liquidator_incentive_bps(&mut self, ctx: &mut CallContext, pool: CollateralPoolId, bps: u64) -> StablecoinResult<()> {
        self.access_control.require_owner(ctx.sender)?;
        validate_liquidator_incentive_bps(bps)?;
        self.update_bps(ctx, pool, "LiquidatorIncentiveBps", bps, |p| &mut p.liquidator_incentive_bps)
    }

    pub fn set_treasury_fees_bps(&mut self, ctx: &mut CallContext, pool: CollateralPoolId, bps: u64) -> StablecoinResult<()> {
        self.access_control.require_owner(ctx.sender)?;
        validate_treasury_fees_bps(bps)?;
        self.update_bps(ctx, pool, "TreasuryFeesBps", bps, |p| &mut p.treasury_fees_bps)
    }

    pub fn set_price_feed(&mut self, ctx: &mut CallContext, pool: CollateralPoolId, feed: Address) -> StablecoinResult<()> {
        self.update_address(ctx, pool, "PriceFeed", feed, |p| &mut p.price_feed)
    }

    pub fn set_adapter(&mut self, ctx: &mut CallContext, pool: CollateralPoolId, adapter: Address) -> StablecoinResult<()> {
        self.update_address(ctx, pool, "Adapter", adapter, |p| &mut p.adapter)
    }

    pub fn set_strategy(&mut self, ctx: &mut CallContext, pool: CollateralPoolId, strategy: Address) -> StablecoinResult<()> {
        self.update_address(ctx, pool, "Strategy", strategy, |p| &mut p.strategy)
    }

    // ============ Module Setters ============

    /// Written by the price oracle
    pub fn set_price_with_safety_margin(&mut self, ctx: &mut CallContext, pool: CollateralPoolId, ray: U256) -> StablecoinResult<()> {
        self.update_uint(ctx, Role::PriceOracle, pool, "PriceWithSafetyMargin", ray, |p| {
            &mut p.price_with_safety_margin
        })
    }

    /// Written by the ledger on position changes
    pub fn set_total_debt_share(&mut self, ctx: &mut CallContext, pool: CollateralPoolId, wad: U256) -> StablecoinResult<()> {
        self.update_uint(ctx, Role::BookKeeper, pool, "TotalDebtShare", wad, |p| &mut p.total_debt_share)
    }

    /// Written by the ledger on stability fee accrual
    pub fn set_debt_accumulated_rate(&mut self, ctx: &mut CallContext, pool: CollateralPoolId, ray: U256) -> StablecoinResult<()> {
        self.update_uint(ctx, Role::BookKeeper, pool, "DebtAccumulatedRate", ray, |p| {
            &mut p.debt_accumulated_rate
        })
    }

    /// Stamped by the stability fee collector after each accrual
    pub fn update_last_accumulation_time(&mut self, ctx: &mut CallContext, pool: CollateralPoolId) -> StablecoinResult<()> {
        self.access_control.require_role(Role::StabilityFeeCollector, ctx.sender)?;
        let entry = self.pool_mut(pool)?;
        entry.last_accumulation_time = ctx.timestamp;
        Ok(())
    }

    fn guard(&self, role: Role, account: Address) -> StablecoinResult<()> {
        match role {
            Role::Owner => self.access_control.require_owner(account),
            role => self.access_control.require_role(role, account),
        }
    }

    fn update_uint(
        &mut self,
        ctx: &mut CallContext,
        role: Role,
        pool: CollateralPoolId,
        param: &str,
        value: U256,
        field: impl FnOnce(&mut CollateralPool) -> &mut U256,
    ) -> StablecoinResult<()> {
        self.guard(role, ctx.sender)?;
        *field(self.pool_mut(pool)?) = value;

        ctx.emit(StablecoinEvent::UintParameterSet {
            contract: CONTRACT.into(),
            pool: Some(pool),
            param: param.into(),
            value,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    fn update_bps(
        &mut self,
        ctx: &mut CallContext,
        pool: CollateralPoolId,
        param: &str,
        value: u64,
        field: impl FnOnce(&mut CollateralPool) -> &mut u64,
    ) -> StablecoinResult<()> {
        self.access_control.require_owner(ctx.sender)?;
        *field(self.pool_mut(pool)?) = value;

        ctx.emit(StablecoinEvent::UintParameterSet {
            contract: CONTRACT.into(),
            pool: Some(pool),
            param: param.into(),
            value: U256::from(value),
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    fn update_address(
        &mut self,
        ctx: &mut CallContext,
        pool: CollateralPoolId,
        param: &str,
        value: Address,
        field: impl FnOnce(&mut CollateralPool) -> &mut Address,
    ) -> StablecoinResult<()> {
        self.access_control.require_owner(ctx.sender)?;
        *field(self.pool_mut(pool)?) = value;

        ctx.emit(StablecoinEvent::AddressParameterSet {
            contract: CONTRACT.into(),
            pool: Some(pool),
            param: param.into(),
            value,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    // ============ Getters ============

    pub fn is_initialized(&self, pool: CollateralPoolId) -> bool {
        self.pools
            .get(&pool)
            .is_some_and(|p| !p.debt_accumulated_rate.is_zero())
    }

    pub fn pool(&self, pool: CollateralPoolId) -> Option<&CollateralPool> {
        self.pools.get(&pool)
    }

    fn pool_mut(&mut self, pool: CollateralPoolId) -> StablecoinResult<&mut CollateralPool> {
        self.pools
            .get_mut(&pool)
            .ok_or(StablecoinError::PoolNotInitialized { contract: CONTRACT })
    }

    /// Every configured pool id
    pub fn pool_ids(&self) -> Vec<CollateralPoolId> {
        self.pools.keys().copied().collect()
    }

    pub fn collateral_pool_info(&self, pool: CollateralPoolId) -> StablecoinResult<CollateralPoolInfo> {
        let p = self
            .pools
            .get(&pool)
            .ok_or(StablecoinError::PoolNotInitialized { contract: CONTRACT })?;
        Ok(CollateralPoolInfo {
            debt_accumulated_rate: p.debt_accumulated_rate,
            total_debt_share: p.total_debt_share,
            price_with_safety_margin: p.price_with_safety_margin,
            debt_ceiling: p.debt_ceiling,
            debt_floor: p.debt_floor,
        })
    }

    pub fn debt_accumulated_rate(&self, pool: CollateralPoolId) -> U256 {
        self.pools.get(&pool).map(|p| p.debt_accumulated_rate).unwrap_or_default()
    }

    pub fn stability_fee_rate(&self, pool: CollateralPoolId) -> U256 {
        self.pools.get(&pool).map(|p| p.stability_fee_rate).unwrap_or_default()
    }

    pub fn last_accumulation_time(&self, pool: CollateralPoolId) -> u64 {
        self.pools.get(&pool).map(|p| p.last_accumulation_time).unwrap_or_default()
    }

    pub fn liquidation_ratio(&self, pool: CollateralPoolId) -> U256 {
        self.pools.get(&pool).map(|p| p.liquidation_ratio).unwrap_or_default()
    }

    pub fn price_feed(&self, pool: CollateralPoolId) -> Address {
        self.pools.get(&pool).map(|p| p.price_feed).unwrap_or_default()
    }

    pub fn adapter(&self, pool: CollateralPoolId) -> Address {
        self.pools.get(&pool).map(|p| p.adapter).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stablecoin_common::{
        constants::precision::{RAD, WAD},
        events::EventType,
        types::pool_id,
    };

    fn owner() -> Address {
        Address::with_last_byte(1)
    }

    fn oracle() -> Address {
        Address::with_last_byte(2)
    }

    fn wbnb() -> CollateralPoolId {
        pool_id("WBNB").unwrap()
    }

    fn default_params() -> CollateralPoolParams {
        CollateralPoolParams {
            debt_ceiling: RAD * U256::from(10_000_000u64),
            debt_floor: RAD,
            price_feed: Address::with_last_byte(0x10),
            liquidation_ratio: RAY,
            stability_fee_rate: RAY,
            adapter: Address::with_last_byte(0x11),
            close_factor_bps: 5_000,
            liquidator_incentive_bps: 10_250,
            treasury_fees_bps: 5_000,
            strategy: Address::with_last_byte(0x12),
        }
    }

    fn setup() -> (CollateralPoolConfig, CallContext) {
        let config = CollateralPoolConfig::new(Address::with_last_byte(0xcc), AccessControlConfig::new(owner()));
        (config, CallContext::new(owner(), 1_000))
    }

    #[test]
    fn test_init_collateral_pool() {
        let (mut config, mut ctx) = setup();

        config.init_collateral_pool(&mut ctx, wbnb(), default_params()).unwrap();

        let pool = config.pool(wbnb()).unwrap();
        assert_eq!(pool.debt_accumulated_rate, RAY);
        assert_eq!(pool.last_accumulation_time, 1_000);
        assert!(config.is_initialized(wbnb()));
    }

    #[test]
    fn test_init_twice_reverts() {
        let (mut config, mut ctx) = setup();
        config.init_collateral_pool(&mut ctx, wbnb(), default_params()).unwrap();

        let result = config.init_collateral_pool(&mut ctx, wbnb(), default_params());
        assert_eq!(
            result.unwrap_err().to_string(),
            "CollateralPoolConfig/collateral-pool-already-init"
        );
    }

    #[test]
    fn test_init_validates_params() {
        let (mut config, mut ctx) = setup();

        let mut params = default_params();
        params.stability_fee_rate = RAY - U256::from(1u64);
        let result = config.init_collateral_pool(&mut ctx, wbnb(), params);
        assert!(matches!(result, Err(StablecoinError::InvalidStabilityFeeRate { .. })));

        let mut params = default_params();
        params.liquidator_incentive_bps = 19_001;
        let result = config.init_collateral_pool(&mut ctx, wbnb(), params);
        assert_eq!(
            result.unwrap_err().to_string(),
            "CollateralPoolConfig/invalid-liquidator-incentive-bps"
        );

        let mut params = default_params();
        params.close_factor_bps = 0;
        assert!(config.init_collateral_pool(&mut ctx, wbnb(), params).is_err());
        assert!(!config.is_initialized(wbnb()));
    }

    #[test]
    fn test_stability_fee_rate_bounds() {
        let (mut config, mut ctx) = setup();
        config.init_collateral_pool(&mut ctx, wbnb(), default_params()).unwrap();

        config
            .set_stability_fee_rate(&mut ctx, wbnb(), MAX_STABILITY_FEE_RATE)
            .unwrap();
        let result = config.set_stability_fee_rate(&mut ctx, wbnb(), MAX_STABILITY_FEE_RATE + U256::from(1u64));
        assert_eq!(
            result.unwrap_err().to_string(),
            "CollateralPoolConfig/invalid-stability-fee-rate"
        );
        assert_eq!(config.stability_fee_rate(wbnb()), MAX_STABILITY_FEE_RATE);
    }

    #[test]
    fn test_owner_setters() {
        let (mut config, mut ctx) = setup();
        config.init_collateral_pool(&mut ctx, wbnb(), default_params()).unwrap();

        config.set_debt_ceiling(&mut ctx, wbnb(), RAD * U256::from(5u64)).unwrap();
        config.set_debt_floor(&mut ctx, wbnb(), RAD * U256::from(2u64)).unwrap();
        config.set_price_feed(&mut ctx, wbnb(), oracle()).unwrap();
        config.set_treasury_fees_bps(&mut ctx, wbnb(), 9_000).unwrap();

        let info = config.collateral_pool_info(wbnb()).unwrap();
        assert_eq!(info.debt_ceiling, RAD * U256::from(5u64));
        assert_eq!(info.debt_floor, RAD * U256::from(2u64));
        assert_eq!(config.price_feed(wbnb()), oracle());
        assert_eq!(ctx.events.filter_by_type(EventType::AddressParameterSet).len(), 1);

        let mut stranger = CallContext::new(oracle(), 1_000);
        let result = config.set_debt_ceiling(&mut stranger, wbnb(), U256::ZERO);
        assert!(matches!(result, Err(StablecoinError::NotOwner)));
    }

    #[test]
    fn test_price_oracle_role_required() {
        let (mut config, mut ctx) = setup();
        config.init_collateral_pool(&mut ctx, wbnb(), default_params()).unwrap();

        let mut oracle_ctx = CallContext::new(oracle(), 1_000);
        let result = config.set_price_with_safety_margin(&mut oracle_ctx, wbnb(), RAY);
        assert_eq!(result.unwrap_err().to_string(), "!priceOracleRole");

        config
            .access_control_mut()
            .grant_role(&mut ctx, Role::PriceOracle.id(), oracle())
            .unwrap();
        config
            .set_price_with_safety_margin(&mut oracle_ctx, wbnb(), WAD)
            .unwrap();
        assert_eq!(config.collateral_pool_info(wbnb()).unwrap().price_with_safety_margin, WAD);
    }

    #[test]
    fn test_setter_on_unknown_pool() {
        let (mut config, mut ctx) = setup();
        let result = config.set_debt_ceiling(&mut ctx, wbnb(), RAD);
        assert_eq!(
            result.unwrap_err().to_string(),
            "CollateralPoolConfig/collateral-pool-not-init"
        );
    }
}
