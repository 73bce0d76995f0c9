//! BookKeeper - Central Ledger of the Stablecoin Protocol
//!
//! Tracks collateral balances, positions and internal stablecoin for every
//! collateral pool. Adapters move value in and out; the stability fee
//! collector and flash mint module write through role-gated entry points.
//!
//! ## Core Operations
//!
//! - **AddCollateral**: adapter credits or debits locked-up token balances
//! - **MoveCollateral / MoveStablecoin**: internal transfers
//! - **AdjustPosition**: lock collateral and draw or repay debt
//! - **MintUnbackedStablecoin / SettleSystemBadDebt**: system debt
//! - **AccrueStabilityFee**: grow a pool's debt accumulated rate
//!
//! ## Units
//!
//! Collateral and debt shares are wad, rates are ray, stablecoin is rad.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use stablecoin_common::{
    errors::{StablecoinError, StablecoinResult},
    events::StablecoinEvent,
    math,
    types::{Address, CallContext, CollateralPoolId, I256, U256},
    AccessControlConfig, Role,
};

pub mod pool_config;

pub use pool_config::{CollateralPool, CollateralPoolConfig, CollateralPoolInfo, CollateralPoolParams};

const CONTRACT: &str = "BookKeeper";

// ============ Ledger State ============

/// Collateral locked in one position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Locked collateral [wad]
    pub locked_collateral: U256,
    /// Normalized debt [wad]; debt value is `debt_share * rate`
    pub debt_share: U256,
}

/// Central ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookKeeper {
    pub address: Address,
    pool_config: CollateralPoolConfig,
    /// Unlocked collateral per pool and owner [wad]
    collateral_token: BTreeMap<(CollateralPoolId, Address), U256>,
    positions: BTreeMap<(CollateralPoolId, Address), Position>,
    /// Internal stablecoin [rad]
    stablecoin: BTreeMap<Address, U256>,
    /// Unbacked stablecoin minted against an address [rad]
    system_bad_debt: BTreeMap<Address, U256>,
    /// (owner, delegate) pairs
    position_whitelist: BTreeSet<(Address, Address)>,
    /// [rad]
    pub total_stablecoin_issued: U256,
    /// [rad]
    pub total_unbacked_stablecoin: U256,
    /// [rad]
    pub total_debt_ceiling: U256,
    pub paused: bool,
    pub live: bool,
}

impl BookKeeper {
    pub fn new(address: Address, pool_config: CollateralPoolConfig) -> Self {
        Self {
            address,
            pool_config,
            collateral_token: BTreeMap::new(),
            positions: BTreeMap::new(),
            stablecoin: BTreeMap::new(),
            system_bad_debt: BTreeMap::new(),
            position_whitelist: BTreeSet::new(),
            total_stablecoin_issued: U256::ZERO,
            total_unbacked_stablecoin: U256::ZERO,
            total_debt_ceiling: U256::ZERO,
            paused: false,
            live: true,
        }
    }

    pub fn access_control(&self) -> &AccessControlConfig {
        self.pool_config.access_control()
    }

    pub fn access_control_mut(&mut self) -> &mut AccessControlConfig {
        self.pool_config.access_control_mut()
    }

    pub fn pool_config(&self) -> &CollateralPoolConfig {
        &self.pool_config
    }

    pub fn pool_config_mut(&mut self) -> &mut CollateralPoolConfig {
        &mut self.pool_config
    }

    fn require_live(&self) -> StablecoinResult<()> {
        if !self.live {
            return Err(StablecoinError::NotLive { contract: CONTRACT });
        }
        Ok(())
    }

    fn require_not_paused(&self) -> StablecoinResult<()> {
        if self.paused {
            return Err(StablecoinError::Paused);
        }
        Ok(())
    }

    /// `usr` may act for `bit`
    fn wish(&self, bit: Address, usr: Address) -> bool {
        bit == usr || self.position_whitelist.contains(&(bit, usr))
    }

    // ============ Views ============

    pub fn collateral_token(&self, pool: CollateralPoolId, owner: Address) -> U256 {
        self.collateral_token.get(&(pool, owner)).copied().unwrap_or_default()
    }

    pub fn position(&self, pool: CollateralPoolId, owner: Address) -> Position {
        self.positions.get(&(pool, owner)).copied().unwrap_or_default()
    }

    pub fn stablecoin(&self, owner: Address) -> U256 {
        self.stablecoin.get(&owner).copied().unwrap_or_default()
    }

    pub fn system_bad_debt(&self, owner: Address) -> U256 {
        self.system_bad_debt.get(&owner).copied().unwrap_or_default()
    }

    pub fn is_whitelisted(&self, owner: Address, delegate: Address) -> bool {
        self.position_whitelist.contains(&(owner, delegate))
    }

    // ============ Permissions ============

    /// Allow `account` to act on the caller's positions and balances
    pub fn whitelist(&mut self, ctx: &mut CallContext, account: Address) -> StablecoinResult<()> {
        self.position_whitelist.insert((ctx.sender, account));
        ctx.emit(StablecoinEvent::Whitelisted {
            contract: CONTRACT.into(),
            owner: ctx.sender,
            account,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    pub fn blacklist(&mut self, ctx: &mut CallContext, account: Address) -> StablecoinResult<()> {
        self.position_whitelist.remove(&(ctx.sender, account));
        ctx.emit(StablecoinEvent::Blacklisted {
            contract: CONTRACT.into(),
            owner: ctx.sender,
            account,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    // ============ Administration ============

    pub fn set_total_debt_ceiling(&mut self, ctx: &mut CallContext, rad: U256) -> StablecoinResult<()> {
        self.access_control().require_owner(ctx.sender)?;
        self.require_live()?;

        self.total_debt_ceiling = rad;
        ctx.emit(StablecoinEvent::UintParameterSet {
            contract: CONTRACT.into(),
            pool: None,
            param: "TotalDebtCeiling".into(),
            value: rad,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    pub fn pause(&mut self, ctx: &mut CallContext) -> StablecoinResult<()> {
        self.access_control().require_owner_or_gov(ctx.sender)?;
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

    pub fn unpause(&mut self, ctx: &mut CallContext) -> StablecoinResult<()> {
        self.access_control().require_owner_or_gov(ctx.sender)?;
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

    /// Freeze the ledger during emergency shutdown
    pub fn cage(&mut self, ctx: &mut CallContext) -> StablecoinResult<()> {
        self.access_control().require_role(Role::ShowStopper, ctx.sender)?;
        if self.live {
            self.live = false;
            ctx.emit(StablecoinEvent::Cage {
                contract: CONTRACT.into(),
                timestamp: ctx.timestamp,
            });
        }
        Ok(())
    }

    // ============ Collateral ============

    /// Credit (or debit, for negative amounts) unlocked collateral
    pub fn add_collateral(
        &mut self,
        ctx: &mut CallContext,
        pool: CollateralPoolId,
        owner: Address,
        amount: I256,
    ) -> StablecoinResult<()> {
        self.access_control().require_role(Role::Adapter, ctx.sender)?;
        self.require_not_paused()?;

        let balance = math::add_signed(self.collateral_token(pool, owner), amount)?;
        self.collateral_token.insert((pool, owner), balance);

        ctx.emit(StablecoinEvent::CollateralAdjusted {
            pool,
            owner,
            amount: amount.unsigned_abs(),
            increase: !amount.is_negative(),
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    pub fn move_collateral(
        &mut self,
        ctx: &mut CallContext,
        pool: CollateralPoolId,
        src: Address,
        dst: Address,
        amount: U256,
    ) -> StablecoinResult<()> {
        self.require_not_paused()?;
        if !self.wish(src, ctx.sender) {
            return Err(StablecoinError::NotAllowed);
        }

        let src_balance = math::sub(self.collateral_token(pool, src), amount)?;
        if src != dst {
            let dst_balance = math::add(self.collateral_token(pool, dst), amount)?;
            self.collateral_token.insert((pool, src), src_balance);
            self.collateral_token.insert((pool, dst), dst_balance);
        }

        ctx.emit(StablecoinEvent::CollateralMoved {
            pool,
            src,
            dst,
            amount,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    // ============ Stablecoin ============

    pub fn move_stablecoin(
        &mut self,
        ctx: &mut CallContext,
        src: Address,
        dst: Address,
        rad: U256,
    ) -> StablecoinResult<()> {
        self.require_not_paused()?;
        if !self.wish(src, ctx.sender) {
            return Err(StablecoinError::NotAllowed);
        }

        let src_balance = math::sub(self.stablecoin(src), rad)?;
        if src != dst {
            let dst_balance = math::add(self.stablecoin(dst), rad)?;
            self.stablecoin.insert(src, src_balance);
            self.stablecoin.insert(dst, dst_balance);
        }

        ctx.emit(StablecoinEvent::StablecoinMoved {
            src,
            dst,
            rad,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    // ============ Positions ============

    /// Lock or free collateral and draw or repay debt on a position
    ///
    /// Collateral comes from `collateral_owner`, drawn stablecoin goes to
    /// `stablecoin_owner` (repayments come from it).
    #[allow(clippy::too_many_arguments)]
    pub fn adjust_position(
        &mut self,
        ctx: &mut CallContext,
        pool: CollateralPoolId,
        position_address: Address,
        collateral_owner: Address,
        stablecoin_owner: Address,
        collateral_value: I256,
        debt_share: I256,
    ) -> StablecoinResult<()> {
        // 1. Ledger must be live and not paused
        self.require_live()?;
        self.require_not_paused()?;

        // 2. Pool must exist
        if !self.pool_config.is_initialized(pool) {
            return Err(StablecoinError::PoolNotInitialized { contract: CONTRACT });
        }
        let info = self.pool_config.collateral_pool_info(pool)?;
        let rate = info.debt_accumulated_rate;

        // 3. Compute the new state
        let mut position = self.position(pool, position_address);
        position.locked_collateral = math::add_signed(position.locked_collateral, collateral_value)?;
        position.debt_share = math::add_signed(position.debt_share, debt_share)?;
        let total_debt_share = math::add_signed(info.total_debt_share, debt_share)?;

        let debt_value = math::mul_signed(rate, debt_share)?;
        let position_debt_value = math::mul(rate, position.debt_share)?;
        let total_stablecoin_issued = math::add_signed(self.total_stablecoin_issued, debt_value)?;

        // 4. Either debt decreased, or the ceilings hold
        if debt_share.is_positive()
            && (math::mul(total_debt_share, rate)? > info.debt_ceiling
                || total_stablecoin_issued > self.total_debt_ceiling)
        {
            return Err(StablecoinError::CeilingExceeded);
        }

        // 5. Either the position got less risky, or it is safe
        let less_risky = !debt_share.is_positive() && !collateral_value.is_negative();
        if !less_risky
            && position_debt_value > math::mul(position.locked_collateral, info.price_with_safety_margin)?
        {
            return Err(StablecoinError::NotSafe);
        }

        // 6. Consent of everyone whose balance gets worse
        if !less_risky && !self.wish(position_address, ctx.sender) {
            return Err(StablecoinError::NotAllowedPositionAddress);
        }
        if collateral_value.is_positive() && !self.wish(collateral_owner, ctx.sender) {
            return Err(StablecoinError::NotAllowedCollateralOwner);
        }
        if debt_share.is_negative() && !self.wish(stablecoin_owner, ctx.sender) {
            return Err(StablecoinError::NotAllowedStablecoinOwner);
        }

        // 7. No dust positions
        if !position.debt_share.is_zero() && position_debt_value < info.debt_floor {
            return Err(StablecoinError::DebtFloor {
                debt: position_debt_value,
                floor: info.debt_floor,
            });
        }

        let collateral_balance =
            math::sub_signed(self.collateral_token(pool, collateral_owner), collateral_value)?;
        let stablecoin_balance = math::add_signed(self.stablecoin(stablecoin_owner), debt_value)?;

        // 8. Commit
        let ledger = self.address;
        ctx.call_as(ledger, |ctx| {
            self.pool_config.set_total_debt_share(ctx, pool, total_debt_share)
        })?;
        self.total_stablecoin_issued = total_stablecoin_issued;
        self.collateral_token.insert((pool, collateral_owner), collateral_balance);
        self.stablecoin.insert(stablecoin_owner, stablecoin_balance);
        self.positions.insert((pool, position_address), position);

        ctx.emit(StablecoinEvent::PositionAdjusted {
            pool,
            position: position_address,
            locked_collateral: position.locked_collateral,
            debt_share: position.debt_share,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    // ============ System Debt ============

    /// Mint stablecoin to `to`, recording the same amount as bad debt of `from`
    pub fn mint_unbacked_stablecoin(
        &mut self,
        ctx: &mut CallContext,
        from: Address,
        to: Address,
        rad: U256,
    ) -> StablecoinResult<()> {
        self.access_control().require_role(Role::Mintable, ctx.sender)?;
        self.require_live()?;

        let bad_debt = math::add(self.system_bad_debt(from), rad)?;
        let balance = math::add(self.stablecoin(to), rad)?;
        let total_unbacked = math::add(self.total_unbacked_stablecoin, rad)?;
        let total_issued = math::add(self.total_stablecoin_issued, rad)?;

        self.system_bad_debt.insert(from, bad_debt);
        self.stablecoin.insert(to, balance);
        self.total_unbacked_stablecoin = total_unbacked;
        self.total_stablecoin_issued = total_issued;

        ctx.emit(StablecoinEvent::UnbackedStablecoinMinted {
            from,
            to,
            rad,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    /// Burn the caller's stablecoin against its own bad debt
    pub fn settle_system_bad_debt(&mut self, ctx: &mut CallContext, rad: U256) -> StablecoinResult<()> {
        let caller = ctx.sender;

        let bad_debt = math::sub(self.system_bad_debt(caller), rad)?;
        let balance = math::sub(self.stablecoin(caller), rad)?;
        let total_unbacked = math::sub(self.total_unbacked_stablecoin, rad)?;
        let total_issued = math::sub(self.total_stablecoin_issued, rad)?;

        self.system_bad_debt.insert(caller, bad_debt);
        self.stablecoin.insert(caller, balance);
        self.total_unbacked_stablecoin = total_unbacked;
        self.total_stablecoin_issued = total_issued;

        ctx.emit(StablecoinEvent::SystemBadDebtSettled {
            caller,
            rad,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    // ============ Stability Fee ============

    /// Grow the pool rate by `rate_delta` and credit the new debt to `to`
    pub fn accrue_stability_fee(
        &mut self,
        ctx: &mut CallContext,
        pool: CollateralPoolId,
        to: Address,
        rate_delta: I256,
    ) -> StablecoinResult<()> {
        self.access_control().require_role(Role::StabilityFeeCollector, ctx.sender)?;
        self.require_live()?;

        let info = self.pool_config.collateral_pool_info(pool)?;
        let new_rate = math::add_signed(info.debt_accumulated_rate, rate_delta)?;
        let value = math::mul_signed(info.total_debt_share, rate_delta)?;
        let balance = math::add_signed(self.stablecoin(to), value)?;
        let total_issued = math::add_signed(self.total_stablecoin_issued, value)?;

        let ledger = self.address;
        ctx.call_as(ledger, |ctx| {
            self.pool_config.set_debt_accumulated_rate(ctx, pool, new_rate)
        })?;
        self.stablecoin.insert(to, balance);
        self.total_stablecoin_issued = total_issued;
        Ok(())
    }
}
