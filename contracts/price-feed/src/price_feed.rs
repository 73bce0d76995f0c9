//! Price Feed Contract
//!
//! Per-collateral price source. A trusted operator (owner or
//! `PRICE_ORACLE_ROLE`) pushes wad prices quoted in BUSD; readers get the
//! price together with a validity flag.
//!
//! ## Freshness
//!
//! A price is valid while the feed is not paused and
//! `now < last_update + price_life`.

use serde::{Deserialize, Serialize};

use stablecoin_common::{
    constants::price_feed::{DEFAULT_PRICE_LIFE, MIN_PRICE_LIFE},
    errors::{StablecoinError, StablecoinResult},
    events::StablecoinEvent,
    types::{Address, CallContext, U256},
    AccessControlConfig, Role,
};

const CONTRACT: &str = "PriceFeed";

// ============ Feed State ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFeed {
    pub address: Address,
    /// Symbol of the priced collateral token
    pub token_symbol: String,
    /// Quote token
    pub busd: Address,
    /// Latest price [wad]
    pub price: U256,
    pub last_update: u64,
    /// Seconds a price stays valid
    pub price_life: u64,
    pub paused: bool,
}

impl PriceFeed {
    pub fn new(address: Address, token_symbol: &str) -> Self {
        Self {
            address,
            token_symbol: token_symbol.to_string(),
            busd: Address::ZERO,
            price: U256::ZERO,
            last_update: 0,
            price_life: DEFAULT_PRICE_LIFE,
            paused: false,
        }
    }

    // ============ Owner Setters ============

    pub fn set_token_symbol(&mut self, ctx: &mut CallContext, acl: &AccessControlConfig, symbol: &str) -> StablecoinResult<()> {
        acl.require_owner(ctx.sender)?;
        if symbol.is_empty() {
            return Err(StablecoinError::InvalidInput {
                contract: CONTRACT,
                reason: "empty-token-symbol",
            });
        }

        self.token_symbol = symbol.to_string();
        ctx.emit(StablecoinEvent::StringParameterSet {
            contract: CONTRACT.into(),
            param: "TokenSymbol".into(),
            value: self.token_symbol.clone(),
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    pub fn set_busd_address(&mut self, ctx: &mut CallContext, acl: &AccessControlConfig, busd: Address) -> StablecoinResult<()> {
        acl.require_owner(ctx.sender)?;
        if busd.is_zero() {
            return Err(StablecoinError::ZeroAddress { contract: CONTRACT, param: "busd" });
        }

        self.busd = busd;
        ctx.emit(StablecoinEvent::AddressParameterSet {
            contract: CONTRACT.into(),
            pool: None,
            param: "BUSDAddress".into(),
            value: busd,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    pub fn set_price_life(&mut self, ctx: &mut CallContext, acl: &AccessControlConfig, seconds: u64) -> StablecoinResult<()> {
        acl.require_owner(ctx.sender)?;
        if seconds < MIN_PRICE_LIFE {
            return Err(StablecoinError::InvalidInput {
                contract: CONTRACT,
                reason: "bad-price-life",
            });
        }

        self.price_life = seconds;
        ctx.emit(StablecoinEvent::UintParameterSet {
            contract: CONTRACT.into(),
            pool: None,
            param: "PriceLife".into(),
            value: U256::from(seconds),
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    // ============ Operator ============

    /// Push a new price (owner or price oracle role)
    pub fn set_price(&mut self, ctx: &mut CallContext, acl: &AccessControlConfig, price: U256) -> StablecoinResult<()> {
        // 1. Caller must be trusted
        if !acl.has(Role::Owner, ctx.sender) {
            acl.require_role(Role::PriceOracle, ctx.sender)?;
        }

        // 2. Zero would read as a valid price of nothing
        if price.is_zero() {
            return Err(StablecoinError::InvalidInput {
                contract: CONTRACT,
                reason: "zero-price",
            });
        }

        self.price = price;
        self.last_update = ctx.timestamp;
        ctx.emit(StablecoinEvent::PriceUpdated {
            feed: self.address,
            price,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    pub fn pause(&mut self, ctx: &mut CallContext, acl: &AccessControlConfig) -> StablecoinResult<()> {
        acl.require_owner_or_gov(ctx.sender)?;
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

    pub fn unpause(&mut self, ctx: &mut CallContext, acl: &AccessControlConfig) -> StablecoinResult<()> {
        acl.require_owner_or_gov(ctx.sender)?;
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

    // ============ Readers ============

    /// Raw latest price, valid or not
    pub fn read_price(&self) -> U256 {
        self.price
    }

    /// Latest price and whether it may be used at `now`
    pub fn peek_price(&self, now: u64) -> (U256, bool) {
        (self.price, self.is_price_ok(now))
    }

    pub fn is_price_ok(&self, now: u64) -> bool {
        !self.paused && now < self.last_update.saturating_add(self.price_life)
    }
}
