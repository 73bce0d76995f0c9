//! Price Oracle (spotter)
//!
//! Reads a pool's price feed and writes the price with safety margin into
//! the pool config:
//!
//! `price_with_safety_margin = price [wad->ray] / reference_price / liquidation_ratio`
//!
//! An invalid feed price writes zero, which blocks new debt in the pool.

use serde::{Deserialize, Serialize};

use stablecoin_book_keeper::BookKeeper;
use stablecoin_common::{
    constants::precision::RAY,
    errors::{StablecoinError, StablecoinResult},
    events::StablecoinEvent,
    math,
    types::{Address, CallContext, CollateralPoolId, U256},
};

use crate::price_feed::PriceFeed;

const CONTRACT: &str = "PriceOracle";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceOracle {
    pub address: Address,
    /// Stablecoin target price in the quote currency [ray]
    pub stablecoin_reference_price: U256,
}

impl PriceOracle {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            stablecoin_reference_price: RAY,
        }
    }

    pub fn set_stablecoin_reference_price(
        &mut self,
        ctx: &mut CallContext,
        book_keeper: &BookKeeper,
        ray: U256,
    ) -> StablecoinResult<()> {
        book_keeper.access_control().require_owner(ctx.sender)?;
        if ray.is_zero() {
            return Err(StablecoinError::InvalidInput {
                contract: CONTRACT,
                reason: "zero-reference-price",
            });
        }

        self.stablecoin_reference_price = ray;
        ctx.emit(StablecoinEvent::UintParameterSet {
            contract: CONTRACT.into(),
            pool: None,
            param: "StableCoinReferencePrice".into(),
            value: ray,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    /// Price with safety margin `pool` would get from `feed` right now
    pub fn price_with_safety_margin(
        &self,
        book_keeper: &BookKeeper,
        feed: &PriceFeed,
        pool: CollateralPoolId,
        now: u64,
    ) -> StablecoinResult<U256> {
        let config = book_keeper.pool_config();
        if !config.is_initialized(pool) {
            return Err(StablecoinError::PoolNotInitialized { contract: CONTRACT });
        }
        if config.price_feed(pool) != feed.address {
            return Err(StablecoinError::InvalidInput {
                contract: CONTRACT,
                reason: "wrong-price-feed",
            });
        }

        let (price, ok) = feed.peek_price(now);
        if !ok {
            return Ok(U256::ZERO);
        }
        let quoted = math::rdiv(math::wad_to_ray(price)?, self.stablecoin_reference_price)?;
        math::rdiv(quoted, config.liquidation_ratio(pool))
    }

    /// Refresh a pool's price with safety margin; returns the value written
    pub fn set_price(
        &self,
        ctx: &mut CallContext,
        book_keeper: &mut BookKeeper,
        feed: &PriceFeed,
        pool: CollateralPoolId,
    ) -> StablecoinResult<U256> {
        let margin = self.price_with_safety_margin(book_keeper, feed, pool, ctx.timestamp)?;

        ctx.call_as(self.address, |ctx| {
            book_keeper
                .pool_config_mut()
                .set_price_with_safety_margin(ctx, pool, margin)
        })?;

        ctx.emit(StablecoinEvent::PoolPriceUpdated {
            pool,
            price: feed.read_price(),
            price_with_safety_margin: margin,
            timestamp: ctx.timestamp,
        });
        Ok(margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stablecoin_book_keeper::{CollateralPoolConfig, CollateralPoolParams};
    use stablecoin_common::{
        constants::precision::{RAD, WAD},
        types::pool_id,
        AccessControlConfig, Role,
    };

    fn owner() -> Address {
        Address::with_last_byte(1)
    }

    fn wbnb() -> CollateralPoolId {
        pool_id("WBNB").unwrap()
    }

    fn setup() -> (BookKeeper, PriceFeed, PriceOracle, CallContext) {
        let mut ctx = CallContext::new(owner(), 1_000);
        let feed = PriceFeed::new(Address::with_last_byte(0xfe), "WBNB");
        let oracle = PriceOracle::new(Address::with_last_byte(0x0c));

        let config = CollateralPoolConfig::new(Address::with_last_byte(0xcc), AccessControlConfig::new(owner()));
        let mut bk = BookKeeper::new(Address::with_last_byte(0xbb), config);
        bk.access_control_mut()
            .grant_role(&mut ctx, Role::PriceOracle.id(), oracle.address)
            .unwrap();
        bk.pool_config_mut()
            .init_collateral_pool(
                &mut ctx,
                wbnb(),
                CollateralPoolParams {
                    debt_ceiling: RAD * U256::from(1_000u64),
                    debt_floor: U256::ZERO,
                    price_feed: feed.address,
                    // 150%
                    liquidation_ratio: RAY * U256::from(3u64) / U256::from(2u64),
                    stability_fee_rate: RAY,
                    adapter: Address::with_last_byte(0xad),
                    close_factor_bps: 5_000,
                    liquidator_incentive_bps: 10_500,
                    treasury_fees_bps: 5_000,
                    strategy: Address::with_last_byte(0x12),
                },
            )
            .unwrap();
        (bk, feed, oracle, ctx)
    }

    #[test]
    fn test_set_price_applies_safety_margin() {
        let (mut bk, mut feed, oracle, mut ctx) = setup();
        feed.set_price(&mut ctx, bk.access_control(), WAD * U256::from(300u64)).unwrap();

        let margin = oracle.set_price(&mut ctx, &mut bk, &feed, wbnb()).unwrap();

        // 300 / 1.0 / 1.5 = 200
        assert_eq!(margin, RAY * U256::from(200u64));
        assert_eq!(
            bk.pool_config().collateral_pool_info(wbnb()).unwrap().price_with_safety_margin,
            margin
        );
    }

    #[test]
    fn test_reference_price_scales_margin() {
        let (mut bk, mut feed, mut oracle, mut ctx) = setup();
        feed.set_price(&mut ctx, bk.access_control(), WAD * U256::from(300u64)).unwrap();
        oracle
            .set_stablecoin_reference_price(&mut ctx, &bk, RAY * U256::from(2u64))
            .unwrap();

        let margin = oracle.set_price(&mut ctx, &mut bk, &feed, wbnb()).unwrap();
        assert_eq!(margin, RAY * U256::from(100u64));
    }

    #[test]
    fn test_stale_price_writes_zero() {
        let (mut bk, mut feed, oracle, mut ctx) = setup();
        feed.set_price(&mut ctx, bk.access_control(), WAD * U256::from(300u64)).unwrap();
        ctx.advance(feed.price_life);

        let margin = oracle.set_price(&mut ctx, &mut bk, &feed, wbnb()).unwrap();
        assert_eq!(margin, U256::ZERO);
    }

    #[test]
    fn test_wrong_feed_rejected() {
        let (mut bk, _, oracle, mut ctx) = setup();
        let other = PriceFeed::new(Address::with_last_byte(0xef), "CAKE");

        let result = oracle.set_price(&mut ctx, &mut bk, &other, wbnb());
        assert!(matches!(result, Err(StablecoinError::InvalidInput { reason: "wrong-price-feed", .. })));
    }

    #[test]
    fn test_oracle_needs_role() {
        let (mut bk, mut feed, oracle, mut ctx) = setup();
        feed.set_price(&mut ctx, bk.access_control(), WAD).unwrap();
        let oracle_address = oracle.address;
        bk.access_control_mut()
            .revoke_role(&mut ctx, Role::PriceOracle.id(), oracle_address)
            .unwrap();

        let result = oracle.set_price(&mut ctx, &mut bk, &feed, wbnb());
        assert_eq!(result.unwrap_err().to_string(), "!priceOracleRole");
    }
}
