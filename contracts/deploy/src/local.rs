//! Local Deployment
//!
//! Every protocol contract held in memory at deterministic addresses, wired
//! the way a fresh deployment is before any setter script has run: core
//! roles granted and pools initialised, with oracle access, feed metadata,
//! adapter vaults and flash lending left to [`crate::default_scripts`].

use std::collections::BTreeMap;

use alloy_primitives::keccak256;

use stablecoin_adapters::{CollateralTokenAdapter, StablecoinAdapter};
use stablecoin_book_keeper::{BookKeeper, CollateralPoolConfig, CollateralPoolParams};
use stablecoin_common::{
    constants::{
        limits::DEFAULT_DEBT_FLOOR,
        precision::{RAD, RAY, WAD},
    },
    errors::{StablecoinError, StablecoinResult},
    math,
    types::{pool_id, Address, CallContext, CollateralPoolId, I256, U256},
    AccessControlConfig, Role,
};
use stablecoin_flash_mint::{FlashBorrower, FlashMintDeps, FlashMintModule};
use stablecoin_price_decrease::DecreaseCurve;
use stablecoin_price_feed::{PriceFeed, PriceOracle};
use stablecoin_stability_fee_collector::StabilityFeeCollector;
use stablecoin_token::Erc20Token;

use crate::network::{ContractAddresses, ContractName};
use crate::script::ProtocolAdmin;

/// Flash mint ceiling set at deployment [wad]
const FLASH_MINT_MAX_UNITS: u64 = 1_000_000;

/// Deterministic address of a named contract
pub fn contract_address(label: &str) -> Address {
    Address::from_word(keccak256(label))
}

// ============ Collateral Setup ============

/// One collateral pool to deploy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollateralSetup {
    pub symbol: String,
    /// [rad]
    pub debt_ceiling: U256,
    /// [rad]
    pub debt_floor: U256,
    /// [ray]
    pub liquidation_ratio: U256,
    /// Per-second fee [ray]
    pub stability_fee_rate: U256,
    /// Auction price curve of the pool's liquidation strategy
    pub auction_curve: DecreaseCurve,
}

impl CollateralSetup {
    /// 1M ceiling, network default floor, 150% ratio, no fee, one hour linear auctions
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.into(),
            debt_ceiling: RAD * U256::from(1_000_000u64),
            debt_floor: DEFAULT_DEBT_FLOOR,
            liquidation_ratio: RAY * U256::from(3u64) / U256::from(2u64),
            stability_fee_rate: RAY,
            auction_curve: DecreaseCurve::Linear { tau: 3_600 },
        }
    }

    pub fn with_stability_fee_rate(mut self, ray: U256) -> Self {
        self.stability_fee_rate = ray;
        self
    }

    pub fn with_auction_curve(mut self, curve: DecreaseCurve) -> Self {
        self.auction_curve = curve;
        self
    }
}

/// Contracts of one collateral
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCollateral {
    pub pool: CollateralPoolId,
    pub token: Erc20Token,
    pub adapter: CollateralTokenAdapter,
    pub price_feed: PriceFeed,
    /// Liquidation strategy address recorded in the pool
    pub strategy: Address,
    pub auction_curve: DecreaseCurve,
}

// ============ Protocol ============

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalProtocol {
    pub deployer: Address,
    pub access_control_address: Address,
    pub book_keeper: BookKeeper,
    pub stablecoin: Erc20Token,
    pub stablecoin_adapter: StablecoinAdapter,
    pub price_oracle: PriceOracle,
    pub stability_fee_collector: StabilityFeeCollector,
    pub flash_mint: FlashMintModule,
    pub system_debt_engine: Address,
    pub busd: Erc20Token,
    pub collaterals: BTreeMap<String, LocalCollateral>,
}

impl LocalProtocol {
    /// Deploy as `ctx.sender`
    ///
    /// The deployer keeps `OWNER_ROLE` and may mint the local collateral
    /// tokens.
    pub fn deploy(ctx: &mut CallContext, collaterals: &[CollateralSetup]) -> StablecoinResult<Self> {
        let deployer = ctx.sender;

        // 1. Core contracts
        let access_control = AccessControlConfig::new(deployer);
        let pool_config = CollateralPoolConfig::new(contract_address("CollateralPoolConfig"), access_control);
        let mut book_keeper = BookKeeper::new(contract_address("BookKeeper"), pool_config);
        let mut stablecoin = Erc20Token::stablecoin(contract_address("Stablecoin"));
        let stablecoin_adapter = StablecoinAdapter::new(contract_address("StablecoinAdapter"), stablecoin.address);
        let system_debt_engine = contract_address("SystemDebtEngine");
        let price_oracle = PriceOracle::new(contract_address("PriceOracle"));
        let stability_fee_collector =
            StabilityFeeCollector::new(contract_address("StabilityFeeCollector"), system_debt_engine);
        let busd = Erc20Token::new(contract_address("BUSD"), "Binance USD", "BUSD", 18);
        let flash_mint_address = contract_address("FlashMintModule");

        // 2. Module roles
        for (role, account) in [
            (Role::BookKeeper, book_keeper.address),
            (Role::Adapter, stablecoin_adapter.address),
            (Role::Mintable, stablecoin_adapter.address),
            (Role::Mintable, flash_mint_address),
            (Role::StabilityFeeCollector, stability_fee_collector.address),
            (Role::Mintable, deployer),
        ] {
            book_keeper.access_control_mut().grant_role(ctx, role.id(), account)?;
        }

        // 3. Collateral pools
        let mut total_debt_ceiling = U256::ZERO;
        let mut deployed = BTreeMap::new();
        for setup in collaterals {
            let symbol = setup.symbol.as_str();
            let pool = pool_id(symbol)?;
            let token = Erc20Token::new(contract_address(&format!("{symbol}/Token")), symbol, symbol, 18);
            let adapter = CollateralTokenAdapter::new(
                contract_address(&format!("{symbol}/CollateralTokenAdapter")),
                pool,
                token.address,
            );
            let price_feed = PriceFeed::new(contract_address(&format!("{symbol}/PriceFeed")), "");
            let strategy = contract_address(&format!("{symbol}/LiquidationStrategy"));
            // reject bad curves before anything points at them
            setup.auction_curve.build(strategy)?;

            book_keeper.access_control_mut().grant_role(ctx, Role::Adapter.id(), adapter.address)?;
            book_keeper.pool_config_mut().init_collateral_pool(
                ctx,
                pool,
                CollateralPoolParams {
                    debt_ceiling: setup.debt_ceiling,
                    debt_floor: setup.debt_floor,
                    price_feed: price_feed.address,
                    liquidation_ratio: setup.liquidation_ratio,
                    stability_fee_rate: setup.stability_fee_rate,
                    adapter: adapter.address,
                    close_factor_bps: 5_000,
                    liquidator_incentive_bps: 10_500,
                    treasury_fees_bps: 5_000,
                    strategy,
                },
            )?;
            total_debt_ceiling = math::add(total_debt_ceiling, setup.debt_ceiling)?;

            let collateral = LocalCollateral {
                pool,
                token,
                adapter,
                price_feed,
                strategy,
                auction_curve: setup.auction_curve,
            };
            deployed.insert(setup.symbol.clone(), collateral);
        }
        book_keeper.set_total_debt_ceiling(ctx, total_debt_ceiling)?;

        // 4. Flash mint module
        let mut deps = FlashMintDeps {
            book_keeper: &mut book_keeper,
            stablecoin: &mut stablecoin,
            stablecoin_adapter: &stablecoin_adapter,
        };
        let mut flash_mint = FlashMintModule::new(ctx, flash_mint_address, &mut deps, system_debt_engine)?;
        flash_mint.set_max(ctx, &book_keeper, WAD * U256::from(FLASH_MINT_MAX_UNITS))?;

        Ok(Self {
            deployer,
            access_control_address: contract_address("AccessControlConfig"),
            book_keeper,
            stablecoin,
            stablecoin_adapter,
            price_oracle,
            stability_fee_collector,
            flash_mint,
            system_debt_engine,
            busd,
            collaterals: deployed,
        })
    }

    /// Address table of this deployment
    pub fn addresses(&self) -> ContractAddresses {
        let mut addresses = ContractAddresses {
            access_control_config: self.access_control_address,
            collateral_pool_config: self.book_keeper.pool_config().address,
            book_keeper: self.book_keeper.address,
            stablecoin: self.stablecoin.address,
            stablecoin_adapter: self.stablecoin_adapter.address,
            price_oracle: self.price_oracle.address,
            stability_fee_collector: self.stability_fee_collector.address,
            flash_mint_module: self.flash_mint.address,
            system_debt_engine: self.system_debt_engine,
            busd: self.busd.address,
            ..Default::default()
        };
        for (symbol, collateral) in &self.collaterals {
            addresses.price_feeds.insert(symbol.clone(), collateral.price_feed.address);
            addresses.collateral_token_adapters.insert(symbol.clone(), collateral.adapter.address);
            addresses.collateral_tokens.insert(symbol.clone(), collateral.token.address);
        }
        addresses
    }

    pub fn collateral(&self, symbol: &str) -> StablecoinResult<&LocalCollateral> {
        self.collaterals.get(symbol).ok_or_else(|| unknown_symbol(symbol))
    }

    /// Run `f` as one transaction: on `Err` every contract and the event
    /// log are put back as they were
    pub fn transact<T>(
        &mut self,
        ctx: &mut CallContext,
        f: impl FnOnce(&mut Self, &mut CallContext) -> StablecoinResult<T>,
    ) -> StablecoinResult<T> {
        let (saved, checkpoint) = (self.clone(), ctx.checkpoint());
        let result = f(self, ctx);
        if result.is_err() {
            *self = saved;
            ctx.revert_to(checkpoint);
        }
        result
    }

    // ============ Flows ============

    /// Mint collateral tokens to `to` (deployer)
    pub fn fund(&mut self, ctx: &mut CallContext, symbol: &str, to: Address, wad: U256) -> StablecoinResult<()> {
        let token = &mut self.collaterals.get_mut(symbol).ok_or_else(|| unknown_symbol(symbol))?.token;
        token.mint(ctx, self.book_keeper.access_control(), to, wad)
    }

    /// Push a feed price and refresh the pool's price with safety margin
    pub fn update_price(&mut self, ctx: &mut CallContext, symbol: &str, wad: U256) -> StablecoinResult<U256> {
        self.transact(ctx, |protocol, ctx| {
            let LocalProtocol { book_keeper, price_oracle, collaterals, .. } = protocol;
            let collateral = collaterals.get_mut(symbol).ok_or_else(|| unknown_symbol(symbol))?;

            collateral.price_feed.set_price(ctx, book_keeper.access_control(), wad)?;
            price_oracle.set_price(ctx, book_keeper, &collateral.price_feed, collateral.pool)
        })
    }

    /// Lock `collateral` and draw `debt` stablecoin as `ctx.sender`
    ///
    /// The caller must hold the tokens and be whitelisted on the adapter.
    /// Drawn stablecoin arrives as ERC-20.
    pub fn open_position(
        &mut self,
        ctx: &mut CallContext,
        symbol: &str,
        collateral: U256,
        debt: U256,
    ) -> StablecoinResult<()> {
        self.transact(ctx, |protocol, ctx| {
            let user = ctx.sender;
            let LocalProtocol {
                book_keeper,
                stablecoin,
                stablecoin_adapter,
                collaterals,
                ..
            } = protocol;
            let LocalCollateral { pool, token, adapter, .. } =
                collaterals.get_mut(symbol).ok_or_else(|| unknown_symbol(symbol))?;

            // 1. Collateral into the ledger
            token.approve(ctx, adapter.address, collateral)?;
            adapter.deposit(ctx, book_keeper, token, user, collateral)?;

            // 2. Lock it and draw debt shares worth `debt`
            let rate = book_keeper.pool_config().debt_accumulated_rate(*pool);
            let debt_share = math::rdiv(debt, rate)?;
            let debt_share = if math::rmul(debt_share, rate)? < debt {
                math::add(debt_share, U256::from(1u64))?
            } else {
                debt_share
            };
            book_keeper.adjust_position(
                ctx,
                *pool,
                user,
                user,
                user,
                math::to_signed(collateral)?,
                math::to_signed(debt_share)?,
            )?;

            // 3. Ledger stablecoin out as ERC-20
            book_keeper.whitelist(ctx, stablecoin_adapter.address)?;
            stablecoin_adapter.withdraw(ctx, book_keeper, stablecoin, user, debt)
        })
    }

    /// Repay all debt of the caller's position using its ERC-20 stablecoin
    pub fn close_position(&mut self, ctx: &mut CallContext, symbol: &str) -> StablecoinResult<()> {
        self.transact(ctx, |protocol, ctx| {
            let user = ctx.sender;
            let LocalProtocol {
                book_keeper,
                stablecoin,
                stablecoin_adapter,
                collaterals,
                ..
            } = protocol;
            let pool = collaterals.get(symbol).ok_or_else(|| unknown_symbol(symbol))?.pool;

            let position = book_keeper.position(pool, user);
            let rate = book_keeper.pool_config().debt_accumulated_rate(pool);
            let owed = math::mul(position.debt_share, rate)?;
            // round the ERC-20 amount up to cover the rad debt
            let wad = math::add(owed / RAY, U256::from(u64::from(!(owed % RAY).is_zero())))?;

            stablecoin.approve(ctx, stablecoin_adapter.address, wad)?;
            stablecoin_adapter.deposit(ctx, book_keeper, stablecoin, user, wad)?;
            book_keeper.adjust_position(
                ctx,
                pool,
                user,
                user,
                user,
                I256::ZERO,
                -math::to_signed(position.debt_share)?,
            )
        })
    }

    /// Accrue the stability fee of a pool up to now
    pub fn collect_stability_fee(&mut self, ctx: &mut CallContext, symbol: &str) -> StablecoinResult<U256> {
        let pool = self.collateral(symbol)?.pool;
        self.stability_fee_collector.collect(ctx, &mut self.book_keeper, pool)
    }

    /// ERC-3156 flash loan of the stablecoin
    pub fn flash_loan(
        &mut self,
        ctx: &mut CallContext,
        receiver: &mut dyn FlashBorrower,
        amount: U256,
        data: &[u8],
    ) -> StablecoinResult<()> {
        let token = self.stablecoin.address;
        let mut deps = FlashMintDeps {
            book_keeper: &mut self.book_keeper,
            stablecoin: &mut self.stablecoin,
            stablecoin_adapter: &self.stablecoin_adapter,
        };
        self.flash_mint.flash_loan(ctx, &mut deps, receiver, token, amount, data)
    }

    /// Current auction price of a pool's liquidation strategy
    pub fn auction_price(&self, symbol: &str, top: U256, dur: u64) -> StablecoinResult<U256> {
        let collateral = self.collateral(symbol)?;
        collateral.auction_curve.build(collateral.strategy)?.price(top, dur)
    }
}

// ============ Lookup ============

fn unknown_symbol(symbol: &str) -> StablecoinError {
    StablecoinError::UnknownContract {
        name: ContractName::CollateralToken(symbol.into()).to_string(),
    }
}

fn price_feed_mut(collaterals: &mut BTreeMap<String, LocalCollateral>, address: Address) -> StablecoinResult<&mut PriceFeed> {
    collaterals
        .values_mut()
        .map(|c| &mut c.price_feed)
        .find(|feed| feed.address == address)
        .ok_or_else(|| StablecoinError::UnknownContract { name: address.to_string() })
}

fn adapter_mut(
    collaterals: &mut BTreeMap<String, LocalCollateral>,
    address: Address,
) -> StablecoinResult<&mut CollateralTokenAdapter> {
    collaterals
        .values_mut()
        .map(|c| &mut c.adapter)
        .find(|adapter| adapter.address == address)
        .ok_or_else(|| StablecoinError::UnknownContract { name: address.to_string() })
}

// ============ Setter Dispatch ============

impl ProtocolAdmin for LocalProtocol {
    fn grant_role(&mut self, ctx: &mut CallContext, access_control: Address, role: Role, account: Address) -> StablecoinResult<()> {
        if access_control != self.access_control_address {
            return Err(StablecoinError::UnknownContract {
                name: access_control.to_string(),
            });
        }
        self.book_keeper.access_control_mut().grant_role(ctx, role.id(), account)
    }

    fn set_token_symbol(&mut self, ctx: &mut CallContext, price_feed: Address, symbol: &str) -> StablecoinResult<()> {
        price_feed_mut(&mut self.collaterals, price_feed)?.set_token_symbol(ctx, self.book_keeper.access_control(), symbol)
    }

    fn set_vault(&mut self, ctx: &mut CallContext, adapter: Address, vault: Address) -> StablecoinResult<()> {
        adapter_mut(&mut self.collaterals, adapter)?.set_vault(ctx, &self.book_keeper, vault)
    }

    fn whitelist(&mut self, ctx: &mut CallContext, target: Address, account: Address) -> StablecoinResult<()> {
        if target == self.book_keeper.address {
            return self.book_keeper.whitelist(ctx, account);
        }
        adapter_mut(&mut self.collaterals, target)?.whitelist(ctx, &self.book_keeper, account)
    }

    fn set_flash_lending_enabled(&mut self, ctx: &mut CallContext, flash_mint: Address, enabled: bool) -> StablecoinResult<()> {
        if flash_mint != self.flash_mint.address {
            return Err(StablecoinError::UnknownContract {
                name: flash_mint.to_string(),
            });
        }
        self.flash_mint.set_flash_lending_enabled(ctx, &self.book_keeper, enabled)
    }

    fn set_busd_address(&mut self, ctx: &mut CallContext, price_feed: Address, busd: Address) -> StablecoinResult<()> {
        price_feed_mut(&mut self.collaterals, price_feed)?.set_busd_address(ctx, self.book_keeper.access_control(), busd)
    }
}
