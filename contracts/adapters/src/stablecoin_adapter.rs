//! Stablecoin Adapter
//!
//! Converts between the ERC-20 stablecoin (wad) and ledger stablecoin (rad).

use serde::{Deserialize, Serialize};

use stablecoin_book_keeper::BookKeeper;
use stablecoin_common::{
    errors::{StablecoinError, StablecoinResult},
    events::StablecoinEvent,
    math,
    types::{Address, CallContext, U256},
};
use stablecoin_token::Erc20Token;

const CONTRACT: &str = "StablecoinAdapter";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StablecoinAdapter {
    pub address: Address,
    /// ERC-20 stablecoin this adapter mints and burns
    pub stablecoin: Address,
    pub live: bool,
}

impl StablecoinAdapter {
    pub fn new(address: Address, stablecoin: Address) -> Self {
        Self {
            address,
            stablecoin,
            live: true,
        }
    }

    fn require_live(&self) -> StablecoinResult<()> {
        if !self.live {
            return Err(StablecoinError::NotLive { contract: CONTRACT });
        }
        Ok(())
    }

    fn require_token(&self, token: &Erc20Token) -> StablecoinResult<()> {
        if token.address != self.stablecoin {
            return Err(StablecoinError::InvalidInput {
                contract: CONTRACT,
                reason: "wrong-token",
            });
        }
        Ok(())
    }

    /// Burn the caller's ERC-20 and credit `wad * RAY` ledger stablecoin to `usr`
    pub fn deposit(
        &self,
        ctx: &mut CallContext,
        book_keeper: &mut BookKeeper,
        token: &mut Erc20Token,
        usr: Address,
        wad: U256,
    ) -> StablecoinResult<()> {
        self.require_live()?;
        self.require_token(token)?;

        let rad = math::wad_to_rad(wad)?;
        let depositor = ctx.sender;
        let adapter = self.address;
        token.check_spend(depositor, adapter, wad)?;

        ctx.call_as(adapter, |ctx| book_keeper.move_stablecoin(ctx, adapter, usr, rad))?;
        ctx.call_as(adapter, |ctx| token.burn(ctx, depositor, wad))
    }

    /// Debit the caller's ledger stablecoin and mint ERC-20 to `usr`
    ///
    /// The caller must have whitelisted the adapter on the ledger.
    pub fn withdraw(
        &self,
        ctx: &mut CallContext,
        book_keeper: &mut BookKeeper,
        token: &mut Erc20Token,
        usr: Address,
        wad: U256,
    ) -> StablecoinResult<()> {
        self.require_live()?;
        self.require_token(token)?;

        let rad = math::wad_to_rad(wad)?;
        let holder = ctx.sender;
        let adapter = self.address;
        token.check_mint(book_keeper.access_control(), adapter, usr, wad)?;

        ctx.call_as(adapter, |ctx| book_keeper.move_stablecoin(ctx, holder, adapter, rad))?;
        let acl = book_keeper.access_control();
        ctx.call_as(adapter, |ctx| token.mint(ctx, acl, usr, wad))
    }

    /// Disable deposits and withdrawals (owner)
    pub fn cage(&mut self, ctx: &mut CallContext, book_keeper: &BookKeeper) -> StablecoinResult<()> {
        book_keeper.access_control().require_owner(ctx.sender)?;
        if self.live {
            self.live = false;
            ctx.emit(StablecoinEvent::Cage {
                contract: CONTRACT.into(),
                timestamp: ctx.timestamp,
            });
        }
        Ok(())
    }
}
