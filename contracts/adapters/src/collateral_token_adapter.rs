//! Collateral Token Adapter
//!
//! Custodies one collateral token in a vault and mirrors deposits as
//! unlocked ledger collateral of the pool.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use stablecoin_book_keeper::BookKeeper;
use stablecoin_common::{
    errors::{StablecoinError, StablecoinResult},
    events::StablecoinEvent,
    math,
    types::{Address, CallContext, CollateralPoolId, U256},
};
use stablecoin_token::Erc20Token;

const CONTRACT: &str = "CollateralTokenAdapter";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralTokenAdapter {
    pub address: Address,
    pub pool: CollateralPoolId,
    pub collateral_token: Address,
    /// Custody address holding deposited tokens
    pub vault: Address,
    /// Callers allowed to deposit and withdraw
    whitelisted: BTreeSet<Address>,
    /// Tokens held in custody [wad]
    pub total_share: U256,
    pub live: bool,
}

impl CollateralTokenAdapter {
    pub fn new(address: Address, pool: CollateralPoolId, collateral_token: Address) -> Self {
        Self {
            address,
            pool,
            collateral_token,
            vault: Address::ZERO,
            whitelisted: BTreeSet::new(),
            total_share: U256::ZERO,
            live: true,
        }
    }

    pub fn is_whitelisted(&self, account: Address) -> bool {
        self.whitelisted.contains(&account)
    }

    // ============ Owner Operations ============

    pub fn set_vault(&mut self, ctx: &mut CallContext, book_keeper: &BookKeeper, vault: Address) -> StablecoinResult<()> {
        book_keeper.access_control().require_owner(ctx.sender)?;
        if vault.is_zero() {
            return Err(StablecoinError::ZeroAddress { contract: CONTRACT, param: "vault" });
        }

        self.vault = vault;
        ctx.emit(StablecoinEvent::AddressParameterSet {
            contract: CONTRACT.into(),
            pool: Some(self.pool),
            param: "Vault".into(),
            value: vault,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    pub fn whitelist(&mut self, ctx: &mut CallContext, book_keeper: &BookKeeper, account: Address) -> StablecoinResult<()> {
        book_keeper.access_control().require_owner(ctx.sender)?;
        if account.is_zero() {
            return Err(StablecoinError::ZeroAddress { contract: CONTRACT, param: "account" });
        }

        self.whitelisted.insert(account);
        ctx.emit(StablecoinEvent::Whitelisted {
            contract: CONTRACT.into(),
            owner: ctx.sender,
            account,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    pub fn blacklist(&mut self, ctx: &mut CallContext, book_keeper: &BookKeeper, account: Address) -> StablecoinResult<()> {
        book_keeper.access_control().require_owner(ctx.sender)?;

        self.whitelisted.remove(&account);
        ctx.emit(StablecoinEvent::Blacklisted {
            contract: CONTRACT.into(),
            owner: ctx.sender,
            account,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

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

    // ============ Deposits ============

    fn require_active(&self, ctx: &CallContext, token: &Erc20Token) -> StablecoinResult<()> {
        if !self.live {
            return Err(StablecoinError::NotLive { contract: CONTRACT });
        }
        if !self.is_whitelisted(ctx.sender) {
            return Err(StablecoinError::NotWhitelisted { contract: CONTRACT });
        }
        if self.vault.is_zero() {
            return Err(StablecoinError::ZeroAddress { contract: CONTRACT, param: "vault" });
        }
        if token.address != self.collateral_token {
            return Err(StablecoinError::InvalidInput {
                contract: CONTRACT,
                reason: "wrong-token",
            });
        }
        Ok(())
    }

    /// Move tokens from the caller into the vault and credit `position`
    pub fn deposit(
        &mut self,
        ctx: &mut CallContext,
        book_keeper: &mut BookKeeper,
        token: &mut Erc20Token,
        position: Address,
        amount: U256,
    ) -> StablecoinResult<()> {
        // 1. Caller, vault and token checks
        self.require_active(ctx, token)?;

        // 2. Token pull must succeed before the ledger is touched
        let depositor = ctx.sender;
        let (adapter, vault, pool) = (self.address, self.vault, self.pool);
        let delta = math::to_signed(amount)?;
        token.check_spend(depositor, adapter, amount)?;
        let total_share = math::add(self.total_share, amount)?;

        // 3. Credit ledger collateral, then take custody
        ctx.call_as(adapter, |ctx| book_keeper.add_collateral(ctx, pool, position, delta))?;
        ctx.call_as(adapter, |ctx| token.transfer_from(ctx, depositor, vault, amount))?;
        self.total_share = total_share;
        Ok(())
    }

    /// Debit the caller's ledger collateral and release tokens to `usr`
    pub fn withdraw(
        &mut self,
        ctx: &mut CallContext,
        book_keeper: &mut BookKeeper,
        token: &mut Erc20Token,
        usr: Address,
        amount: U256,
    ) -> StablecoinResult<()> {
        self.require_active(ctx, token)?;

        let owner = ctx.sender;
        let (adapter, vault, pool) = (self.address, self.vault, self.pool);
        let delta = -math::to_signed(amount)?;
        token.check_spend(vault, vault, amount)?;
        let total_share = math::sub(self.total_share, amount)?;

        ctx.call_as(adapter, |ctx| book_keeper.add_collateral(ctx, pool, owner, delta))?;
        ctx.call_as(vault, |ctx| token.transfer(ctx, usr, amount))?;
        self.total_share = total_share;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixture::{alice, bob, owner, Fixture};
    use stablecoin_common::{constants::precision::WAD, events::EventType};

    fn wad(units: u64) -> U256 {
        WAD * U256::from(units)
    }

    fn vault() -> Address {
        Address::with_last_byte(0x7a)
    }

    /// Adapter with a vault, Alice whitelisted and holding 100 WBNB
    fn ready() -> Fixture {
        let mut f = Fixture::new();
        let Fixture { ctx, book_keeper, collateral_adapter, wbnb, .. } = &mut f;

        collateral_adapter.set_vault(ctx, book_keeper, vault()).unwrap();
        collateral_adapter.whitelist(ctx, book_keeper, alice()).unwrap();
        wbnb.mint(ctx, book_keeper.access_control(), alice(), wad(100)).unwrap();
        let adapter = collateral_adapter.address;
        ctx.call_as(alice(), |ctx| wbnb.approve(ctx, adapter, U256::MAX)).unwrap();
        f
    }

    #[test]
    fn test_set_vault() {
        let mut f = Fixture::new();
        let Fixture { ctx, book_keeper, collateral_adapter, .. } = &mut f;

        let result = collateral_adapter.set_vault(ctx, book_keeper, Address::ZERO);
        assert_eq!(result.unwrap_err().to_string(), "CollateralTokenAdapter/zero-vault");

        let result = ctx.call_as(alice(), |ctx| collateral_adapter.set_vault(ctx, book_keeper, vault()));
        assert_eq!(result.unwrap_err().to_string(), "!ownerRole");

        collateral_adapter.set_vault(ctx, book_keeper, vault()).unwrap();
        assert_eq!(collateral_adapter.vault, vault());
    }

    #[test]
    fn test_deposit_and_withdraw() {
        let mut f = ready();
        let Fixture { ctx, book_keeper, collateral_adapter, wbnb, .. } = &mut f;
        let pool = collateral_adapter.pool;

        ctx.call_as(alice(), |ctx| collateral_adapter.deposit(ctx, book_keeper, wbnb, alice(), wad(40)))
            .unwrap();
        assert_eq!(wbnb.balance_of(vault()), wad(40));
        assert_eq!(book_keeper.collateral_token(pool, alice()), wad(40));
        assert_eq!(collateral_adapter.total_share, wad(40));

        ctx.call_as(alice(), |ctx| collateral_adapter.withdraw(ctx, book_keeper, wbnb, bob(), wad(15)))
            .unwrap();
        assert_eq!(wbnb.balance_of(bob()), wad(15));
        assert_eq!(book_keeper.collateral_token(pool, alice()), wad(25));
        assert_eq!(collateral_adapter.total_share, wad(25));
    }

    #[test]
    fn test_withdraw_more_than_credited() {
        let mut f = ready();
        let Fixture { ctx, book_keeper, collateral_adapter, wbnb, .. } = &mut f;

        ctx.call_as(alice(), |ctx| collateral_adapter.deposit(ctx, book_keeper, wbnb, alice(), wad(10)))
            .unwrap();
        let result = ctx.call_as(alice(), |ctx| collateral_adapter.withdraw(ctx, book_keeper, wbnb, alice(), wad(11)));

        assert!(result.is_err());
        assert_eq!(wbnb.balance_of(vault()), wad(10));
    }

    #[test]
    fn test_deposit_requires_whitelist() {
        let mut f = ready();
        let Fixture { ctx, book_keeper, collateral_adapter, wbnb, .. } = &mut f;

        let result = ctx.call_as(bob(), |ctx| collateral_adapter.deposit(ctx, book_keeper, wbnb, bob(), wad(1)));
        assert_eq!(result.unwrap_err().to_string(), "CollateralTokenAdapter/not-whitelisted");

        collateral_adapter.blacklist(ctx, book_keeper, alice()).unwrap();
        let result = ctx.call_as(alice(), |ctx| collateral_adapter.deposit(ctx, book_keeper, wbnb, alice(), wad(1)));
        assert!(matches!(result, Err(StablecoinError::NotWhitelisted { .. })));
    }

    #[test]
    fn test_cage_stops_deposits() {
        let mut f = ready();
        let Fixture { ctx, book_keeper, collateral_adapter, wbnb, .. } = &mut f;

        collateral_adapter.cage(ctx, book_keeper).unwrap();
        let result = ctx.call_as(alice(), |ctx| collateral_adapter.deposit(ctx, book_keeper, wbnb, alice(), wad(1)));
        assert_eq!(result.unwrap_err().to_string(), "CollateralTokenAdapter/not-live");
        assert_eq!(ctx.events.filter_by_type(EventType::Cage).len(), 1);

        let result = ctx.call_as(owner(), |ctx| collateral_adapter.whitelist(ctx, book_keeper, Address::ZERO));
        assert!(matches!(result, Err(StablecoinError::ZeroAddress { .. })));
    }
}
