//! Stablecoin Token Contract
//!
//! ERC-20 balances for the stablecoin and for collateral tokens. Only
//! accounts holding `MINTABLE_ROLE` can mint; burning spends the holder's
//! balance directly or through an allowance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use stablecoin_common::{
    constants::token,
    errors::{StablecoinError, StablecoinResult},
    events::StablecoinEvent,
    math,
    types::{Address, CallContext, U256},
    AccessControlConfig, Role,
};

// ============ Token State ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20Token {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
    balances: BTreeMap<Address, U256>,
    /// (owner, spender) -> amount
    allowances: BTreeMap<(Address, Address), U256>,
}

impl Erc20Token {
    pub fn new(address: Address, name: &str, symbol: &str, decimals: u8) -> Self {
        Self {
            address,
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
            total_supply: U256::ZERO,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        }
    }

    /// The protocol stablecoin
    pub fn stablecoin(address: Address) -> Self {
        Self::new(address, token::NAME, token::SYMBOL, token::DECIMALS)
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(owner, spender)).copied().unwrap_or_default()
    }

    // ============ ERC-20 ============

    pub fn transfer(&mut self, ctx: &mut CallContext, to: Address, amount: U256) -> StablecoinResult<()> {
        let from = ctx.sender;
        self.move_balance(ctx, from, to, amount)
    }

    /// Move `amount` from `from` using the sender's allowance
    ///
    /// An allowance of `U256::MAX` is never decremented.
    pub fn transfer_from(
        &mut self,
        ctx: &mut CallContext,
        from: Address,
        to: Address,
        amount: U256,
    ) -> StablecoinResult<()> {
        let remaining = self.check_spend(from, ctx.sender, amount)?;
        if let Some(remaining) = remaining {
            self.allowances.insert((from, ctx.sender), remaining);
        }
        self.move_balance(ctx, from, to, amount)
    }

    pub fn approve(&mut self, ctx: &mut CallContext, spender: Address, amount: U256) -> StablecoinResult<()> {
        self.allowances.insert((ctx.sender, spender), amount);
        ctx.emit(StablecoinEvent::Approval {
            token: self.address,
            owner: ctx.sender,
            spender,
            amount,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    // ============ Supply ============

    /// Mint new tokens (requires `MINTABLE_ROLE`)
    pub fn mint(
        &mut self,
        ctx: &mut CallContext,
        acl: &AccessControlConfig,
        to: Address,
        amount: U256,
    ) -> StablecoinResult<()> {
        self.check_mint(acl, ctx.sender, to, amount)?;

        self.total_supply += amount;
        let balance = self.balance_of(to) + amount;
        self.balances.insert(to, balance);

        ctx.emit(StablecoinEvent::Transfer {
            token: self.address,
            from: Address::ZERO,
            to,
            amount,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    /// Burn from `from`; callers other than `from` spend their allowance
    pub fn burn(&mut self, ctx: &mut CallContext, from: Address, amount: U256) -> StablecoinResult<()> {
        let remaining = self.check_spend(from, ctx.sender, amount)?;

        if let Some(remaining) = remaining {
            self.allowances.insert((from, ctx.sender), remaining);
        }
        self.balances.insert(from, self.balance_of(from) - amount);
        self.total_supply = math::sub(self.total_supply, amount)?;

        ctx.emit(StablecoinEvent::Transfer {
            token: self.address,
            from,
            to: Address::ZERO,
            amount,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    // ============ Checks ============

    /// Validate that `spender` may take `amount` from `owner`
    ///
    /// Returns the allowance left afterwards, `None` when no allowance is
    /// consumed (own balance or infinite allowance). Cross-contract callers
    /// run this before touching other state.
    pub fn check_spend(&self, owner: Address, spender: Address, amount: U256) -> StablecoinResult<Option<U256>> {
        let balance = self.balance_of(owner);
        if balance < amount {
            return Err(StablecoinError::InsufficientBalance {
                available: balance,
                requested: amount,
            });
        }
        if owner == spender {
            return Ok(None);
        }
        self.remaining_allowance(owner, spender, amount)
    }

    /// Validate a mint by `minter` without performing it
    pub fn check_mint(&self, acl: &AccessControlConfig, minter: Address, to: Address, amount: U256) -> StablecoinResult<()> {
        acl.require_role(Role::Mintable, minter)?;
        math::add(self.total_supply, amount)?;
        math::add(self.balance_of(to), amount)?;
        Ok(())
    }

    // ============ Internal ============

    /// Allowance left after spending `amount`, `None` for an infinite allowance
    fn remaining_allowance(&self, owner: Address, spender: Address, amount: U256) -> StablecoinResult<Option<U256>> {
        let allowance = self.allowance(owner, spender);
        if allowance == U256::MAX {
            return Ok(None);
        }
        allowance
            .checked_sub(amount)
            .map(Some)
            .ok_or(StablecoinError::InsufficientAllowance {
                available: allowance,
                requested: amount,
            })
    }

    fn move_balance(&mut self, ctx: &mut CallContext, from: Address, to: Address, amount: U256) -> StablecoinResult<()> {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(StablecoinError::InsufficientBalance {
                available: from_balance,
                requested: amount,
            });
        }
        if from != to {
            let to_balance = math::add(self.balance_of(to), amount)?;
            self.balances.insert(from, from_balance - amount);
            self.balances.insert(to, to_balance);
        }

        ctx.emit(StablecoinEvent::Transfer {
            token: self.address,
            from,
            to,
            amount,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stablecoin_common::events::EventType;

    fn owner() -> Address {
        Address::with_last_byte(1)
    }

    fn alice() -> Address {
        Address::with_last_byte(0xa1)
    }

    fn bob() -> Address {
        Address::with_last_byte(0xb0)
    }

    fn setup() -> (Erc20Token, AccessControlConfig, CallContext) {
        let mut ctx = CallContext::new(owner(), 1_000);
        let mut acl = AccessControlConfig::new(owner());
        acl.grant_role(&mut ctx, Role::Mintable.id(), owner()).unwrap();

        let mut token = Erc20Token::stablecoin(Address::with_last_byte(0x5c));
        token.mint(&mut ctx, &acl, alice(), U256::from(1_000u64)).unwrap();
        (token, acl, ctx)
    }

    #[test]
    fn test_metadata() {
        let token = Erc20Token::stablecoin(Address::ZERO);
        assert_eq!(token.symbol, token::SYMBOL);
        assert_eq!(token.decimals, 18);
    }

    #[test]
    fn test_mint_requires_role() {
        let (mut token, acl, mut ctx) = setup();

        let result = ctx.call_as(alice(), |ctx| token.mint(ctx, &acl, alice(), U256::from(1u64)));
        assert_eq!(result.unwrap_err().to_string(), "!mintableRole");
        assert_eq!(token.total_supply, U256::from(1_000u64));
    }

    #[test]
    fn test_transfer() {
        let (mut token, _, mut ctx) = setup();

        ctx.call_as(alice(), |ctx| token.transfer(ctx, bob(), U256::from(400u64)))
            .unwrap();
        assert_eq!(token.balance_of(alice()), U256::from(600u64));
        assert_eq!(token.balance_of(bob()), U256::from(400u64));

        let result = ctx.call_as(bob(), |ctx| token.transfer(ctx, alice(), U256::from(401u64)));
        assert_eq!(result.unwrap_err().to_string(), "Stablecoin/insufficient-balance");
    }

    #[test]
    fn test_transfer_from_allowance() {
        let (mut token, _, mut ctx) = setup();
        ctx.call_as(alice(), |ctx| token.approve(ctx, bob(), U256::from(100u64)))
            .unwrap();

        ctx.call_as(bob(), |ctx| token.transfer_from(ctx, alice(), bob(), U256::from(60u64)))
            .unwrap();
        assert_eq!(token.allowance(alice(), bob()), U256::from(40u64));

        let result = ctx.call_as(bob(), |ctx| token.transfer_from(ctx, alice(), bob(), U256::from(41u64)));
        assert_eq!(result.unwrap_err().to_string(), "Stablecoin/insufficient-allowance");
        assert_eq!(token.balance_of(bob()), U256::from(60u64));
    }

    #[test]
    fn test_infinite_allowance_not_decremented() {
        let (mut token, _, mut ctx) = setup();
        ctx.call_as(alice(), |ctx| token.approve(ctx, bob(), U256::MAX)).unwrap();

        ctx.call_as(bob(), |ctx| token.burn(ctx, alice(), U256::from(500u64)))
            .unwrap();
        assert_eq!(token.allowance(alice(), bob()), U256::MAX);
        assert_eq!(token.total_supply, U256::from(500u64));
    }

    #[test]
    fn test_burn() {
        let (mut token, _, mut ctx) = setup();

        let result = ctx.call_as(bob(), |ctx| token.burn(ctx, alice(), U256::from(1u64)));
        assert!(matches!(result, Err(StablecoinError::InsufficientAllowance { .. })));

        ctx.call_as(alice(), |ctx| token.burn(ctx, alice(), U256::from(1_000u64)))
            .unwrap();
        assert_eq!(token.total_supply, U256::ZERO);
        assert_eq!(ctx.events.filter_by_type(EventType::Transfer).len(), 2);
    }
}
