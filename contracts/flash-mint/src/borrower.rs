//! Flash Borrower Interfaces
//!
//! Receivers implement [`FlashBorrower`] (ERC-3156, ERC-20 stablecoin) or
//! [`BookKeeperFlashBorrower`] (ledger stablecoin). During the callback the
//! sender is the flash mint module; a receiver acting on its own balances
//! does so through `ctx.call_as(self.address(), ..)`.

use alloy_primitives::{keccak256, B256};

use stablecoin_adapters::StablecoinAdapter;
use stablecoin_book_keeper::BookKeeper;
use stablecoin_common::{
    constants::flash_mint::{BOOK_KEEPER_CALLBACK_SUCCESS_PREIMAGE, CALLBACK_SUCCESS_PREIMAGE},
    errors::StablecoinResult,
    types::{Address, CallContext, U256},
};
use stablecoin_token::Erc20Token;

use crate::FlashMintModule;

/// Value an ERC-3156 receiver returns on success
pub fn callback_success() -> B256 {
    keccak256(CALLBACK_SUCCESS_PREIMAGE)
}

/// Value a ledger flash loan receiver returns on success
pub fn book_keeper_callback_success() -> B256 {
    keccak256(BOOK_KEEPER_CALLBACK_SUCCESS_PREIMAGE)
}

/// Contracts a flash loan touches
pub struct FlashMintDeps<'a> {
    pub book_keeper: &'a mut BookKeeper,
    pub stablecoin: &'a mut Erc20Token,
    pub stablecoin_adapter: &'a StablecoinAdapter,
}

impl FlashMintDeps<'_> {
    pub(crate) fn snapshot(&self) -> (BookKeeper, Erc20Token) {
        (self.book_keeper.clone(), self.stablecoin.clone())
    }

    pub(crate) fn restore(&mut self, snapshot: (BookKeeper, Erc20Token)) {
        let (book_keeper, stablecoin) = snapshot;
        *self.book_keeper = book_keeper;
        *self.stablecoin = stablecoin;
    }
}

/// Loan handed to a receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashLoanTerms {
    /// Caller of the flash loan
    pub initiator: Address,
    /// Lent token; the ledger itself for ledger flash loans
    pub token: Address,
    /// Lent amount [wad], or [rad] for ledger flash loans
    pub amount: U256,
    /// Fee owed on top of `amount`, same unit
    pub fee: U256,
}

/// ERC-3156 flash loan receiver
///
/// Must return [`callback_success`] and allow the module to pull
/// `amount + fee` of the stablecoin afterwards.
pub trait FlashBorrower {
    fn address(&self) -> Address;

    fn on_flash_loan(
        &mut self,
        ctx: &mut CallContext,
        module: &mut FlashMintModule,
        deps: &mut FlashMintDeps<'_>,
        terms: &FlashLoanTerms,
        data: &[u8],
    ) -> StablecoinResult<B256>;
}

/// Ledger flash loan receiver
///
/// Must return [`book_keeper_callback_success`] and leave `amount + fee`
/// of ledger stablecoin with the module.
pub trait BookKeeperFlashBorrower {
    fn address(&self) -> Address;

    fn on_book_keeper_flash_loan(
        &mut self,
        ctx: &mut CallContext,
        module: &mut FlashMintModule,
        deps: &mut FlashMintDeps<'_>,
        terms: &FlashLoanTerms,
        data: &[u8],
    ) -> StablecoinResult<B256>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn test_callback_magic_values() {
        assert_eq!(
            callback_success(),
            b256!("439148f0bbc682ca079e46d6e2c2f0c1e3b820f1a291b069d8882abf8cf18dd9")
        );
        assert_ne!(callback_success(), book_keeper_callback_success());
    }
}
