//! Token Adapters
//!
//! Bridges between ERC-20 balances and the ledger:
//!
//! - **StablecoinAdapter**: ERC-20 stablecoin (wad) <-> ledger stablecoin (rad)
//! - **CollateralTokenAdapter**: collateral token custody <-> ledger collateral
//!
//! Adapters call the ledger as their own address, so each one needs
//! `ADAPTER_ROLE` on the ledger (and the stablecoin adapter `MINTABLE_ROLE`
//! on the token).

pub mod collateral_token_adapter;
pub mod stablecoin_adapter;

pub use collateral_token_adapter::CollateralTokenAdapter;
pub use stablecoin_adapter::StablecoinAdapter;
