//! Stablecoin Common Library
//!
//! Shared types, constants, and utilities for all stablecoin contracts.
//!
//! ## Contents
//!
//! - **Fixed Point**: wad (10^18), ray (10^27) and rad (10^45) arithmetic
//! - **Errors**: one enum whose `Display` is the on-chain revert reason
//! - **Events**: the protocol event log, rendered as log lines
//! - **Access Control**: role registry shared by every contract
//! - **Call Context**: sender, block time and event log of a call
//!
//! Contracts are plain state structs. A method validates before it mutates,
//! so an `Err` leaves state as it was.

pub mod access_control;
pub mod constants;
pub mod errors;
pub mod events;
pub mod math;
pub mod types;


// Re-exports for convenience
pub use access_control::{AccessControlConfig, Role, DEFAULT_ADMIN_ROLE};
pub use constants::*;
pub use errors::*;
pub use events::*;
pub use types::*;
