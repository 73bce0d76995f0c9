//! Stablecoin Deployment Tooling
//!
//! Post-deployment configuration of the protocol, independent of any chain
//! client.
//!
//! ## Pieces
//!
//! - **network**: per-network contract address tables, loaded from JSON
//! - **script**: parameter-setter scripts and the [`ProtocolAdmin`] seam
//!   they call through
//! - **runner**: dependency-ordered execution with a log of every call
//! - **journal**: which scripts already ran, so reruns are no-ops
//! - **local**: an in-memory deployment implementing [`ProtocolAdmin`]
//!
//! ## Flow
//!
//! ```text
//! NetworkConfig ──▶ ContractAddresses ─┐
//!                                      ├─▶ ScriptRunner ──▶ ProtocolAdmin
//! ConfigScript[] ─────────────────────-┘        │
//!                                        DeploymentJournal
//! ```

pub mod journal;
pub mod local;
pub mod network;
pub mod runner;
pub mod script;


pub use journal::{DeploymentJournal, JournalEntry};
pub use local::{contract_address, CollateralSetup, LocalCollateral, LocalProtocol};
pub use network::{ContractAddresses, ContractName, Network, NetworkConfig};
pub use runner::{RunReport, ScriptFailure, ScriptRunner};
pub use script::{default_scripts, Account, ConfigScript, ProtocolAdmin, SetterAction};
