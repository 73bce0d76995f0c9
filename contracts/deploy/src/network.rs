//! Network Address Tables
//!
//! Where each protocol contract lives on each network. Tables are plain
//! JSON keyed by network name:
//!
//! ```json
//! {
//!   "bsc-testnet": {
//!     "bookKeeper": "0x...",
//!     "priceFeeds": { "WBNB": "0x..." }
//!   }
//! }
//! ```
//!
//! Missing or zero entries resolve to `UnknownContract`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use stablecoin_common::{
    errors::{StablecoinError, StablecoinResult},
    types::Address,
};

// ============ Networks ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    BscMainnet,
    BscTestnet,
    Localhost,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::BscMainnet, Network::BscTestnet, Network::Localhost];

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::BscMainnet => 56,
            Network::BscTestnet => 97,
            Network::Localhost => 31337,
        }
    }

    pub fn from_chain_id(chain_id: u64) -> StablecoinResult<Network> {
        Self::ALL
            .into_iter()
            .find(|network| network.chain_id() == chain_id)
            .ok_or(StablecoinError::UnknownNetwork { chain_id })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::BscMainnet => "bsc-mainnet",
            Network::BscTestnet => "bsc-testnet",
            Network::Localhost => "localhost",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = StablecoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|network| network.name() == s)
            .ok_or_else(|| StablecoinError::InvalidConfig {
                reason: format!("unknown network name {s}"),
            })
    }
}

// ============ Contract Names ============

/// A deployed contract, as scripts refer to it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContractName {
    AccessControlConfig,
    CollateralPoolConfig,
    BookKeeper,
    Stablecoin,
    StablecoinAdapter,
    PriceOracle,
    StabilityFeeCollector,
    FlashMintModule,
    SystemDebtEngine,
    Busd,
    /// Price feed of a collateral symbol
    PriceFeed(String),
    /// Adapter of a collateral symbol
    CollateralTokenAdapter(String),
    /// Collateral token by symbol
    CollateralToken(String),
}

impl fmt::Display for ContractName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessControlConfig => f.write_str("AccessControlConfig"),
            Self::CollateralPoolConfig => f.write_str("CollateralPoolConfig"),
            Self::BookKeeper => f.write_str("BookKeeper"),
            Self::Stablecoin => f.write_str("Stablecoin"),
            Self::StablecoinAdapter => f.write_str("StablecoinAdapter"),
            Self::PriceOracle => f.write_str("PriceOracle"),
            Self::StabilityFeeCollector => f.write_str("StabilityFeeCollector"),
            Self::FlashMintModule => f.write_str("FlashMintModule"),
            Self::SystemDebtEngine => f.write_str("SystemDebtEngine"),
            Self::Busd => f.write_str("BUSD"),
            Self::PriceFeed(symbol) => write!(f, "PriceFeed({symbol})"),
            Self::CollateralTokenAdapter(symbol) => write!(f, "CollateralTokenAdapter({symbol})"),
            Self::CollateralToken(symbol) => write!(f, "CollateralToken({symbol})"),
        }
    }
}

// ============ Address Tables ============

/// Addresses of one deployment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContractAddresses {
    pub access_control_config: Address,
    pub collateral_pool_config: Address,
    pub book_keeper: Address,
    pub stablecoin: Address,
    pub stablecoin_adapter: Address,
    pub price_oracle: Address,
    pub stability_fee_collector: Address,
    pub flash_mint_module: Address,
    pub system_debt_engine: Address,
    pub busd: Address,
    pub price_feeds: BTreeMap<String, Address>,
    pub collateral_token_adapters: BTreeMap<String, Address>,
    pub collateral_tokens: BTreeMap<String, Address>,
}

impl ContractAddresses {
    /// Resolve `name`, failing on missing or zero entries
    pub fn address_of(&self, name: &ContractName) -> StablecoinResult<Address> {
        let address = match name {
            ContractName::AccessControlConfig => Some(self.access_control_config),
            ContractName::CollateralPoolConfig => Some(self.collateral_pool_config),
            ContractName::BookKeeper => Some(self.book_keeper),
            ContractName::Stablecoin => Some(self.stablecoin),
            ContractName::StablecoinAdapter => Some(self.stablecoin_adapter),
            ContractName::PriceOracle => Some(self.price_oracle),
            ContractName::StabilityFeeCollector => Some(self.stability_fee_collector),
            ContractName::FlashMintModule => Some(self.flash_mint_module),
            ContractName::SystemDebtEngine => Some(self.system_debt_engine),
            ContractName::Busd => Some(self.busd),
            ContractName::PriceFeed(symbol) => self.price_feeds.get(symbol).copied(),
            ContractName::CollateralTokenAdapter(symbol) => self.collateral_token_adapters.get(symbol).copied(),
            ContractName::CollateralToken(symbol) => self.collateral_tokens.get(symbol).copied(),
        };

        address
            .filter(|address| !address.is_zero())
            .ok_or_else(|| StablecoinError::UnknownContract { name: name.to_string() })
    }
}

/// Address tables of every known network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkConfig {
    networks: BTreeMap<Network, ContractAddresses>,
}

impl NetworkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> StablecoinResult<Self> {
        serde_json::from_str(json).map_err(|e| StablecoinError::InvalidConfig { reason: e.to_string() })
    }

    pub fn to_json(&self) -> StablecoinResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| StablecoinError::Encoding { reason: e.to_string() })
    }

    pub fn insert(&mut self, network: Network, addresses: ContractAddresses) {
        self.networks.insert(network, addresses);
    }

    pub fn networks(&self) -> impl Iterator<Item = Network> + '_ {
        self.networks.keys().copied()
    }

    pub fn addresses(&self, network: Network) -> StablecoinResult<&ContractAddresses> {
        self.networks.get(&network).ok_or(StablecoinError::UnknownNetwork {
            chain_id: network.chain_id(),
        })
    }

    pub fn by_chain_id(&self, chain_id: u64) -> StablecoinResult<&ContractAddresses> {
        self.addresses(Network::from_chain_id(chain_id)?)
    }

    pub fn by_name(&self, name: &str) -> StablecoinResult<&ContractAddresses> {
        self.addresses(name.parse()?)
    }
}
