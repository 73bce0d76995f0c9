//! Parameter-Setter Scripts
//!
//! A [`ConfigScript`] is a tagged list of setter calls against an already
//! deployed protocol. Targets are [`ContractName`]s resolved through the
//! network address table at run time, so the same script runs on every
//! network. Scripts are stored as CBOR and identified by the SHA-256 of
//! that encoding.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use stablecoin_common::{
    errors::{StablecoinError, StablecoinResult},
    types::{Address, CallContext},
    Role,
};

use crate::network::{ContractAddresses, ContractName};

// ============ Admin Seam ============

/// The six setters scripts may call
///
/// Every method is one external call made by `ctx.sender`. Implementations
/// dispatch on the target address and surface the target's revert.
pub trait ProtocolAdmin {
    fn grant_role(&mut self, ctx: &mut CallContext, access_control: Address, role: Role, account: Address) -> StablecoinResult<()>;

    fn set_token_symbol(&mut self, ctx: &mut CallContext, price_feed: Address, symbol: &str) -> StablecoinResult<()>;

    fn set_vault(&mut self, ctx: &mut CallContext, adapter: Address, vault: Address) -> StablecoinResult<()>;

    fn whitelist(&mut self, ctx: &mut CallContext, target: Address, account: Address) -> StablecoinResult<()>;

    fn set_flash_lending_enabled(&mut self, ctx: &mut CallContext, flash_mint: Address, enabled: bool) -> StablecoinResult<()>;

    fn set_busd_address(&mut self, ctx: &mut CallContext, price_feed: Address, busd: Address) -> StablecoinResult<()>;
}

// ============ Actions ============

/// Address argument of a setter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Account {
    /// A protocol contract, looked up in the address table
    Contract(ContractName),
    /// A fixed address such as a keeper or multisig
    Literal(Address),
}

impl Account {
    pub fn resolve(&self, addresses: &ContractAddresses) -> StablecoinResult<Address> {
        match self {
            Account::Contract(name) => addresses.address_of(name),
            Account::Literal(address) => Ok(*address),
        }
    }
}

impl From<ContractName> for Account {
    fn from(name: ContractName) -> Self {
        Account::Contract(name)
    }
}

impl From<Address> for Account {
    fn from(address: Address) -> Self {
        Account::Literal(address)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Account::Contract(name) => write!(f, "{name}"),
            Account::Literal(address) => write!(f, "{address}"),
        }
    }
}

/// One setter call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SetterAction {
    /// `AccessControlConfig.grantRole(role, account)`
    GrantRole { role: Role, account: Account },
    /// `PriceFeed.setTokenSymbol(symbol)`
    SetTokenSymbol { feed: ContractName, symbol: String },
    /// `CollateralTokenAdapter.setVault(vault)`
    SetVault { adapter: ContractName, vault: Account },
    /// `whitelist(account)` on an adapter or the ledger
    Whitelist { target: ContractName, account: Account },
    /// `FlashMintModule.setFlashLendingEnabled(enabled)`
    SetFlashLendingEnabled { enabled: bool },
    /// `PriceFeed.setBUSDAddress(busd)`
    SetBusdAddress { feed: ContractName, busd: Account },
}

impl SetterAction {
    /// Resolve every address and make the call
    pub fn apply(
        &self,
        ctx: &mut CallContext,
        addresses: &ContractAddresses,
        admin: &mut dyn ProtocolAdmin,
    ) -> StablecoinResult<()> {
        match self {
            SetterAction::GrantRole { role, account } => {
                let access_control = addresses.address_of(&ContractName::AccessControlConfig)?;
                admin.grant_role(ctx, access_control, *role, account.resolve(addresses)?)
            }
            SetterAction::SetTokenSymbol { feed, symbol } => {
                admin.set_token_symbol(ctx, addresses.address_of(feed)?, symbol)
            }
            SetterAction::SetVault { adapter, vault } => {
                admin.set_vault(ctx, addresses.address_of(adapter)?, vault.resolve(addresses)?)
            }
            SetterAction::Whitelist { target, account } => {
                admin.whitelist(ctx, addresses.address_of(target)?, account.resolve(addresses)?)
            }
            SetterAction::SetFlashLendingEnabled { enabled } => {
                let flash_mint = addresses.address_of(&ContractName::FlashMintModule)?;
                admin.set_flash_lending_enabled(ctx, flash_mint, *enabled)
            }
            SetterAction::SetBusdAddress { feed, busd } => {
                admin.set_busd_address(ctx, addresses.address_of(feed)?, busd.resolve(addresses)?)
            }
        }
    }

    /// Log line naming the call
    pub fn describe(&self) -> String {
        match self {
            SetterAction::GrantRole { role, account } => format!("grantRole {} to {account}", role.name()),
            SetterAction::SetTokenSymbol { feed, symbol } => format!("{feed}.setTokenSymbol {symbol:?}"),
            SetterAction::SetVault { adapter, vault } => format!("{adapter}.setVault {vault}"),
            SetterAction::Whitelist { target, account } => format!("{target}.whitelist {account}"),
            SetterAction::SetFlashLendingEnabled { enabled } => {
                format!("FlashMintModule.setFlashLendingEnabled {enabled}")
            }
            SetterAction::SetBusdAddress { feed, busd } => format!("{feed}.setBUSDAddress {busd}"),
        }
    }
}

// ============ Scripts ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigScript {
    /// Unique name, also the journal key
    pub tag: String,
    pub description: String,
    /// Tags that must run first
    pub dependencies: Vec<String>,
    pub actions: Vec<SetterAction>,
}

impl ConfigScript {
    pub fn new(tag: &str, description: &str) -> Self {
        Self {
            tag: tag.into(),
            description: description.into(),
            dependencies: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn depends_on(mut self, tag: &str) -> Self {
        self.dependencies.push(tag.into());
        self
    }

    pub fn with_action(mut self, action: SetterAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn to_cbor(&self) -> StablecoinResult<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes).map_err(|e| StablecoinError::Encoding {
            reason: e.to_string(),
        })?;
        Ok(bytes)
    }

    pub fn from_cbor(bytes: &[u8]) -> StablecoinResult<Self> {
        ciborium::from_reader(bytes).map_err(|e| StablecoinError::InvalidConfig {
            reason: e.to_string(),
        })
    }

    /// SHA-256 of the CBOR encoding
    pub fn digest(&self) -> StablecoinResult<[u8; 32]> {
        let mut hasher = Sha256::new();
        hasher.update(self.to_cbor()?);
        let result = hasher.finalize();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&result);
        Ok(digest)
    }
}

/// Post-deployment wiring of a fresh protocol
///
/// Grants the oracle role, names and links every price feed, points each
/// collateral adapter at its vault, lets `depositor` use the adapters and
/// opens flash lending.
pub fn default_scripts(collaterals: &[&str], vault: Address, depositor: Address) -> Vec<ConfigScript> {
    let oracle = ConfigScript::new("price-oracle-role", "let the price oracle push pool prices").with_action(
        SetterAction::GrantRole {
            role: Role::PriceOracle,
            account: ContractName::PriceOracle.into(),
        },
    );

    let mut feeds = ConfigScript::new("price-feeds", "token symbols and BUSD quote of every price feed")
        .depends_on("price-oracle-role");
    let mut adapters = ConfigScript::new("collateral-adapters", "vault and whitelist of every collateral adapter");
    for symbol in collaterals {
        let feed = ContractName::PriceFeed((*symbol).into());
        feeds = feeds
            .with_action(SetterAction::SetTokenSymbol {
                feed: feed.clone(),
                symbol: (*symbol).into(),
            })
            .with_action(SetterAction::SetBusdAddress {
                feed,
                busd: ContractName::Busd.into(),
            });

        let adapter = ContractName::CollateralTokenAdapter((*symbol).into());
        adapters = adapters
            .with_action(SetterAction::SetVault {
                adapter: adapter.clone(),
                vault: vault.into(),
            })
            .with_action(SetterAction::Whitelist {
                target: adapter,
                account: depositor.into(),
            });
    }

    let flash = ConfigScript::new("flash-lending", "open flash lending")
        .depends_on("price-feeds")
        .depends_on("collateral-adapters")
        .with_action(SetterAction::SetFlashLendingEnabled { enabled: true });

    vec![oracle, feeds, adapters, flash]
}
