//! Protocol Events
//!
//! Events are emitted during contract execution and double as the protocol's
//! log: every state change leaves one record that scripts render as a log
//! line and indexers decode from CBOR.

use core::fmt;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::errors::{StablecoinError, StablecoinResult};
use crate::types::{pool_name, CollateralPoolId};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventType {
    // Access control (0x01 - 0x0F)
    RoleGranted = 0x01,
    RoleRevoked = 0x02,
    RoleAdminChanged = 0x03,

    // Administration (0x10 - 0x2F)
    Paused = 0x10,
    Unpaused = 0x11,
    Cage = 0x12,
    UintParameterSet = 0x13,
    AddressParameterSet = 0x14,
    BoolParameterSet = 0x15,
    StringParameterSet = 0x16,
    LogFile = 0x17,
    Whitelisted = 0x18,
    Blacklisted = 0x19,

    // Ledger (0x30 - 0x4F)
    CollateralAdjusted = 0x30,
    CollateralMoved = 0x31,
    StablecoinMoved = 0x32,
    PositionAdjusted = 0x33,
    UnbackedStablecoinMinted = 0x34,
    SystemBadDebtSettled = 0x35,
    StabilityFeeCollected = 0x36,

    // Token (0x50 - 0x5F)
    Transfer = 0x50,
    Approval = 0x51,

    // Oracle (0x60 - 0x6F)
    PriceUpdated = 0x60,
    PoolPriceUpdated = 0x61,

    // Flash mint (0x70 - 0x7F)
    FlashLoan = 0x70,
    BookKeeperFlashLoan = 0x71,
}

/// Main event enum containing all protocol events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StablecoinEvent {
    // ============ Access Control ============
    RoleGranted {
        role: B256,
        account: Address,
        sender: Address,
        timestamp: u64,
    },

    RoleRevoked {
        role: B256,
        account: Address,
        sender: Address,
        timestamp: u64,
    },

    RoleAdminChanged {
        role: B256,
        previous_admin: B256,
        new_admin: B256,
        timestamp: u64,
    },

    // ============ Administration ============
    Paused {
        contract: String,
        account: Address,
        timestamp: u64,
    },

    Unpaused {
        contract: String,
        account: Address,
        timestamp: u64,
    },

    /// Contract permanently disabled
    Cage {
        contract: String,
        timestamp: u64,
    },

    /// Numeric parameter changed (`LogSetDebtCeiling`, `LogSetMax`, ...)
    UintParameterSet {
        contract: String,
        pool: Option<CollateralPoolId>,
        param: String,
        value: U256,
        timestamp: u64,
    },

    /// Address parameter changed (`LogSetVault`, `LogSetBUSDAddress`, ...)
    AddressParameterSet {
        contract: String,
        pool: Option<CollateralPoolId>,
        param: String,
        value: Address,
        timestamp: u64,
    },

    /// Flag changed (`LogSetFlashLendingEnabled`)
    BoolParameterSet {
        contract: String,
        param: String,
        value: bool,
        timestamp: u64,
    },

    /// Text parameter changed (`LogSetTokenSymbol`)
    StringParameterSet {
        contract: String,
        param: String,
        value: String,
        timestamp: u64,
    },

    /// Calculator `file` call
    LogFile {
        contract: String,
        what: String,
        data: U256,
        timestamp: u64,
    },

    Whitelisted {
        contract: String,
        owner: Address,
        account: Address,
        timestamp: u64,
    },

    Blacklisted {
        contract: String,
        owner: Address,
        account: Address,
        timestamp: u64,
    },

    // ============ Ledger ============
    CollateralAdjusted {
        pool: CollateralPoolId,
        owner: Address,
        amount: U256,
        increase: bool,
        timestamp: u64,
    },

    CollateralMoved {
        pool: CollateralPoolId,
        src: Address,
        dst: Address,
        amount: U256,
        timestamp: u64,
    },

    StablecoinMoved {
        src: Address,
        dst: Address,
        rad: U256,
        timestamp: u64,
    },

    /// Position state after an adjustment
    PositionAdjusted {
        pool: CollateralPoolId,
        position: Address,
        locked_collateral: U256,
        debt_share: U256,
        timestamp: u64,
    },

    UnbackedStablecoinMinted {
        from: Address,
        to: Address,
        rad: U256,
        timestamp: u64,
    },

    SystemBadDebtSettled {
        caller: Address,
        rad: U256,
        timestamp: u64,
    },

    StabilityFeeCollected {
        pool: CollateralPoolId,
        previous_rate: U256,
        new_rate: U256,
        beneficiary: Address,
        timestamp: u64,
    },

    // ============ Token ============
    /// Mints come from the zero address, burns go to it
    Transfer {
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
        timestamp: u64,
    },

    Approval {
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
        timestamp: u64,
    },

    // ============ Oracle ============
    PriceUpdated {
        feed: Address,
        price: U256,
        timestamp: u64,
    },

    PoolPriceUpdated {
        pool: CollateralPoolId,
        price: U256,
        price_with_safety_margin: U256,
        timestamp: u64,
    },

    // ============ Flash Mint ============
    FlashLoan {
        receiver: Address,
        token: Address,
        amount: U256,
        fee: U256,
        timestamp: u64,
    },

    BookKeeperFlashLoan {
        receiver: Address,
        rad: U256,
        fee: U256,
        timestamp: u64,
    },
}

impl StablecoinEvent {
    /// Get the event type for indexing
    pub fn event_type(&self) -> EventType {
        match self {
            Self::RoleGranted { .. } => EventType::RoleGranted,
            Self::RoleRevoked { .. } => EventType::RoleRevoked,
            Self::RoleAdminChanged { .. } => EventType::RoleAdminChanged,
            Self::Paused { .. } => EventType::Paused,
            Self::Unpaused { .. } => EventType::Unpaused,
            Self::Cage { .. } => EventType::Cage,
            Self::UintParameterSet { .. } => EventType::UintParameterSet,
            Self::AddressParameterSet { .. } => EventType::AddressParameterSet,
            Self::BoolParameterSet { .. } => EventType::BoolParameterSet,
            Self::StringParameterSet { .. } => EventType::StringParameterSet,
            Self::LogFile { .. } => EventType::LogFile,
            Self::Whitelisted { .. } => EventType::Whitelisted,
            Self::Blacklisted { .. } => EventType::Blacklisted,
            Self::CollateralAdjusted { .. } => EventType::CollateralAdjusted,
            Self::CollateralMoved { .. } => EventType::CollateralMoved,
            Self::StablecoinMoved { .. } => EventType::StablecoinMoved,
            Self::PositionAdjusted { .. } => EventType::PositionAdjusted,
            Self::UnbackedStablecoinMinted { .. } => EventType::UnbackedStablecoinMinted,
            Self::SystemBadDebtSettled { .. } => EventType::SystemBadDebtSettled,
            Self::StabilityFeeCollected { .. } => EventType::StabilityFeeCollected,
            Self::Transfer { .. } => EventType::Transfer,
            Self::Approval { .. } => EventType::Approval,
            Self::PriceUpdated { .. } => EventType::PriceUpdated,
            Self::PoolPriceUpdated { .. } => EventType::PoolPriceUpdated,
            Self::FlashLoan { .. } => EventType::FlashLoan,
            Self::BookKeeperFlashLoan { .. } => EventType::BookKeeperFlashLoan,
        }
    }

    /// Get the block timestamp of the event
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::RoleGranted { timestamp, .. }
            | Self::RoleRevoked { timestamp, .. }
            | Self::RoleAdminChanged { timestamp, .. }
            | Self::Paused { timestamp, .. }
            | Self::Unpaused { timestamp, .. }
            | Self::Cage { timestamp, .. }
            | Self::UintParameterSet { timestamp, .. }
            | Self::AddressParameterSet { timestamp, .. }
            | Self::BoolParameterSet { timestamp, .. }
            | Self::StringParameterSet { timestamp, .. }
            | Self::LogFile { timestamp, .. }
            | Self::Whitelisted { timestamp, .. }
            | Self::Blacklisted { timestamp, .. }
            | Self::CollateralAdjusted { timestamp, .. }
            | Self::CollateralMoved { timestamp, .. }
            | Self::StablecoinMoved { timestamp, .. }
            | Self::PositionAdjusted { timestamp, .. }
            | Self::UnbackedStablecoinMinted { timestamp, .. }
            | Self::SystemBadDebtSettled { timestamp, .. }
            | Self::StabilityFeeCollected { timestamp, .. }
            | Self::Transfer { timestamp, .. }
            | Self::Approval { timestamp, .. }
            | Self::PriceUpdated { timestamp, .. }
            | Self::PoolPriceUpdated { timestamp, .. }
            | Self::FlashLoan { timestamp, .. }
            | Self::BookKeeperFlashLoan { timestamp, .. } => *timestamp,
        }
    }

    /// Serialize event to CBOR bytes
    pub fn to_bytes(&self) -> StablecoinResult<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes).map_err(|e| StablecoinError::Encoding {
            reason: e.to_string(),
        })?;
        Ok(bytes)
    }

    /// Deserialize event from CBOR bytes
    pub fn from_bytes(bytes: &[u8]) -> StablecoinResult<Self> {
        ciborium::from_reader(bytes).map_err(|e| StablecoinError::Encoding {
            reason: e.to_string(),
        })
    }
}

fn pool_label(pool: &Option<CollateralPoolId>) -> String {
    match pool {
        Some(id) => format!(" pool={}", pool_name(id)),
        None => String::new(),
    }
}

impl fmt::Display for StablecoinEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[t={}] ", self.timestamp())?;
        match self {
            Self::RoleGranted { role, account, sender, .. } => {
                write!(f, "RoleGranted role={role} account={account} sender={sender}")
            }
            Self::RoleRevoked { role, account, sender, .. } => {
                write!(f, "RoleRevoked role={role} account={account} sender={sender}")
            }
            Self::RoleAdminChanged { role, previous_admin, new_admin, .. } => write!(
                f,
                "RoleAdminChanged role={role} previous={previous_admin} new={new_admin}"
            ),
            Self::Paused { contract, account, .. } => write!(f, "{contract}: Paused by {account}"),
            Self::Unpaused { contract, account, .. } => write!(f, "{contract}: Unpaused by {account}"),
            Self::Cage { contract, .. } => write!(f, "{contract}: Cage"),
            Self::UintParameterSet { contract, pool, param, value, .. } => {
                write!(f, "{contract}: LogSet{param}{} value={value}", pool_label(pool))
            }
            Self::AddressParameterSet { contract, pool, param, value, .. } => {
                write!(f, "{contract}: LogSet{param}{} value={value}", pool_label(pool))
            }
            Self::BoolParameterSet { contract, param, value, .. } => {
                write!(f, "{contract}: LogSet{param} value={value}")
            }
            Self::StringParameterSet { contract, param, value, .. } => {
                write!(f, "{contract}: LogSet{param} value={value:?}")
            }
            Self::LogFile { contract, what, data, .. } => {
                write!(f, "{contract}: File what={what} data={data}")
            }
            Self::Whitelisted { contract, owner, account, .. } => {
                write!(f, "{contract}: {owner} whitelisted {account}")
            }
            Self::Blacklisted { contract, owner, account, .. } => {
                write!(f, "{contract}: {owner} blacklisted {account}")
            }
            Self::CollateralAdjusted { pool, owner, amount, increase, .. } => write!(
                f,
                "BookKeeper: collateral {}{amount} pool={} owner={owner}",
                if *increase { "+" } else { "-" },
                pool_name(pool)
            ),
            Self::CollateralMoved { pool, src, dst, amount, .. } => write!(
                f,
                "BookKeeper: moved {amount} collateral pool={} {src} -> {dst}",
                pool_name(pool)
            ),
            Self::StablecoinMoved { src, dst, rad, .. } => {
                write!(f, "BookKeeper: moved {rad} rad {src} -> {dst}")
            }
            Self::PositionAdjusted { pool, position, locked_collateral, debt_share, .. } => write!(
                f,
                "BookKeeper: position {position} pool={} locked={locked_collateral} debtShare={debt_share}",
                pool_name(pool)
            ),
            Self::UnbackedStablecoinMinted { from, to, rad, .. } => {
                write!(f, "BookKeeper: minted {rad} unbacked rad debt={from} to={to}")
            }
            Self::SystemBadDebtSettled { caller, rad, .. } => {
                write!(f, "BookKeeper: {caller} settled {rad} rad bad debt")
            }
            Self::StabilityFeeCollected { pool, previous_rate, new_rate, beneficiary, .. } => write!(
                f,
                "StabilityFeeCollector: pool={} rate {previous_rate} -> {new_rate} beneficiary={beneficiary}",
                pool_name(pool)
            ),
            Self::Transfer { token, from, to, amount, .. } => {
                write!(f, "Token {token}: Transfer {amount} {from} -> {to}")
            }
            Self::Approval { token, owner, spender, amount, .. } => {
                write!(f, "Token {token}: Approval {owner} -> {spender} amount={amount}")
            }
            Self::PriceUpdated { feed, price, .. } => write!(f, "PriceFeed {feed}: price={price}"),
            Self::PoolPriceUpdated { pool, price, price_with_safety_margin, .. } => write!(
                f,
                "PriceOracle: pool={} price={price} priceWithSafetyMargin={price_with_safety_margin}",
                pool_name(pool)
            ),
            Self::FlashLoan { receiver, token, amount, fee, .. } => write!(
                f,
                "FlashMintModule: FlashLoan receiver={receiver} token={token} amount={amount} fee={fee}"
            ),
            Self::BookKeeperFlashLoan { receiver, rad, fee, .. } => write!(
                f,
                "FlashMintModule: BookKeeperFlashLoan receiver={receiver} rad={rad} fee={fee}"
            ),
        }
    }
}

/// Event log for collecting events during execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<StablecoinEvent>,
}

impl EventLog {
    /// Create new empty event log
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit an event
    pub fn emit(&mut self, event: StablecoinEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[StablecoinEvent] {
        &self.events
    }

    /// Get events of a specific type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&StablecoinEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Most recent event, if any
    pub fn last(&self) -> Option<&StablecoinEvent> {
        self.events.last()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when no events were emitted
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop events emitted after `len` (used when a call reverts)
    pub fn truncate(&mut self, len: usize) {
        self.events.truncate(len);
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Render events as log lines, starting at index `from`
    pub fn render_from(&self, from: usize) -> Vec<String> {
        self.events.iter().skip(from).map(|e| e.to_string()).collect()
    }

    /// Render every event as a log line
    pub fn render(&self) -> Vec<String> {
        self.render_from(0)
    }
}
