//! Error Types for the Stablecoin Protocol
//!
//! Every failure is a revert. `Display` renders the exact revert reason the
//! deployed contracts use, so callers and tests can compare reason strings,
//! while `code()` gives a stable identifier for logging.

use core::fmt;

use alloy_primitives::{hex, Address, B256, U256};

use crate::access_control::Role;

/// Result type alias for protocol operations
pub type StablecoinResult<T> = Result<T, StablecoinError>;

/// Main error enum for all protocol errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StablecoinError {
    // ============ Authorization Errors ============
    /// Caller lacks OWNER_ROLE
    NotOwner,

    /// Caller holds neither OWNER_ROLE nor GOV_ROLE
    NotOwnerOrGov,

    /// Caller lacks a module role (adapter, price oracle, ...)
    RoleRequired { role: Role },

    /// OpenZeppelin-style admin check failure
    MissingRole { account: Address, role: B256 },

    /// `renounce_role` called for another account
    RenounceForOther,

    // ============ Pause Errors ============
    /// Contract is paused
    Paused,

    /// Contract is not paused
    NotPaused,

    /// Contract was caged and no longer accepts calls
    NotLive { contract: &'static str },

    // ============ Parameter Errors ============
    /// `file` called with an unknown parameter name
    UnrecognizedParam { contract: &'static str },

    /// Decay factor above one ray
    CutAboveRay { contract: &'static str },

    /// Zero address where a contract address is required
    ZeroAddress { contract: &'static str, param: &'static str },

    /// Invalid input parameter
    InvalidInput { contract: &'static str, reason: &'static str },

    // ============ Collateral Pool Errors ============
    /// Pool was initialised before
    PoolAlreadyInitialized,

    /// Pool has never been initialised
    PoolNotInitialized { contract: &'static str },

    /// Stability fee rate outside [RAY, MAX_STABILITY_FEE_RATE]
    InvalidStabilityFeeRate { rate: U256 },

    /// Liquidation ratio below one ray
    InvalidLiquidationRatio,

    /// Basis-point parameter outside its bounds
    InvalidBps { param: &'static str, value: u64 },

    // ============ Ledger Errors ============
    /// Caller may not act for the source address
    NotAllowed,

    /// Caller may not act for the position
    NotAllowedPositionAddress,

    /// Caller may not spend the collateral owner's balance
    NotAllowedCollateralOwner,

    /// Caller may not credit the stablecoin owner
    NotAllowedStablecoinOwner,

    /// Pool or global debt ceiling exceeded
    CeilingExceeded,

    /// Position would be undercollateralized
    NotSafe,

    /// Position debt below pool debt floor
    DebtFloor { debt: U256, floor: U256 },

    // ============ Token Errors ============
    /// Balance too small for transfer or burn
    InsufficientBalance { available: U256, requested: U256 },

    /// Allowance too small for transfer_from or burn
    InsufficientAllowance { available: U256, requested: U256 },

    /// Caller is not on the adapter whitelist
    NotWhitelisted { contract: &'static str },

    // ============ Stability Fee Errors ============
    /// Accrual requested before the last accumulation time
    InvalidNow { now: u64, last_accumulation_time: u64 },

    // ============ Flash Mint Errors ============
    /// Token other than the stablecoin
    TokenUnsupported { token: Address },

    /// Requested amount above the flash mint ceiling
    FlashCeilingExceeded { requested: U256, maximum: U256 },

    /// Ceiling would overflow when scaled to rad
    FlashCeilingTooHigh,

    /// Borrower callback returned the wrong magic value
    FlashCallbackFailed,

    /// Flash lending switched off
    FlashLendingDisabled,

    /// Nested flash loan
    ReentrantCall,

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    Overflow,

    /// Arithmetic underflow occurred
    Underflow,

    /// Division by zero
    DivisionByZero,

    // ============ Deployment Errors ============
    /// No address table for this network
    UnknownNetwork { chain_id: u64 },

    /// Address table has no entry for this contract
    UnknownContract { name: String },

    /// Script was already executed with different content
    ScriptChanged { tag: String },

    /// Script depends on a tag that is not scheduled
    MissingDependency { tag: String, dependency: String },

    /// Configuration could not be decoded
    InvalidConfig { reason: String },

    /// Binary encoding failed
    Encoding { reason: String },
}

impl StablecoinError {
    /// Returns a stable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotOwner => "E001_NOT_OWNER",
            Self::NotOwnerOrGov => "E002_NOT_OWNER_OR_GOV",
            Self::RoleRequired { .. } => "E003_ROLE_REQUIRED",
            Self::MissingRole { .. } => "E004_MISSING_ROLE",
            Self::RenounceForOther => "E005_RENOUNCE_OTHER",
            Self::Paused => "E010_PAUSED",
            Self::NotPaused => "E011_NOT_PAUSED",
            Self::NotLive { .. } => "E012_NOT_LIVE",
            Self::UnrecognizedParam { .. } => "E020_UNRECOGNIZED_PARAM",
            Self::CutAboveRay { .. } => "E021_CUT_GT_RAY",
            Self::ZeroAddress { .. } => "E022_ZERO_ADDRESS",
            Self::InvalidInput { .. } => "E023_INVALID_INPUT",
            Self::PoolAlreadyInitialized => "E030_POOL_ALREADY_INIT",
            Self::PoolNotInitialized { .. } => "E031_POOL_NOT_INIT",
            Self::InvalidStabilityFeeRate { .. } => "E032_INVALID_SF_RATE",
            Self::InvalidLiquidationRatio => "E033_INVALID_LIQ_RATIO",
            Self::InvalidBps { .. } => "E034_INVALID_BPS",
            Self::NotAllowed => "E040_NOT_ALLOWED",
            Self::NotAllowedPositionAddress => "E041_NOT_ALLOWED_POSITION",
            Self::NotAllowedCollateralOwner => "E042_NOT_ALLOWED_COLLATERAL",
            Self::NotAllowedStablecoinOwner => "E043_NOT_ALLOWED_STABLECOIN",
            Self::CeilingExceeded => "E044_CEILING_EXCEEDED",
            Self::NotSafe => "E045_NOT_SAFE",
            Self::DebtFloor { .. } => "E046_DEBT_FLOOR",
            Self::InsufficientBalance { .. } => "E050_INSUFFICIENT_BALANCE",
            Self::InsufficientAllowance { .. } => "E051_INSUFFICIENT_ALLOWANCE",
            Self::NotWhitelisted { .. } => "E052_NOT_WHITELISTED",
            Self::InvalidNow { .. } => "E060_INVALID_NOW",
            Self::TokenUnsupported { .. } => "E070_TOKEN_UNSUPPORTED",
            Self::FlashCeilingExceeded { .. } => "E071_FLASH_CEILING_EXCEEDED",
            Self::FlashCeilingTooHigh => "E072_FLASH_CEILING_TOO_HIGH",
            Self::FlashCallbackFailed => "E073_FLASH_CALLBACK_FAILED",
            Self::FlashLendingDisabled => "E074_FLASH_DISABLED",
            Self::ReentrantCall => "E075_REENTRANT",
            Self::Overflow => "E080_OVERFLOW",
            Self::Underflow => "E081_UNDERFLOW",
            Self::DivisionByZero => "E082_DIV_ZERO",
            Self::UnknownNetwork { .. } => "E090_UNKNOWN_NETWORK",
            Self::UnknownContract { .. } => "E091_UNKNOWN_CONTRACT",
            Self::ScriptChanged { .. } => "E092_SCRIPT_CHANGED",
            Self::MissingDependency { .. } => "E093_MISSING_DEPENDENCY",
            Self::InvalidConfig { .. } => "E094_INVALID_CONFIG",
            Self::Encoding { .. } => "E095_ENCODING",
        }
    }

    /// Returns true for role and ownership failures
    pub fn is_access_error(&self) -> bool {
        matches!(
            self,
            Self::NotOwner
                | Self::NotOwnerOrGov
                | Self::RoleRequired { .. }
                | Self::MissingRole { .. }
                | Self::RenounceForOther
        )
    }
}

impl fmt::Display for StablecoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOwner => f.write_str("!ownerRole"),
            Self::NotOwnerOrGov => f.write_str("!(ownerRole or govRole)"),
            Self::RoleRequired { role } => write!(f, "!{}", role.label()),
            Self::MissingRole { account, role } => write!(
                f,
                "AccessControl: account 0x{} is missing role 0x{}",
                hex::encode(account),
                hex::encode(role)
            ),
            Self::RenounceForOther => f.write_str("AccessControl: can only renounce roles for self"),
            Self::Paused => f.write_str("Pausable: paused"),
            Self::NotPaused => f.write_str("Pausable: not paused"),
            Self::NotLive { contract } => write!(f, "{contract}/not-live"),
            Self::UnrecognizedParam { contract } => write!(f, "{contract}/file-unrecognized-param"),
            Self::CutAboveRay { contract } => write!(f, "{contract}/cut-gt-RAY"),
            Self::ZeroAddress { contract, param } => write!(f, "{contract}/zero-{param}"),
            Self::InvalidInput { contract, reason } => write!(f, "{contract}/{reason}"),
            Self::PoolAlreadyInitialized => {
                f.write_str("CollateralPoolConfig/collateral-pool-already-init")
            }
            Self::PoolNotInitialized { contract } => write!(f, "{contract}/collateral-pool-not-init"),
            Self::InvalidStabilityFeeRate { .. } => {
                f.write_str("CollateralPoolConfig/invalid-stability-fee-rate")
            }
            Self::InvalidLiquidationRatio => {
                f.write_str("CollateralPoolConfig/invalid-liquidation-ratio")
            }
            Self::InvalidBps { param, .. } => write!(f, "CollateralPoolConfig/invalid-{param}"),
            Self::NotAllowed => f.write_str("BookKeeper/not-allowed"),
            Self::NotAllowedPositionAddress => f.write_str("BookKeeper/not-allowed-position-address"),
            Self::NotAllowedCollateralOwner => f.write_str("BookKeeper/not-allowed-collateral-owner"),
            Self::NotAllowedStablecoinOwner => f.write_str("BookKeeper/not-allowed-stablecoin-owner"),
            Self::CeilingExceeded => f.write_str("BookKeeper/ceiling-exceeded"),
            Self::NotSafe => f.write_str("BookKeeper/not-safe"),
            Self::DebtFloor { .. } => f.write_str("BookKeeper/debt-floor"),
            Self::InsufficientBalance { .. } => f.write_str("Stablecoin/insufficient-balance"),
            Self::InsufficientAllowance { .. } => f.write_str("Stablecoin/insufficient-allowance"),
            Self::NotWhitelisted { contract } => write!(f, "{contract}/not-whitelisted"),
            Self::InvalidNow { .. } => f.write_str("StabilityFeeCollector/invalid-now"),
            Self::TokenUnsupported { .. } => f.write_str("FlashMintModule/token-unsupported"),
            Self::FlashCeilingExceeded { .. } => f.write_str("FlashMintModule/ceiling-exceeded"),
            Self::FlashCeilingTooHigh => f.write_str("FlashMintModule/ceiling-too-high"),
            Self::FlashCallbackFailed => f.write_str("FlashMintModule/callback-failed"),
            Self::FlashLendingDisabled => f.write_str("FlashMintModule/flash-lending-disabled"),
            Self::ReentrantCall => f.write_str("FlashMintModule/reentrancy-guard"),
            Self::Overflow => f.write_str("arithmetic overflow"),
            Self::Underflow => f.write_str("arithmetic underflow"),
            Self::DivisionByZero => f.write_str("division by zero"),
            Self::UnknownNetwork { chain_id } => write!(f, "unknown network: chain id {chain_id}"),
            Self::UnknownContract { name } => write!(f, "no address configured for {name}"),
            Self::ScriptChanged { tag } => write!(f, "script {tag} changed since it was executed"),
            Self::MissingDependency { tag, dependency } => {
                write!(f, "script {tag} depends on unscheduled script {dependency}")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid config: {reason}"),
            Self::Encoding { reason } => write!(f, "encoding failed: {reason}"),
        }
    }
}

impl std::error::Error for StablecoinError {}
