//! Protocol Constants
//!
//! Fixed-point scales, parameter bounds and magic values shared by every
//! stablecoin contract.
//!
//! # Network Configuration
//!
//! Use feature flags to compile for different networks:
//! - `mainnet` - Production values (higher debt floor)
//! - Default (no feature) - Testnet values (lower minimums for testing)
//!
//! ```toml
//! # For mainnet deployment:
//! stablecoin-common = { path = "...", features = ["mainnet"] }
//! ```

/// Fixed-point precision
///
/// - wad: 18 decimals, token balances and prices
/// - ray: 27 decimals, rates and ratios
/// - rad: 45 decimals, ledger stablecoin and debt values (wad * ray)
pub mod precision {
    use alloy_primitives::U256;

    /// 10^18
    pub const WAD: U256 = U256::from_limbs([0x0de0_b6b3_a764_0000, 0, 0, 0]);

    /// 10^27
    pub const RAY: U256 = U256::from_limbs([0x9fd0_803c_e800_0000, 0x033b_2e3c, 0, 0]);

    /// 10^45
    pub const RAD: U256 = U256::from_limbs([0x0b22_a000_0000_0000, 0xe086_b93c_e2f7_68a0, 0x002c_d76f, 0]);

    pub const WEI_PER_WAD: U256 = WAD;
    pub const WEI_PER_RAY: U256 = RAY;
    pub const WEI_PER_RAD: U256 = RAD;

    /// Scale between wad and ray (10^9)
    pub const WAD_TO_RAY: U256 = U256::from_limbs([1_000_000_000, 0, 0, 0]);

    /// Basis points denominator
    pub const BPS: u64 = 10_000;
}

/// Stablecoin token metadata
pub mod token {
    /// Token name
    pub const NAME: &str = "Stablecoin";
    /// Token symbol
    pub const SYMBOL: &str = "AUSD";
    /// Decimal places (wad)
    pub const DECIMALS: u8 = 18;
}

/// Stability fee bounds
pub mod stability_fee {
    use alloy_primitives::U256;

    /// Upper bound for a per-second pool stability fee rate (~20% APY)
    ///
    /// 1000000005781378656804591713
    pub const MAX_STABILITY_FEE_RATE: U256 =
        U256::from_limbs([0xf00c_157e_c6dc_d861, 0x033b_2e3c, 0, 0]);

    /// Seconds in a 365 day year
    pub const SECONDS_PER_YEAR: u64 = 31_536_000;
}

/// Liquidation parameter bounds (basis points)
pub mod liquidation {
    /// Close factor may cover the whole position
    pub const MAX_CLOSE_FACTOR_BPS: u64 = 10_000;

    /// Liquidator incentive never pays less than the seized debt (100%)
    pub const MIN_LIQUIDATOR_INCENTIVE_BPS: u64 = 10_000;

    /// Liquidator incentive cap (190%)
    pub const MAX_LIQUIDATOR_INCENTIVE_BPS: u64 = 19_000;

    /// Treasury cut of the liquidator incentive cap (90%)
    pub const MAX_TREASURY_FEES_BPS: u64 = 9_000;
}

/// Flash mint configuration
pub mod flash_mint {
    /// ERC-3156 borrower callback magic value preimage
    pub const CALLBACK_SUCCESS_PREIMAGE: &str = "ERC3156FlashBorrower.onFlashLoan";

    /// Ledger-level flash loan callback magic value preimage
    pub const BOOK_KEEPER_CALLBACK_SUCCESS_PREIMAGE: &str =
        "BookKeeperFlashBorrower.onBookKeeperFlashLoan";

    /// Default flash fee (0.05% as wad = 5 * 10^14)
    pub const DEFAULT_FEE_RATE_WAD: u64 = 500_000_000_000_000;
}

/// Price feed configuration
pub mod price_feed {
    /// Shortest accepted price life (5 minutes)
    pub const MIN_PRICE_LIFE: u64 = 300;

    /// Default price life (1 day)
    pub const DEFAULT_PRICE_LIFE: u64 = 86_400;
}

/// Debt Limits
///
/// Values differ between mainnet and testnet to allow easier testing.
pub mod limits {
    use alloy_primitives::U256;

    /// Default pool debt floor [rad]
    /// - Mainnet: 1,000 stablecoins (dust positions are not worth liquidating)
    /// - Testnet: 1 stablecoin
    #[cfg(feature = "mainnet")]
    pub const DEFAULT_DEBT_FLOOR: U256 =
        U256::from_limbs([0x7f41_0000_0000_0000, 0x0e43_95d6_9670_b12b, 0xaf29_8d05, 0]);
    #[cfg(not(feature = "mainnet"))]
    pub const DEFAULT_DEBT_FLOOR: U256 = super::precision::RAD;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[test]
    fn test_precision_scales() {
        let ten = U256::from(10u64);
        assert_eq!(precision::WAD, ten.pow(U256::from(18u64)));
        assert_eq!(precision::RAY, ten.pow(U256::from(27u64)));
        assert_eq!(precision::RAD, ten.pow(U256::from(45u64)));
        assert_eq!(precision::RAD, precision::WAD * precision::RAY);
        assert_eq!(precision::RAY, precision::WAD * precision::WAD_TO_RAY);
    }

    #[test]
    fn test_max_stability_fee_rate() {
        let expected: U256 = "1000000005781378656804591713".parse().unwrap();
        assert_eq!(stability_fee::MAX_STABILITY_FEE_RATE, expected);
        assert!(stability_fee::MAX_STABILITY_FEE_RATE > precision::RAY);
    }

    #[test]
    fn test_default_debt_floor() {
        let units = if cfg!(feature = "mainnet") { 1_000u64 } else { 1 };
        assert_eq!(limits::DEFAULT_DEBT_FLOOR, precision::RAD * U256::from(units));
    }
}
