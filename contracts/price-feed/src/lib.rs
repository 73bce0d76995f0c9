//! Price Feeds and Pool Price Oracle
//!
//! - [`PriceFeed`]: trusted per-collateral price with a validity window
//! - [`PriceOracle`]: turns feed prices into pool prices with safety margin

pub mod price_feed;
pub mod price_oracle;

pub use price_feed::PriceFeed;
pub use price_oracle::PriceOracle;
