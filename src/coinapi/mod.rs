//! CoinAPI exchange-rate client
//!
//! Fetches the all-rates listing for a base currency and normalizes it into
//! the canonical warehouse row shape. Endpoint documented at:
//! https://docs.coinapi.io/market-data/rest-api/exchange-rates

mod normalize;
mod rest;
mod types;

pub use normalize::{normalize, OBSERVED_AT_FORMAT};
pub use rest::RateFetcher;
pub use types::{ExchangeRateResponse, RawRate};
