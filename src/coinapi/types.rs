//! Raw CoinAPI response shapes

use serde::{Deserialize, Serialize};

/// Response of `GET /v1/exchangerate/{base}`.
///
/// Deserialization fails if `rates` is absent, which surfaces upstream as a
/// parse error rather than an empty load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRateResponse {
    pub asset_id_base: String,
    pub rates: Vec<RawRate>,
}

/// One quote-per-base rate as the API reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRate {
    pub asset_id_quote: String,
    /// Units of quote currency per one base unit
    pub rate: f64,
    /// Observation time, ISO-8601 with fractional seconds, e.g.
    /// "2024-01-01T00:00:00.000Z"
    pub time: String,
}
