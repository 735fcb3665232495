//! CoinAPI REST client
//!
//! Handles HTTP communication with the exchange-rate endpoint. Failures
//! propagate as typed errors so a bad fetch can never flow downstream as an
//! empty rate set and overwrite valid history.

use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client,
};
use std::time::Duration;

use super::types::ExchangeRateResponse;
use crate::config::CoinApiConfig;
use crate::error::{Error, Result};

const API_KEY_HEADER: &str = "X-CoinAPI-Key";

/// REST client for the CoinAPI exchange-rate listing
pub struct RateFetcher {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RateFetcher {
    /// Create a new fetcher with a bounded request timeout
    pub fn new(config: &CoinApiConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// Fetch all rates for `base_currency`.
    ///
    /// Non-2xx status and transport failures are `Error::Fetch`; a body that
    /// does not decode into the expected shape is `Error::Parse`.
    pub async fn fetch(&self, base_currency: &str) -> Result<ExchangeRateResponse> {
        let url = format!("{}/{}", self.base_url, base_currency);

        tracing::info!(
            currency = %base_currency,
            url = %self.base_url,
            "Fetching exchange rates from CoinAPI..."
        );

        let response = self
            .client
            .get(&url)
            .query(&[("asset_id_base", base_currency)])
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| Error::Fetch {
                currency: base_currency.to_string(),
                source: e,
            })?;

        let status = response.status();
        let response = response.error_for_status().map_err(|e| {
            tracing::error!(currency = %base_currency, status = %status, "CoinAPI returned error status");
            Error::Fetch {
                currency: base_currency.to_string(),
                source: e,
            }
        })?;

        let payload = response
            .json::<ExchangeRateResponse>()
            .await
            .map_err(|e| {
                if e.is_decode() {
                    Error::Parse {
                        reason: format!("rate listing for {base_currency} did not decode: {e}"),
                    }
                } else {
                    Error::Fetch {
                        currency: base_currency.to_string(),
                        source: e,
                    }
                }
            })?;

        tracing::info!(
            currency = %base_currency,
            count = payload.rates.len(),
            status = %status,
            "Exchange rates fetched"
        );

        Ok(payload)
    }
}
