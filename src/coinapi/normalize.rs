//! Rate normalization
//!
//! Pure conversion from the raw API listing into canonical warehouse rows.
//! The API reports quote-per-base; the warehouse models base-per-quote, so
//! every rate is inverted here. Getting this wrong silently corrupts all
//! downstream summary math, hence the hard validation.

use chrono::NaiveDateTime;

use super::types::ExchangeRateResponse;
use crate::error::{Error, Result};
use crate::types::RateQuote;

/// Fixed observation-time format: ISO-8601 with fractional seconds
pub const OBSERVED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Convert a raw rate listing into canonical rows.
///
/// Fails on a non-positive rate (would invert to infinity) or an observation
/// time that does not match [`OBSERVED_AT_FORMAT`]. An empty listing is valid
/// and yields an empty vector.
pub fn normalize(response: &ExchangeRateResponse) -> Result<Vec<RateQuote>> {
    let mut rows = Vec::with_capacity(response.rates.len());

    for raw in &response.rates {
        if raw.rate <= 0.0 || !raw.rate.is_finite() {
            return Err(Error::Parse {
                reason: format!(
                    "non-positive rate {} for {}/{}",
                    raw.rate, raw.asset_id_quote, response.asset_id_base
                ),
            });
        }

        let observed_at =
            NaiveDateTime::parse_from_str(&raw.time, OBSERVED_AT_FORMAT).map_err(|e| {
                Error::Parse {
                    reason: format!(
                        "bad observation time {:?} for {}: {e}",
                        raw.time, raw.asset_id_quote
                    ),
                }
            })?;

        rows.push(RateQuote {
            currency: raw.asset_id_quote.clone(),
            base: response.asset_id_base.clone(),
            price: 1.0 / raw.rate,
            observed_at,
        });
    }

    tracing::debug!(count = rows.len(), base = %response.asset_id_base, "Rates normalized");

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coinapi::types::RawRate;
    use chrono::NaiveDate;

    fn response(rates: Vec<RawRate>) -> ExchangeRateResponse {
        ExchangeRateResponse {
            asset_id_base: "USD".to_string(),
            rates,
        }
    }

    fn raw(quote: &str, rate: f64) -> RawRate {
        RawRate {
            asset_id_quote: quote.to_string(),
            rate,
            time: "2024-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn inverts_every_rate() {
        let rates = vec![raw("BTC", 0.00002), raw("ETH", 0.0004), raw("ADA", 2.5)];
        let rows = normalize(&response(rates.clone())).unwrap();

        assert_eq!(rows.len(), 3);
        for (row, raw) in rows.iter().zip(&rates) {
            assert_eq!(row.price, 1.0 / raw.rate);
            assert_eq!(row.currency, raw.asset_id_quote);
            assert_eq!(row.base, "USD");
        }
    }

    #[test]
    fn btc_fixture_maps_to_50000() {
        let rows = normalize(&response(vec![raw("BTC", 0.00002)])).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].currency, "BTC");
        assert_eq!(rows[0].base, "USD");
        assert!((rows[0].price - 50000.0).abs() < 1e-6);
        assert_eq!(
            rows[0].observed_at,
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn zero_rate_is_a_parse_error() {
        let err = normalize(&response(vec![raw("BTC", 0.0)])).unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn negative_rate_is_a_parse_error() {
        let err = normalize(&response(vec![raw("BTC", -1.0)])).unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn bad_timestamp_is_a_parse_error() {
        let mut bad = raw("BTC", 0.5);
        bad.time = "01/01/2024 00:00".to_string();
        let err = normalize(&response(vec![bad])).unwrap_err();
        assert_eq!(err.kind(), "parse");
        assert!(err.to_string().contains("BTC"));
    }

    #[test]
    fn timestamp_without_fraction_still_parses() {
        let mut r = raw("ETH", 0.0004);
        r.time = "2024-01-01T12:30:45Z".to_string();
        let rows = normalize(&response(vec![r])).unwrap();
        assert_eq!(
            rows[0].observed_at,
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(12, 30, 45)
                .unwrap()
        );
    }

    #[test]
    fn empty_listing_is_valid() {
        let rows = normalize(&response(vec![])).unwrap();
        assert!(rows.is_empty());
    }
}
