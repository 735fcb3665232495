//! Summary aggregation and ranking
//!
//! Reads the per-currency average price from staging (this run) and from
//! history (prior runs only), then ranks day-over-day percent changes. The
//! ranking math is kept in pure functions over plain rows.

use std::collections::HashMap;

use sqlx::{PgPool, Row};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::{CurrencyAverage, CurrencyMove, RunContext, SummaryRanking};

/// Rows per ranked list
pub const TOP_N: usize = 5;

/// Read-only aggregate reader over the `{schema}.{table}` pair
pub struct SummaryBuilder {
    pool: PgPool,
    table: String,
    schema: String,
}

impl SummaryBuilder {
    pub fn new(pool: PgPool, table: &str, schema: &str) -> Self {
        Self {
            pool,
            table: table.to_string(),
            schema: schema.to_string(),
        }
    }

    fn history(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    fn staging(&self) -> String {
        format!("{}.{}_stg", self.schema, self.table)
    }

    fn query_err(&self, source: sqlx::Error) -> Error {
        Error::Query {
            table: self.history(),
            source,
        }
    }

    /// Build the ranked summary for the given run.
    ///
    /// History rows loaded by the current run (matching `updated_at` date) are
    /// excluded so the comparison is against prior history only. Both
    /// aggregates pass through the inclusive [min_price, max_price] sanity
    /// window before ranking.
    pub async fn build_summary(
        &self,
        ctx: &RunContext,
        min_price: f64,
        max_price: f64,
    ) -> Result<SummaryRanking> {
        let staging_sql = format!(
            "SELECT moneda, base, AVG(precio) AS precio FROM {} GROUP BY moneda, base",
            self.staging()
        );
        let history_sql = format!(
            "SELECT moneda, base, AVG(precio) AS precio FROM {} \
             WHERE updated_at::date != $1 GROUP BY moneda, base",
            self.history()
        );

        info!(table = %self.staging(), "Querying current averages");
        let current = self.fetch_averages(&staging_sql, None).await?;

        info!(table = %self.history(), exclude = %ctx.updated_at.date(), "Querying historical averages");
        let historical = self
            .fetch_averages(&history_sql, Some(ctx.updated_at.date()))
            .await?;

        info!(
            min_price,
            max_price,
            current = current.len(),
            historical = historical.len(),
            "Applying price sanity window"
        );
        let current = within_price_window(current, min_price, max_price);
        let historical = within_price_window(historical, min_price, max_price);

        Ok(compute_ranking(&current, &historical))
    }

    async fn fetch_averages(
        &self,
        sql: &str,
        exclude_date: Option<chrono::NaiveDate>,
    ) -> Result<Vec<CurrencyAverage>> {
        let mut query = sqlx::query(sql);
        if let Some(date) = exclude_date {
            query = query.bind(date);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| self.query_err(e))?;

        let mut averages = Vec::with_capacity(rows.len());
        for row in rows {
            averages.push(CurrencyAverage {
                currency: row.try_get("moneda").map_err(|e| self.query_err(e))?,
                base: row.try_get("base").map_err(|e| self.query_err(e))?,
                price: row.try_get("precio").map_err(|e| self.query_err(e))?,
            });
        }

        Ok(averages)
    }
}

/// Keep rows whose average price lies inside the inclusive sanity window.
pub fn within_price_window(
    rows: Vec<CurrencyAverage>,
    min_price: f64,
    max_price: f64,
) -> Vec<CurrencyAverage> {
    rows.into_iter()
        .filter(|row| row.price >= min_price && row.price <= max_price)
        .collect()
}

/// Join current vs. historical averages by currency and rank the moves.
///
/// Currencies without a historical average are absent from the percent-change
/// lists (nothing to compare against); a zero or non-finite historical average
/// is skipped with a warning rather than producing a division blowup. Sorts
/// are stable, so ties keep their query order.
pub fn compute_ranking(
    current: &[CurrencyAverage],
    historical: &[CurrencyAverage],
) -> SummaryRanking {
    let by_currency: HashMap<&str, &CurrencyAverage> = historical
        .iter()
        .map(|row| (row.currency.as_str(), row))
        .collect();

    let mut moves = Vec::new();
    for row in current {
        let Some(hist) = by_currency.get(row.currency.as_str()) else {
            continue;
        };
        if hist.price == 0.0 || !hist.price.is_finite() {
            warn!(currency = %row.currency, historical = hist.price, "Skipping degenerate historical average");
            continue;
        }
        moves.push(CurrencyMove {
            currency: row.currency.clone(),
            base: row.base.clone(),
            current_price: row.price,
            historical_price: hist.price,
            percent_change: (row.price - hist.price) / hist.price * 100.0,
        });
    }

    let mut top_gainers = moves.clone();
    top_gainers.sort_by(|a, b| b.percent_change.total_cmp(&a.percent_change));
    top_gainers.truncate(TOP_N);

    let mut top_losers = moves;
    top_losers.sort_by(|a, b| a.percent_change.total_cmp(&b.percent_change));
    top_losers.truncate(TOP_N);

    let mut top_prices = current.to_vec();
    top_prices.sort_by(|a, b| b.price.total_cmp(&a.price));
    top_prices.truncate(TOP_N);

    SummaryRanking {
        top_gainers,
        top_losers,
        top_prices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn avg(currency: &str, price: f64) -> CurrencyAverage {
        CurrencyAverage {
            currency: currency.to_string(),
            base: "USD".to_string(),
            price,
        }
    }

    #[test]
    fn price_window_bounds_are_inclusive() {
        let min = 10.0;
        let max = 100.0;
        let eps = 1e-9;
        let rows = vec![
            avg("AT_MIN", min),
            avg("BELOW_MIN", min - eps),
            avg("AT_MAX", max),
            avg("ABOVE_MAX", max + eps),
            avg("INSIDE", 50.0),
        ];

        let kept = within_price_window(rows, min, max);
        let names: Vec<&str> = kept.iter().map(|r| r.currency.as_str()).collect();
        assert_eq!(names, vec!["AT_MIN", "AT_MAX", "INSIDE"]);
    }

    #[test]
    fn ranking_returns_five_rows_per_list() {
        let current: Vec<CurrencyAverage> = (0..7)
            .map(|i| avg(&format!("C{i}"), 100.0 + i as f64 * 10.0))
            .collect();
        // Historical averages chosen so percent changes are all distinct.
        let historical: Vec<CurrencyAverage> = (0..7)
            .map(|i| avg(&format!("C{i}"), 100.0 - i as f64 * 5.0))
            .collect();

        let ranking = compute_ranking(&current, &historical);

        assert_eq!(ranking.top_gainers.len(), TOP_N);
        assert_eq!(ranking.top_losers.len(), TOP_N);
        assert_eq!(ranking.top_prices.len(), TOP_N);

        for pair in ranking.top_gainers.windows(2) {
            assert!(pair[0].percent_change >= pair[1].percent_change);
        }
        for pair in ranking.top_losers.windows(2) {
            assert!(pair[0].percent_change <= pair[1].percent_change);
        }
        for pair in ranking.top_prices.windows(2) {
            assert!(pair[0].price >= pair[1].price);
        }

        // Largest gain: C6 went 70 -> 160.
        assert_eq!(ranking.top_gainers[0].currency, "C6");
        // Smallest gain: C0 went 100 -> 100.
        assert_eq!(ranking.top_losers[0].currency, "C0");
        // Highest current price is C6 at 160.
        assert_eq!(ranking.top_prices[0].currency, "C6");
    }

    #[test]
    fn equal_percent_changes_keep_query_order() {
        // Both double: +100% each.
        let current = vec![avg("FIRST", 20.0), avg("SECOND", 40.0), avg("LAST", 2.0)];
        let historical = vec![avg("FIRST", 10.0), avg("SECOND", 20.0), avg("LAST", 1.0)];

        let ranking = compute_ranking(&current, &historical);

        let gainers: Vec<&str> = ranking
            .top_gainers
            .iter()
            .map(|m| m.currency.as_str())
            .collect();
        assert_eq!(gainers, vec!["FIRST", "SECOND", "LAST"]);
    }

    #[test]
    fn percent_change_matches_formula() {
        let ranking = compute_ranking(&[avg("BTC", 110.0)], &[avg("BTC", 100.0)]);
        assert_eq!(ranking.top_gainers.len(), 1);
        let m = &ranking.top_gainers[0];
        assert!((m.percent_change - 10.0).abs() < 1e-12);
        assert_eq!(m.current_price, 110.0);
        assert_eq!(m.historical_price, 100.0);
    }

    #[test]
    fn zero_historical_average_is_skipped_not_an_error() {
        let current = vec![avg("NEW", 5.0), avg("OK", 12.0)];
        let historical = vec![avg("NEW", 0.0), avg("OK", 10.0)];

        let ranking = compute_ranking(&current, &historical);

        assert_eq!(ranking.top_gainers.len(), 1);
        assert_eq!(ranking.top_gainers[0].currency, "OK");
        // Still visible in the price ranking.
        assert!(ranking
            .top_prices
            .iter()
            .any(|row| row.currency == "NEW"));
    }

    #[test]
    fn currency_without_history_is_absent_from_moves() {
        let current = vec![avg("FRESH", 5.0)];
        let ranking = compute_ranking(&current, &[]);
        assert!(ranking.top_gainers.is_empty());
        assert!(ranking.top_losers.is_empty());
        assert_eq!(ranking.top_prices.len(), 1);
    }
}
