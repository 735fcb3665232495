//! Core types used throughout CoinPipe
//!
//! Defines the canonical row shapes flowing through the pipeline and the
//! per-run invocation context supplied by the scheduler.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalized exchange-rate observation, ready for the warehouse.
///
/// `price` is stored as base-per-quote: the API reports quote-per-base and the
/// normalizer inverts it. Invariant: `price > 0` and finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    /// Quote currency (warehouse column `moneda`), e.g. "BTC"
    pub currency: String,
    /// Base currency (warehouse column `base`), e.g. "USD"
    pub base: String,
    /// Price in base units per one quote unit (warehouse column `precio`)
    pub price: f64,
    /// Source observation time (warehouse column `created_at`)
    pub observed_at: NaiveDateTime,
}

/// Per-currency average price, as returned by the staging/history aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyAverage {
    pub currency: String,
    pub base: String,
    pub price: f64,
}

/// A currency's day-over-day move: current average vs. prior-history average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyMove {
    pub currency: String,
    pub base: String,
    /// Average price from this run's staging rows
    pub current_price: f64,
    /// Average price over prior history (current run excluded)
    pub historical_price: f64,
    /// (current - historical) / historical * 100
    pub percent_change: f64,
}

/// Ranked alert summary, recomputed on every alert run and never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryRanking {
    /// Top movers by descending percent change
    pub top_gainers: Vec<CurrencyMove>,
    /// Top movers by ascending percent change
    pub top_losers: Vec<CurrencyMove>,
    /// Highest-priced currencies in the current staging window
    pub top_prices: Vec<CurrencyAverage>,
}

/// Invocation context supplied by the scheduler: the run date and the load
/// timestamp stamped onto every merged row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunContext {
    /// Run date (warehouse column `executed_at`)
    pub executed_at: NaiveDate,
    /// Load timestamp (warehouse column `updated_at`)
    pub updated_at: NaiveDateTime,
}

impl RunContext {
    pub fn new(executed_at: NaiveDate, updated_at: NaiveDateTime) -> Self {
        Self {
            executed_at,
            updated_at,
        }
    }

    /// Context for a given run date, stamped with the current UTC time.
    pub fn for_date(executed_at: NaiveDate) -> Self {
        Self::new(executed_at, Utc::now().naive_utc())
    }

    /// Context for an unscheduled (manual) run: today, right now.
    pub fn current() -> Self {
        let now = Utc::now().naive_utc();
        Self::new(now.date(), now)
    }
}

impl fmt::Display for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run {} (loaded {})", self.executed_at, self.updated_at)
    }
}

/// Outcome of a completed load, for logging and the scheduler's records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Rows written into the staging table
    pub staged: usize,
    /// Rows inserted into or updated in the history table
    pub merged: usize,
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} staged, {} merged", self.staged, self.merged)
    }
}
