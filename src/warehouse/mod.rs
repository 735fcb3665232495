//! Warehouse access
//!
//! Postgres connection management plus the two components that touch the
//! warehouse: the staging/merge loader and the summary builder. The loader is
//! the only writer; the summary builder is read-only.

mod loader;
mod summary;

pub use loader::WarehouseLoader;
pub use summary::{compute_ranking, within_price_window, SummaryBuilder, TOP_N};

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::WarehouseConfig;
use crate::error::{Error, Result};

/// Connect to the warehouse with a small bounded retry.
///
/// Only connection establishment is retried; transient DNS or pool exhaustion
/// is common and cheap to retry here, while everything past this point is left
/// to the external scheduler's whole-run retry.
pub async fn connect(config: &WarehouseConfig) -> Result<PgPool> {
    let url = config.connection_url();
    let attempts = config.connect_attempts.max(1);
    let delay = Duration::from_secs(config.connect_delay_secs);

    for attempt in 1..=attempts {
        info!(
            host = %config.host,
            user = %config.user,
            attempt,
            "Connecting to warehouse..."
        );

        match PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&url)
            .await
        {
            Ok(pool) => {
                info!(host = %config.host, "Warehouse connection established");
                return Ok(pool);
            }
            Err(e) if attempt < attempts => {
                warn!(
                    host = %config.host,
                    attempt,
                    error = %e,
                    delay_secs = delay.as_secs(),
                    "Warehouse connection failed, retrying..."
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::error!(host = %config.host, attempts, error = %e, "Warehouse unreachable");
                return Err(Error::Connection {
                    host: config.host.clone(),
                    attempts,
                    source: e,
                });
            }
        }
    }

    unreachable!("connect loop always returns")
}
