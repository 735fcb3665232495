//! Pipeline operations
//!
//! The two externally-triggerable stages: `run_load` (fetch → normalize →
//! stage+merge) and `run_alert` (aggregate → rank → email). The scheduler
//! invokes each at most once concurrently and retries a failed stage
//! wholesale; both are safe to re-run (the merge is an upsert, a duplicate
//! alert is acceptable).

use tracing::info;

use crate::alert::{render_summary, AlertNotifier};
use crate::coinapi::{normalize, RateFetcher};
use crate::config::AppConfig;
use crate::error::Result;
use crate::types::{LoadReport, RunContext};
use crate::warehouse::{self, SummaryBuilder, WarehouseLoader};

/// Fetch rates and merge them into the warehouse.
///
/// The fetch happens before any warehouse connection, so a failed or
/// malformed fetch leaves staging and history untouched.
pub async fn run_load(config: &AppConfig, ctx: &RunContext) -> Result<LoadReport> {
    info!(%ctx, currency = %config.job.base_currency, "Starting load");

    let fetcher = RateFetcher::new(&config.coinapi);
    let response = fetcher.fetch(&config.job.base_currency).await?;
    let rows = normalize(&response)?;

    let pool = warehouse::connect(&config.warehouse).await?;
    let loader = WarehouseLoader::new(pool, &config.job.table, &config.warehouse.schema);
    loader.ensure_tables().await?;
    let report = loader.load(&rows, ctx).await?;

    info!(%report, "Load finished");
    Ok(report)
}

/// Build the ranked summary from the warehouse and email it.
pub async fn run_alert(config: &AppConfig, ctx: &RunContext) -> Result<()> {
    info!(%ctx, "Starting alert");

    let pool = warehouse::connect(&config.warehouse).await?;
    let builder = SummaryBuilder::new(pool, &config.job.table, &config.warehouse.schema);
    let ranking = builder
        .build_summary(ctx, config.summary.min_price, config.summary.max_price)
        .await?;

    let body = render_summary(&ranking);
    let notifier = AlertNotifier::new(&config.email);
    notifier.notify(&config.job.name, ctx.executed_at, body)?;

    info!("Alert finished");
    Ok(())
}
