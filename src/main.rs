//! CoinPipe entrypoint
//!
//! Usage: coinpipe <load|alert|run> [run-date YYYY-MM-DD]
//!
//! `load` refreshes staging and merges into history, `alert` emails the
//! ranked summary, `run` does both in sequence. The optional run date is the
//! scheduler's logical date; without it the run is stamped with today (UTC).

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use tracing::{error, info};

use coinpipe::config::AppConfig;
use coinpipe::pipeline;
use coinpipe::types::RunContext;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = AppConfig::load()?;
    info!("Config: {}", config.digest());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args
        .first()
        .map(String::as_str)
        .context("Usage: coinpipe <load|alert|run> [run-date YYYY-MM-DD]")?;

    let ctx = match args.get(1) {
        Some(raw) => {
            let date: NaiveDate = raw
                .parse()
                .with_context(|| format!("Bad run date {raw:?}, expected YYYY-MM-DD"))?;
            RunContext::for_date(date)
        }
        None => RunContext::current(),
    };

    let outcome = match command {
        "load" => {
            config.validate_secrets()?;
            pipeline::run_load(&config, &ctx).await.map(|_| ())
        }
        "alert" => {
            config.validate_secrets()?;
            config.validate_alert_secrets()?;
            pipeline::run_alert(&config, &ctx).await
        }
        "run" => {
            config.validate_secrets()?;
            config.validate_alert_secrets()?;
            match pipeline::run_load(&config, &ctx).await {
                Ok(_) => pipeline::run_alert(&config, &ctx).await,
                Err(e) => Err(e),
            }
        }
        other => bail!("Unknown command {other:?}, expected load, alert or run"),
    };

    if let Err(e) = outcome {
        error!(kind = e.kind(), error = %e, "Pipeline run failed");
        bail!(e);
    }

    info!("Pipeline run complete");
    Ok(())
}
