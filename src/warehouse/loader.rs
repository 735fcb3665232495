//! Staging + SCD1 merge loader
//!
//! Owns all writes to the staging and history tables. Each load is a single
//! transaction: truncate staging, insert this run's rows, upsert them into
//! history keyed on (moneda, created_at). A partial truncate without a reload
//! would corrupt the next run's aggregate baseline, so either all three
//! effects land or none do.

use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::{LoadReport, RateQuote, RunContext};

/// Writer for the `{schema}.{table}_stg` / `{schema}.{table}` pair
pub struct WarehouseLoader {
    pool: PgPool,
    table: String,
    schema: String,
}

impl WarehouseLoader {
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

    fn load_err(&self, source: sqlx::Error) -> Error {
        Error::Load {
            table: self.history(),
            source,
        }
    }

    /// Create the staging and history tables when missing.
    ///
    /// Mirrors the scheduler-side bootstrap the job expects to have run before
    /// its first load. The unique key on (moneda, created_at) is what the SCD1
    /// merge conflicts against.
    pub async fn ensure_tables(&self) -> Result<()> {
        let create_staging = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                moneda      TEXT NOT NULL,
                base        TEXT NOT NULL,
                precio      DOUBLE PRECISION NOT NULL,
                created_at  TIMESTAMP NOT NULL
            )",
            self.staging()
        );

        let create_history = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                moneda      TEXT NOT NULL,
                base        TEXT NOT NULL,
                precio      DOUBLE PRECISION NOT NULL,
                created_at  TIMESTAMP NOT NULL,
                updated_at  TIMESTAMP NOT NULL,
                executed_at DATE NOT NULL,
                UNIQUE (moneda, created_at)
            )",
            self.history()
        );

        sqlx::query(&create_staging)
            .execute(&self.pool)
            .await
            .map_err(|e| self.load_err(e))?;
        sqlx::query(&create_history)
            .execute(&self.pool)
            .await
            .map_err(|e| self.load_err(e))?;

        Ok(())
    }

    /// Stage this run's rows and merge them into history, atomically.
    ///
    /// Rows are applied in input order, so a duplicate (moneda, created_at)
    /// inside one batch resolves last-write-wins. Re-running with identical
    /// input and context is idempotent: matched keys are overwritten in place.
    pub async fn load(&self, rows: &[RateQuote], ctx: &RunContext) -> Result<LoadReport> {
        if rows.is_empty() {
            warn!(table = %self.staging(), "No rows fetched; staging will be refreshed to empty");
        }

        let mut tx = self.pool.begin().await.map_err(|e| self.load_err(e))?;

        info!(table = %self.staging(), "Refreshing staging table");
        sqlx::query(&format!("TRUNCATE TABLE {}", self.staging()))
            .execute(&mut *tx)
            .await
            .map_err(|e| self.load_err(e))?;

        let insert_staging = self.staging_insert_sql();
        for row in rows {
            sqlx::query(&insert_staging)
                .bind(&row.currency)
                .bind(&row.base)
                .bind(row.price)
                .bind(row.observed_at)
                .execute(&mut *tx)
                .await
                .map_err(|e| self.load_err(e))?;
        }

        info!(
            table = %self.history(),
            count = rows.len(),
            "Merging staging into history (SCD type 1)"
        );
        let upsert = self.history_upsert_sql();
        let mut merged = 0usize;
        for row in rows {
            let result = sqlx::query(&upsert)
                .bind(&row.currency)
                .bind(&row.base)
                .bind(row.price)
                .bind(row.observed_at)
                .bind(ctx.updated_at)
                .bind(ctx.executed_at)
                .execute(&mut *tx)
                .await
                .map_err(|e| self.load_err(e))?;
            merged += result.rows_affected() as usize;
        }

        tx.commit().await.map_err(|e| self.load_err(e))?;

        let report = LoadReport {
            staged: rows.len(),
            merged,
        };
        info!(table = %self.history(), %report, "Load committed");

        Ok(report)
    }

    fn staging_insert_sql(&self) -> String {
        format!(
            "INSERT INTO {} (moneda, base, precio, created_at) VALUES ($1, $2, $3, $4)",
            self.staging()
        )
    }

    fn history_upsert_sql(&self) -> String {
        format!(
            "INSERT INTO {} (moneda, base, precio, created_at, updated_at, executed_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (moneda, created_at) DO UPDATE SET
                 precio = EXCLUDED.precio,
                 created_at = EXCLUDED.created_at,
                 updated_at = EXCLUDED.updated_at,
                 executed_at = EXCLUDED.executed_at",
            self.history()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn loader() -> WarehouseLoader {
        // The pool is lazy; no connection is made until a query runs.
        let pool = PgPoolOptions::new().connect_lazy("postgresql://u:p@localhost:5439/dwh");
        WarehouseLoader::new(pool.unwrap(), "crypto", "staging")
    }

    #[tokio::test]
    async fn table_names_are_schema_qualified() {
        let l = loader();
        assert_eq!(l.history(), "staging.crypto");
        assert_eq!(l.staging(), "staging.crypto_stg");
    }

    #[tokio::test]
    async fn upsert_conflicts_on_the_scd1_key() {
        let sql = loader().history_upsert_sql();
        assert!(sql.contains("INSERT INTO staging.crypto"));
        assert!(sql.contains("ON CONFLICT (moneda, created_at) DO UPDATE SET"));
        assert!(sql.contains("precio = EXCLUDED.precio"));
        assert!(sql.contains("updated_at = EXCLUDED.updated_at"));
        assert!(sql.contains("executed_at = EXCLUDED.executed_at"));
    }

    #[tokio::test]
    async fn staging_insert_targets_staging_only() {
        let sql = loader().staging_insert_sql();
        assert!(sql.starts_with("INSERT INTO staging.crypto_stg"));
        assert!(!sql.contains("ON CONFLICT"));
    }
}
