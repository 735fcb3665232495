//! Pipeline error types
//!
//! One tagged error kind per pipeline stage so callers can branch on the kind
//! instead of inspecting message strings. Each variant carries the context
//! (currency, table, host, receiver) that the failing stage was working on.

use thiserror::Error;

/// Errors produced by the pipeline stages.
#[derive(Debug, Error)]
pub enum Error {
    /// Rate API transport failure or non-2xx status.
    #[error("rate request for {currency} failed: {source}")]
    Fetch {
        currency: String,
        #[source]
        source: reqwest::Error,
    },

    /// Malformed API payload: missing rate list, non-positive rate,
    /// or an unparseable observation timestamp.
    #[error("malformed rate payload: {reason}")]
    Parse { reason: String },

    /// Warehouse unreachable or rejected the connection, after the bounded
    /// connect retry was exhausted.
    #[error("warehouse connection to {host} failed after {attempts} attempts: {source}")]
    Connection {
        host: String,
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    /// Staging/merge transaction failure. The transaction is rolled back;
    /// nothing is retried internally.
    #[error("load into {table} failed: {source}")]
    Load {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    /// Summary aggregation query failure.
    #[error("summary query on {table} failed: {source}")]
    Query {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    /// Mail build, authentication, or send failure.
    #[error("alert delivery to {receiver} failed: {reason}")]
    Notify { receiver: String, reason: String },
}

impl Error {
    /// Stable kind tag, used in logs and by callers that branch on category.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Fetch { .. } => "fetch",
            Error::Parse { .. } => "parse",
            Error::Connection { .. } => "connection",
            Error::Load { .. } => "load",
            Error::Query { .. } => "query",
            Error::Notify { .. } => "notify",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
