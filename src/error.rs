// ABOUTME: Typed error kinds surfaced by dump, filter, and replay operations
// ABOUTME: Carried inside anyhow errors so callers can downcast and inspect them

use thiserror::Error;

/// Failure kinds that callers may want to tell apart.
///
/// Functions in this crate return `anyhow::Result`; when a failure belongs to
/// one of these kinds it is raised as a `MigrationError` and can be recovered
/// with `err.downcast_ref::<MigrationError>()`. Query errors from the server
/// are not wrapped here: they travel through unchanged with stage context.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Caller input rejected before any network I/O
    #[error("validation failed: {0}")]
    Validation(String),

    /// Opening or pinging a server failed; never retried
    #[error("failed to connect to {endpoint}: {source}")]
    Connectivity {
        endpoint: String,
        #[source]
        source: mysql_async::Error,
    },

    /// Input payload could not be decoded
    #[error("encoding error: {0}")]
    Encoding(String),

    /// A replayed statement failed; earlier statements stay applied
    #[error("statement {index} failed (table {table}): {cause}")]
    StatementFailed {
        index: usize,
        table: String,
        cause: String,
    },
}

impl MigrationError {
    pub fn validation(message: impl Into<String>) -> Self {
        MigrationError::Validation(message.into())
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        MigrationError::Encoding(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, MigrationError::Validation(_))
    }
}
