// ABOUTME: Replays dump text statement by statement against a target schema
// ABOUTME: Attributes statements to tables for diagnostics and stops at the first failure

use crate::error::MigrationError;
use crate::executor::QueryExecutor;
use crate::progress::ProgressLog;
use crate::utils::quote_identifier;
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

/// Terminator written after every generated statement and used to split on replay
pub const STATEMENT_DELIMITER: &str = ";\n";

const ATTRIBUTED_PREFIXES: [&str; 4] = ["CREATE TABLE", "INSERT INTO", "DROP TABLE", "ALTER TABLE"];

static TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(CREATE\s+TABLE|INSERT\s+INTO|DROP\s+TABLE|ALTER\s+TABLE)\s+`?([a-zA-Z0-9_\-\.]+)`?")
        .unwrap()
});

/// Split dump text into raw statement pieces on `;\n`
///
/// Pieces are returned untrimmed and blank pieces are kept, so a piece's
/// position is its 1-based statement index minus one.
pub fn split_statements(dump_text: &str) -> Vec<&str> {
    dump_text.split(STATEMENT_DELIMITER).collect()
}

/// Table referenced by a CREATE/INSERT/DROP/ALTER TABLE statement, if any
///
/// Only used for log attribution; the first identifier after the keyword is
/// taken as-is (with an optional backtick pair stripped).
pub fn extract_table_name(statement: &str) -> Option<String> {
    TABLE_NAME_RE
        .captures(statement)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().to_string())
}

fn is_attributed(statement: &str) -> bool {
    let upper = statement.to_uppercase();
    ATTRIBUTED_PREFIXES.iter().any(|p| upper.starts_with(p))
}

/// Counters from a replay that ran to completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub statements_executed: usize,
    pub affected_rows: u64,
}

/// Execute `dump_text` against `target`, in order, inside `target_schema`
///
/// Foreign key checks are switched off first and the target schema is
/// selected if it already exists; otherwise the dump's own preamble creates
/// and selects it. Each non-blank statement then runs in turn; the first failure
/// stops the replay with `MigrationError::StatementFailed` carrying its
/// 1-based index and the last attributed table (`-` when none). Nothing is
/// rolled back.
///
/// Foreign key checks are switched back on after success and, best effort,
/// after a failed statement too.
pub async fn replay_dump<E>(
    target: &mut E,
    target_schema: &str,
    dump_text: &str,
    log: &ProgressLog,
) -> Result<ReplayReport>
where
    E: QueryExecutor + ?Sized,
{
    if target_schema.is_empty() {
        return Err(MigrationError::validation("target schema name is required").into());
    }

    target.exec("SET FOREIGN_KEY_CHECKS = 0", &[]).await?;

    let result = run_statements(target, target_schema, dump_text, log).await;

    match &result {
        Ok(_) => {
            target.exec("SET FOREIGN_KEY_CHECKS = 1", &[]).await?;
        }
        Err(_) => {
            if let Err(e) = target.exec("SET FOREIGN_KEY_CHECKS = 1", &[]).await {
                tracing::warn!("Failed to re-enable foreign key checks: {}", e);
            }
        }
    }

    result
}

async fn run_statements<E>(
    target: &mut E,
    target_schema: &str,
    dump_text: &str,
    log: &ProgressLog,
) -> Result<ReplayReport>
where
    E: QueryExecutor + ?Sized,
{
    // A fresh target schema only exists once the dump's own preamble has run
    if let Err(e) = target
        .exec(&format!("USE {}", quote_identifier(target_schema)), &[])
        .await
    {
        tracing::warn!("Could not select target schema '{}' yet: {}", target_schema, e);
    }

    let pieces = split_statements(dump_text);
    log.emit(format!("Executing SQL ({} statements)", pieces.len()));

    let mut report = ReplayReport::default();
    let mut table: Option<String> = None;

    for (idx, piece) in pieces.iter().enumerate() {
        let statement = piece.trim();
        if statement.is_empty() {
            continue;
        }

        if is_attributed(statement) {
            table = extract_table_name(statement);
            if let Some(name) = &table {
                log.emit(format!("Processing table {}", name));
            }
        }

        match target.exec(statement, &[]).await {
            Ok(affected) => {
                report.statements_executed += 1;
                report.affected_rows += affected;
            }
            Err(e) => {
                let table = table.as_deref().unwrap_or("-");
                log.emit(format!(
                    "Execution failed (statement {}, table {}): {}",
                    idx + 1,
                    table,
                    e
                ));
                return Err(MigrationError::StatementFailed {
                    index: idx + 1,
                    table: table.to_string(),
                    cause: e.to_string(),
                }
                .into());
            }
        }
    }

    Ok(report)
}
