// ABOUTME: Cross-database migration: dump the source to a local file, then replay it
// ABOUTME: Resolves the table set, spools the dump through a temp file, and reports an outcome

use crate::connection::ConnectionDescriptor;
use crate::error::MigrationError;
use crate::executor::QueryExecutor;
use crate::migration::dump::{dump_to, DataSource, DumpMode, DumpRequest};
use crate::migration::replay::replay_dump;
use crate::migration::rows::DEFAULT_BATCH_SIZE;
use crate::mysql::reader::list_tables;
use crate::progress::ProgressLog;
use anyhow::{Context, Result};
use std::future::Future;
use std::io::BufWriter;

/// What to migrate, from where, to where
///
/// `source.database` and `target.database` name the source and target
/// schemas. An empty `tables` list means every base table of the source.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    pub source: ConnectionDescriptor,
    pub target: ConnectionDescriptor,
    pub mode: DumpMode,
    pub tables: Vec<String>,
    pub batch_size: usize,
}

impl MigrationPlan {
    pub fn new(source: ConnectionDescriptor, target: ConnectionDescriptor, mode: DumpMode) -> Self {
        Self {
            source,
            target,
            mode,
            tables: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_tables(mut self, tables: Vec<String>) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.source
            .validate_with_database()
            .context("Invalid source connection")?;
        self.target
            .validate_with_database()
            .context("Invalid target connection")?;
        if self.batch_size == 0 {
            return Err(MigrationError::validation("batch size must be at least 1").into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStatus {
    Completed,
    NothingToMigrate,
}

/// Terminal result of a migration that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub status: MigrationStatus,
    pub tables: Vec<String>,
    pub statements_executed: usize,
    pub affected_rows: u64,
    pub rows_dumped: u64,
}

impl MigrationOutcome {
    fn nothing_to_migrate() -> Self {
        Self {
            status: MigrationStatus::NothingToMigrate,
            tables: Vec::new(),
            statements_executed: 0,
            affected_rows: 0,
            rows_dumped: 0,
        }
    }

    pub fn message(&self) -> &'static str {
        match self.status {
            MigrationStatus::Completed => "migration completed",
            MigrationStatus::NothingToMigrate => "no tables to migrate",
        }
    }
}

/// Migrate using an already open source executor and a lazily opened target
///
/// `connect_target` is only called once there is something to replay, so an
/// empty source never touches the target server.
///
/// # Errors
///
/// - validation errors for incomplete descriptors or a zero batch size,
///   before any I/O
/// - source query errors, with the failing stage as context
/// - `MigrationError::Encoding` if the spooled dump is not UTF-8
/// - `MigrationError::StatementFailed` for the first failing replayed statement
pub async fn migrate_with<S, T, F, Fut>(
    source: &mut S,
    connect_target: F,
    plan: &MigrationPlan,
    log: &ProgressLog,
) -> Result<MigrationOutcome>
where
    S: QueryExecutor + ?Sized,
    T: QueryExecutor,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if let Err(e) = plan.validate() {
        log.emit(format!("Migration failed: {:#}", e));
        return Err(e);
    }

    let source_db = &plan.source.database;
    let target_db = &plan.target.database;
    log.emit(format!("Starting migration: {} -> {}", source_db, target_db));

    let tables = if plan.tables.is_empty() {
        match list_tables(source, source_db).await {
            Ok(tables) => tables,
            Err(e) => {
                log.emit(format!("Failed to read source tables: {:#}", e));
                return Err(e.context(format!("Failed to list tables of '{}'", source_db)));
            }
        }
    } else {
        plan.tables.clone()
    };

    if tables.is_empty() {
        log.emit("Source has no tables to migrate");
        return Ok(MigrationOutcome::nothing_to_migrate());
    }

    let mut spool = tempfile::Builder::new()
        .prefix(&format!("mysql_migration_{}_", spool_prefix(source_db)))
        .suffix(".sql")
        .tempfile()
        .context("Failed to create local dump file")?;
    log.emit(format!("Writing local file {}", spool.path().display()));

    let request = DumpRequest {
        source: plan.source.clone(),
        tables: tables.clone(),
        mode: plan.mode,
        data_source: DataSource::Native {
            batch_size: plan.batch_size,
        },
        preamble_database: Some(target_db.clone()),
    };
    let summary = {
        let mut writer = BufWriter::new(spool.as_file_mut());
        dump_to(source, &request, &mut writer, log).await?
    };

    let bytes = match tokio::fs::read(spool.path()).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log.emit(format!("Failed to read local file: {}", e));
            return Err(anyhow::Error::new(e).context("Failed to read local dump file"));
        }
    };
    let dump_text = String::from_utf8(bytes).map_err(|e| {
        MigrationError::encoding(format!("generated dump is not valid UTF-8: {}", e))
    })?;

    log.emit(format!("Connecting to target {}", plan.target.endpoint()));
    let mut target = match connect_target().await {
        Ok(target) => target,
        Err(e) => {
            log.emit(format!("Failed to connect to target: {:#}", e));
            return Err(e);
        }
    };

    let report = replay_dump(&mut target, target_db, &dump_text, log).await?;

    log.emit("Migration completed");
    Ok(MigrationOutcome {
        status: MigrationStatus::Completed,
        tables,
        statements_executed: report.statements_executed,
        affected_rows: report.affected_rows,
        rows_dumped: summary.rows,
    })
}

/// Schema name reduced to characters that are safe in a file name
fn spool_prefix(schema: &str) -> String {
    schema
        .chars()
        .take(64)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Migrate between two MySQL servers
///
/// Both descriptors are validated before either connection is opened. The
/// target is opened without a default schema; the replay selects it.
pub async fn migrate(plan: &MigrationPlan, log: &ProgressLog) -> Result<MigrationOutcome> {
    if let Err(e) = plan.validate() {
        log.emit(format!("Migration failed: {:#}", e));
        return Err(e);
    }

    log.emit(format!("Connecting to source {}", plan.source.endpoint()));
    let mut source = match plan.source.connect().await {
        Ok(conn) => conn,
        Err(e) => {
            log.emit(format!("Failed to connect to source: {:#}", e));
            return Err(e);
        }
    };

    let target = plan.target.with_database("");
    let result = migrate_with(&mut source, || async move { target.connect().await }, plan, log).await;

    if let Err(e) = source.disconnect().await {
        tracing::warn!("Failed to close source connection cleanly: {}", e);
    }

    result
}
