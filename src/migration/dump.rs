// ABOUTME: Dump orchestrator sequencing schema and data serialization by mode
// ABOUTME: Validates inputs up front and reports timestamped progress per step

use crate::connection::ConnectionDescriptor;
use crate::error::MigrationError;
use crate::executor::QueryExecutor;
use crate::migration::external::{dump_data_with_mysqldump, MysqldumpOptions};
use crate::migration::rows::{write_table_data, DEFAULT_BATCH_SIZE};
use crate::migration::schema::write_schema;
use crate::progress::ProgressLog;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Which parts of a dump to produce or keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DumpMode {
    Schema,
    Data,
    Both,
}

impl DumpMode {
    pub fn includes_schema(self) -> bool {
        matches!(self, DumpMode::Schema | DumpMode::Both)
    }

    pub fn includes_data(self) -> bool {
        matches!(self, DumpMode::Data | DumpMode::Both)
    }
}

impl fmt::Display for DumpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DumpMode::Schema => "schema",
            DumpMode::Data => "data",
            DumpMode::Both => "both",
        })
    }
}

impl FromStr for DumpMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "schema" => Ok(DumpMode::Schema),
            "data" => Ok(DumpMode::Data),
            "both" => Ok(DumpMode::Both),
            other => Err(MigrationError::validation(format!(
                "unknown dump mode '{}' (expected schema, data or both)",
                other
            ))
            .into()),
        }
    }
}

/// Where the data section comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Table-by-table batched INSERT serializer
    Native { batch_size: usize },
    /// Third-party whole-database dumper, filtered to its INSERT blocks
    External(MysqldumpOptions),
}

impl Default for DataSource {
    fn default() -> Self {
        DataSource::Native {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Everything the orchestrator needs for one dump
#[derive(Debug, Clone)]
pub struct DumpRequest {
    /// Source server; `database` is the schema being read
    pub source: ConnectionDescriptor,
    pub tables: Vec<String>,
    pub mode: DumpMode,
    pub data_source: DataSource,
    /// Schema named in the CREATE DATABASE/USE preamble; the source schema when `None`
    pub preamble_database: Option<String>,
}

impl DumpRequest {
    pub fn new(source: ConnectionDescriptor, tables: Vec<String>, mode: DumpMode) -> Self {
        Self {
            source,
            tables,
            mode,
            data_source: DataSource::default(),
            preamble_database: None,
        }
    }

    /// Cheap precondition checks, done before any I/O
    pub fn validate(&self) -> Result<()> {
        self.source.validate_with_database()?;
        if self.tables.is_empty() {
            return Err(MigrationError::validation("select at least one table").into());
        }
        if let DataSource::Native { batch_size: 0 } = self.data_source {
            return Err(MigrationError::validation("batch size must be at least 1").into());
        }
        Ok(())
    }
}

/// What a finished dump produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpSummary {
    pub tables: usize,
    /// Rows serialized natively; zero when data came from mysqldump
    pub rows: u64,
    pub data_elapsed: Option<Duration>,
}

fn truncate_to_millis(d: Duration) -> Duration {
    Duration::from_millis(d.as_millis() as u64)
}

/// Run the schema and/or data stages for `request`, writing to `out`
///
/// Every failure aborts the dump; anything already written stays in `out`.
pub async fn dump_to<E, W>(
    executor: &mut E,
    request: &DumpRequest,
    out: &mut W,
    log: &ProgressLog,
) -> Result<DumpSummary>
where
    E: QueryExecutor + ?Sized,
    W: Write + Send,
{
    request.validate()?;

    let db = &request.source.database;
    let preamble = request.preamble_database.as_deref().unwrap_or(db);
    let mut summary = DumpSummary {
        tables: request.tables.len(),
        ..Default::default()
    };

    if request.mode.includes_schema() {
        log.emit("Exporting table schema");
        if let Err(e) = write_schema(executor, db, preamble, &request.tables, out).await {
            log.emit(format!("Schema export failed: {:#}", e));
            return Err(e.context("Schema export failed"));
        }
    }

    if request.mode.includes_data() {
        log.emit("Exporting table data");
        if request.mode == DumpMode::Both {
            out.write_all(b"\n").context("Failed to write dump separator")?;
        }
        let start = Instant::now();

        match &request.data_source {
            DataSource::Native { batch_size } => {
                for table in &request.tables {
                    log.emit(format!("Exporting data of table {}", table));
                    match write_table_data(executor, db, table, *batch_size, out).await {
                        Ok(count) => {
                            log.emit(format!("Table {} exported ({} rows)", table, count));
                            summary.rows += count;
                        }
                        Err(e) => {
                            log.emit(format!("Data export failed: {}, {:#}", table, e));
                            return Err(
                                e.context(format!("Data export failed for table '{}'", table))
                            );
                        }
                    }
                }
            }
            DataSource::External(options) => {
                let data =
                    match dump_data_with_mysqldump(&request.source, &request.tables, options, log)
                        .await
                    {
                        Ok(data) => data,
                        Err(e) => {
                            log.emit(format!("Data export failed: {:#}", e));
                            return Err(e.context("Data export with mysqldump failed"));
                        }
                    };
                out.write_all(data.as_bytes())
                    .context("Failed to write mysqldump data")?;
            }
        }

        let elapsed = truncate_to_millis(start.elapsed());
        log.emit(format!("Data export finished in {:?}", elapsed));
        summary.data_elapsed = Some(elapsed);
    }

    out.flush().context("Failed to flush dump output")?;
    Ok(summary)
}

/// Export a dump of the selected tables to a file
///
/// Validates the descriptor (including the schema name) and the table
/// selection before connecting; an empty selection is an error here.
/// The connection and the file are closed on every exit path.
pub async fn export_dump(
    request: &DumpRequest,
    output_path: &Path,
    log: &ProgressLog,
) -> Result<PathBuf> {
    if let Err(e) = request.validate() {
        log.emit(format!("Export failed: {:#}", e));
        return Err(e);
    }

    log.emit(format!("Starting export of database {}", request.source.database));
    log.emit(format!("Connecting to {}", request.source.endpoint()));
    let mut conn = match request.source.connect().await {
        Ok(conn) => conn,
        Err(e) => {
            log.emit(format!("Connection failed: {:#}", e));
            return Err(e);
        }
    };

    log.emit(format!("{} table(s) selected", request.tables.len()));
    log.emit(format!("Writing to {}", output_path.display()));

    let result = write_dump_file(&mut conn, request, output_path, log).await;

    if let Err(e) = conn.disconnect().await {
        tracing::warn!("Failed to close source connection cleanly: {}", e);
    }

    result?;
    log.emit(format!("Saved {}", output_path.display()));
    Ok(output_path.to_path_buf())
}

async fn write_dump_file<E>(
    executor: &mut E,
    request: &DumpRequest,
    output_path: &Path,
    log: &ProgressLog,
) -> Result<DumpSummary>
where
    E: QueryExecutor + ?Sized,
{
    let file = match std::fs::File::create(output_path) {
        Ok(file) => file,
        Err(e) => {
            log.emit(format!("Failed to create file: {}", e));
            bail!("Failed to create {}: {}", output_path.display(), e);
        }
    };
    let mut writer = BufWriter::new(file);
    dump_to(executor, request, &mut writer, log).await
}
