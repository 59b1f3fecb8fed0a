// ABOUTME: dump command: export selected tables of one schema to a SQL file
// ABOUTME: Chooses the native serializer or mysqldump for the data section

use crate::commands::SpinnerSink;
use crate::connection::ConnectionDescriptor;
use crate::interactive;
use crate::migration::{export_dump, DataSource, DumpMode, DumpRequest, MysqldumpOptions};
use crate::mysql::reader::list_tables;
use crate::profiles::AppSettings;
use crate::progress::{ProgressLog, EXPORT_CHANNEL};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct DumpOptions {
    pub mode: DumpMode,
    pub tables: Vec<String>,
    /// Dump every base table instead of a named list
    pub all_tables: bool,
    pub interactive: bool,
    pub output: Option<PathBuf>,
    pub batch_size: usize,
    pub use_mysqldump: bool,
}

/// `<schema>.sql` in the working directory
pub fn default_output_path(database: &str) -> PathBuf {
    PathBuf::from(format!("{}.sql", database))
}

fn data_source(options: &DumpOptions, settings: &AppSettings) -> DataSource {
    if options.use_mysqldump {
        DataSource::External(MysqldumpOptions {
            executable: settings.mysqldump_path().map(PathBuf::from),
        })
    } else {
        DataSource::Native {
            batch_size: options.batch_size,
        }
    }
}

pub async fn dump(
    source: &ConnectionDescriptor,
    options: DumpOptions,
    settings: &AppSettings,
) -> Result<PathBuf> {
    source.validate_with_database()?;

    let tables = if options.interactive {
        interactive::select_tables(source).await?
    } else if options.all_tables {
        let mut conn = source.connect().await?;
        let tables = list_tables(&mut conn, &source.database).await;
        if let Err(e) = conn.disconnect().await {
            tracing::warn!("Failed to close connection cleanly: {}", e);
        }
        tables.with_context(|| format!("Failed to list tables of '{}'", source.database))?
    } else {
        options.tables.clone()
    };

    let output = options
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&source.database));

    let request = DumpRequest {
        source: source.clone(),
        tables,
        mode: options.mode,
        data_source: data_source(&options, settings),
        preamble_database: None,
    };

    if let DataSource::External(opts) = &request.data_source {
        match &opts.executable {
            Some(path) => tracing::info!("mysqldump path: {}", path.display()),
            None => tracing::info!("mysqldump path: searching PATH"),
        }
    }

    let sink = Arc::new(SpinnerSink::start("Exporting..."));
    let log = ProgressLog::new(Some(sink.clone()), EXPORT_CHANNEL);

    match export_dump(&request, &output, &log).await {
        Ok(path) => {
            sink.finish(&format!("Export complete: {}", path.display()));
            Ok(path)
        }
        Err(e) => {
            sink.abandon("Export failed");
            Err(e)
        }
    }
}
