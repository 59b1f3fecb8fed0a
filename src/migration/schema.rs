// ABOUTME: Schema serializer emitting CREATE DATABASE/USE and CREATE TABLE text
// ABOUTME: Reads each table's DDL from the source server's SHOW CREATE TABLE

use crate::executor::QueryExecutor;
use crate::mysql::reader::show_create_table;
use crate::utils::quote_identifier;
use anyhow::{Context, Result};
use std::io::Write;

/// Write the schema section of a dump
///
/// Emits one `CREATE DATABASE IF NOT EXISTS` + `USE` preamble naming
/// `preamble_db`, then the verbatim CREATE TABLE text of every table of
/// `source_db`, in input order, each followed by `;\n`.
///
/// The first failing table aborts the whole section; nothing after it is
/// written.
pub async fn write_schema<E, W>(
    executor: &mut E,
    source_db: &str,
    preamble_db: &str,
    tables: &[String],
    out: &mut W,
) -> Result<()>
where
    E: QueryExecutor + ?Sized,
    W: Write + Send,
{
    let db = quote_identifier(preamble_db);
    write!(out, "CREATE DATABASE IF NOT EXISTS {};\nUSE {};\n", db, db)
        .context("Failed to write schema preamble")?;

    for table in tables {
        let ddl = show_create_table(executor, source_db, table).await?;
        write!(out, "{};\n", ddl)
            .with_context(|| format!("Failed to write schema of table '{}'", table))?;
        tracing::debug!("Wrote schema of '{}.{}'", source_db, table);
    }

    Ok(())
}
