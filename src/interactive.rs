// ABOUTME: Interactive terminal UI for table selection and confirmation
// ABOUTME: Multi-select over discovered tables with row/size hints

use crate::connection::ConnectionDescriptor;
use crate::migration::estimation::format_bytes;
use crate::mysql::reader::{table_stats, TableStat};
use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, MultiSelect};

/// Label shown for a table in the selection list
fn display_name(stat: &TableStat) -> String {
    format!(
        "{} (~{} rows, {})",
        stat.name,
        stat.rows,
        format_bytes(stat.size_bytes)
    )
}

/// Let the user pick tables of `descriptor.database`
///
/// Returns an empty list when the schema has no tables or nothing was picked.
///
/// # Examples
///
/// ```no_run
/// # use anyhow::Result;
/// # use mysql_dump_migrator::connection::ConnectionDescriptor;
/// # use mysql_dump_migrator::interactive::select_tables;
/// # async fn example() -> Result<()> {
/// let source = ConnectionDescriptor::from_url("mysql://root@localhost:3306/shop")?;
/// let tables = select_tables(&source).await?;
/// # Ok(())
/// # }
/// ```
pub async fn select_tables(descriptor: &ConnectionDescriptor) -> Result<Vec<String>> {
    descriptor.validate_with_database()?;

    tracing::info!("Discovering tables in '{}'...", descriptor.database);
    let mut conn = descriptor
        .connect()
        .await
        .context("Failed to connect to source database")?;
    let stats = table_stats(&mut conn, &descriptor.database).await;
    if let Err(e) = conn.disconnect().await {
        tracing::warn!("Failed to close connection cleanly: {}", e);
    }
    let stats = stats.with_context(|| {
        format!("Failed to list tables of '{}'", descriptor.database)
    })?;

    if stats.is_empty() {
        tracing::warn!("⚠ No tables found in '{}'", descriptor.database);
        return Ok(Vec::new());
    }
    tracing::info!("✓ Found {} table(s)", stats.len());

    println!("Select tables from '{}':", descriptor.database);
    println!("(Use arrow keys to navigate, Space to select, Enter to confirm)");
    println!();

    let labels: Vec<String> = stats.iter().map(display_name).collect();
    let selections = MultiSelect::with_theme(&ColorfulTheme::default())
        .items(&labels)
        .interact()
        .context("Failed to get table selection")?;

    let selected: Vec<String> = selections
        .iter()
        .map(|&idx| stats[idx].name.clone())
        .collect();

    if selected.is_empty() {
        tracing::warn!("⚠ No tables selected");
    } else {
        tracing::info!("✓ Selected {} table(s)", selected.len());
    }
    Ok(selected)
}

/// Ask before doing something destructive; `default` is the Enter answer
pub fn confirm(prompt: &str, default: bool) -> Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default)
        .interact()
        .context("Failed to get confirmation")
}
