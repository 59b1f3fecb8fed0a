// ABOUTME: Introspection commands: test-connection, databases, and tables
// ABOUTME: Print server metadata with size estimates for a schema

use crate::connection::ConnectionDescriptor;
use crate::migration::{estimate_selection, format_bytes, format_duration};
use crate::mysql::reader::{list_databases, table_stats};
use anyhow::{Context, Result};

pub async fn test_connection(descriptor: &ConnectionDescriptor) -> Result<()> {
    descriptor.test_connection().await?;
    println!("✓ Connected to {}", descriptor.endpoint());
    Ok(())
}

pub async fn databases(descriptor: &ConnectionDescriptor) -> Result<()> {
    let mut conn = descriptor.connect().await?;
    let result = list_databases(&mut conn).await;
    if let Err(e) = conn.disconnect().await {
        tracing::warn!("Failed to close connection cleanly: {}", e);
    }

    for name in result.context("Failed to list databases")? {
        println!("{}", name);
    }
    Ok(())
}

pub async fn tables(descriptor: &ConnectionDescriptor) -> Result<()> {
    descriptor.validate_with_database()?;
    let mut conn = descriptor.connect().await?;
    let result = table_stats(&mut conn, &descriptor.database).await;
    if let Err(e) = conn.disconnect().await {
        tracing::warn!("Failed to close connection cleanly: {}", e);
    }
    let stats =
        result.with_context(|| format!("Failed to list tables of '{}'", descriptor.database))?;

    if stats.is_empty() {
        println!("No tables in '{}'", descriptor.database);
        return Ok(());
    }

    let width = stats.iter().map(|s| s.name.len()).max().unwrap_or(5).max(5);
    println!("{:<width$}  {:>12}  {:>10}", "TABLE", "ROWS", "SIZE", width = width);
    for stat in &stats {
        println!(
            "{:<width$}  {:>12}  {:>10}",
            stat.name,
            stat.rows,
            format_bytes(stat.size_bytes),
            width = width
        );
    }

    let estimate = estimate_selection(&stats, &[]);
    println!();
    println!(
        "{} table(s), ~{} rows, {} (dump + replay about {})",
        estimate.tables,
        estimate.rows,
        estimate.size_human,
        format_duration(estimate.estimated_duration)
    );
    Ok(())
}
