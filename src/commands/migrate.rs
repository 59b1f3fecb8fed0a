// ABOUTME: migrate command: copy schema and/or data from one MySQL schema to another
// ABOUTME: Shows a plan summary, asks for confirmation, then dumps and replays

use crate::commands::SpinnerSink;
use crate::interactive;
use crate::migration::{self, MigrationOutcome, MigrationPlan};
use crate::progress::{ProgressLog, MIGRATION_CHANNEL};
use anyhow::{bail, Result};
use std::sync::Arc;

fn print_summary(plan: &MigrationPlan) {
    println!();
    println!("========================================");
    println!("Migration Summary");
    println!("========================================");
    println!();
    println!(
        "Source: {}/{}",
        plan.source.endpoint(),
        plan.source.database
    );
    println!(
        "Target: {}/{}",
        plan.target.endpoint(),
        plan.target.database
    );
    println!("Mode:   {}", plan.mode);
    if plan.tables.is_empty() {
        println!("Tables: all base tables");
    } else {
        println!("Tables: {}", plan.tables.len());
        for table in &plan.tables {
            println!("  ✓ {}", table);
        }
    }
    println!();
    println!("Statements already applied are not rolled back if one fails.");
    println!("========================================");
    println!();
}

pub async fn migrate(mut plan: MigrationPlan, interactive: bool, yes: bool) -> Result<MigrationOutcome> {
    plan.validate()?;

    if interactive {
        plan.tables = interactive::select_tables(&plan.source).await?;
        if plan.tables.is_empty() {
            bail!("No tables selected");
        }
    }

    print_summary(&plan);
    if !yes && !interactive::confirm("Proceed with this migration?", false)? {
        bail!("Migration cancelled by user");
    }

    let sink = Arc::new(SpinnerSink::start("Migrating..."));
    let log = ProgressLog::new(Some(sink.clone()), MIGRATION_CHANNEL);

    match migration::migrate(&plan, &log).await {
        Ok(outcome) => {
            sink.finish(outcome.message());
            tracing::info!(
                "✓ {} ({} statement(s), {} row(s) affected)",
                outcome.message(),
                outcome.statements_executed,
                outcome.affected_rows
            );
            Ok(outcome)
        }
        Err(e) => {
            sink.abandon("Migration failed");
            Err(e)
        }
    }
}
