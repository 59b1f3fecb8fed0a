// ABOUTME: filter command: split a whole-database dump file into schema or data
// ABOUTME: Reads a dump, keeps the requested part, writes a file or stdout

use crate::error::MigrationError;
use crate::migration::{filter_dump, DumpMode};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Filter `input` down to `mode` and write it to `output`, or stdout when `None`
pub fn filter(input: &Path, output: Option<&Path>, mode: DumpMode) -> Result<()> {
    let bytes =
        fs::read(input).with_context(|| format!("Failed to read dump at {}", input.display()))?;
    let text = String::from_utf8(bytes).map_err(|e| {
        MigrationError::encoding(format!("{} is not valid UTF-8: {}", input.display(), e))
    })?;

    let filtered = filter_dump(&text, mode.includes_schema(), mode.includes_data());
    tracing::info!(
        "Kept {} of {} line(s) ({})",
        if filtered.is_empty() { 0 } else { filtered.split('\n').count() },
        text.split('\n').count(),
        mode
    );

    match output {
        Some(path) => fs::write(path, filtered.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(filtered.as_bytes())
                .context("Failed to write to stdout")?;
            handle.write_all(b"\n").context("Failed to write to stdout")?;
        }
    }
    Ok(())
}
