// ABOUTME: Size and duration estimates for a table selection
// ABOUTME: Sums information_schema statistics so users see the cost before dumping

use crate::mysql::reader::TableStat;
use std::time::Duration;

/// Rough throughput of a native dump plus replay, in bytes per hour
const BYTES_PER_HOUR: f64 = 10.0 * 1024.0 * 1024.0 * 1024.0;

/// Totals for the tables an operation will touch
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionEstimate {
    pub tables: usize,
    /// Sum of the server's row estimates (InnoDB counts are approximate)
    pub rows: i64,
    pub size_bytes: i64,
    pub size_human: String,
    pub estimated_duration: Duration,
}

/// Estimate the cost of the tables named in `selected`
///
/// An empty selection means every table in `stats`. Names without
/// statistics are counted as tables with zero rows and bytes.
pub fn estimate_selection(stats: &[TableStat], selected: &[String]) -> SelectionEstimate {
    let chosen: Vec<&TableStat> = if selected.is_empty() {
        stats.iter().collect()
    } else {
        stats
            .iter()
            .filter(|s| selected.iter().any(|t| t == &s.name))
            .collect()
    };

    let rows = chosen.iter().map(|s| s.rows.max(0)).sum();
    let size_bytes = chosen.iter().map(|s| s.size_bytes.max(0)).sum();
    let tables = if selected.is_empty() {
        stats.len()
    } else {
        selected.len()
    };

    SelectionEstimate {
        tables,
        rows,
        size_bytes,
        size_human: format_bytes(size_bytes),
        estimated_duration: estimate_duration(size_bytes),
    }
}

fn estimate_duration(size_bytes: i64) -> Duration {
    let hours = size_bytes.max(0) as f64 / BYTES_PER_HOUR;
    Duration::from_secs_f64(hours * 3600.0)
}

/// Human-readable size in binary units, one decimal above a kilobyte
///
/// ```
/// # use mysql_dump_migrator::migration::estimation::format_bytes;
/// assert_eq!(format_bytes(1536), "1.5 KB");
/// assert_eq!(format_bytes(-1), "0 B");
/// ```
pub fn format_bytes(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    let bytes = bytes.max(0) as u64;
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    // floor(log2) / 10 picks the largest power of 1024 not above the value
    let exp = ((63 - bytes.leading_zeros()) / 10).min(UNITS.len() as u32);
    let scaled = bytes as f64 / (1u64 << (10 * exp)) as f64;
    format!("{:.1} {}", scaled, UNITS[exp as usize - 1])
}

/// Compact duration: `42s`, `3m 05s`, `27h 40m`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    match secs {
        0..=59 => format!("{}s", secs),
        60..=3599 => format!("{}m {:02}s", secs / 60, secs % 60),
        _ => format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60),
    }
}
