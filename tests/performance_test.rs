// ABOUTME: Performance benchmarks for the batched serializer and the replayer
// ABOUTME: Generates large synthetic tables in memory; run with --ignored

use anyhow::{bail, Result};
use async_trait::async_trait;
use mysql_dump_migrator::executor::{QueryExecutor, RowVisitor};
use mysql_dump_migrator::migration::{replay_dump, write_table_data, SqlValue};
use mysql_dump_migrator::progress::{ProgressLog, MIGRATION_CHANNEL};
use std::time::Instant;

/// Streams `rows` synthetic rows without holding them in memory
struct SyntheticTable {
    rows: u64,
}

#[async_trait]
impl QueryExecutor for SyntheticTable {
    async fn query(
        &mut self,
        sql: &str,
        _params: &[SqlValue],
        visitor: &mut (dyn RowVisitor + Send),
    ) -> Result<()> {
        if !sql.starts_with("SELECT * FROM") {
            bail!("unexpected query: {}", sql);
        }
        visitor.columns(&[
            "id".to_string(),
            "name".to_string(),
            "payload".to_string(),
            "score".to_string(),
        ])?;
        for i in 0..self.rows {
            visitor.row(vec![
                SqlValue::UInt(i),
                SqlValue::Text(format!("user-{}'s name", i)),
                SqlValue::Bytes(vec![(i % 256) as u8; 32]),
                SqlValue::Float(i as f64 / 3.0),
            ])?;
        }
        Ok(())
    }

    async fn exec(&mut self, _sql: &str, _params: &[SqlValue]) -> Result<u64> {
        Ok(1)
    }
}

#[tokio::test]
#[ignore]
async fn test_serializer_throughput() {
    for (rows, batch) in [(100_000u64, 500usize), (100_000, 1), (1_000_000, 500)] {
        let mut table = SyntheticTable { rows };
        let mut out = Vec::with_capacity(64 * 1024 * 1024);

        let start = Instant::now();
        let total = write_table_data(&mut table, "bench", "t", batch, &mut out)
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert_eq!(total, rows);
        let statements = out.windows(2).filter(|w| w == b";\n").count() as u64;
        assert_eq!(statements, rows.div_ceil(batch as u64));

        println!(
            "{} rows, batch {}: {:?} ({:.0} rows/s, {} bytes)",
            rows,
            batch,
            elapsed,
            rows as f64 / elapsed.as_secs_f64(),
            out.len()
        );
    }
}

#[tokio::test]
#[ignore]
async fn test_replay_throughput() {
    let mut table = SyntheticTable { rows: 200_000 };
    let mut out = Vec::new();
    write_table_data(&mut table, "bench", "t", 100, &mut out)
        .await
        .unwrap();
    let text = String::from_utf8(out).unwrap();

    let start = Instant::now();
    let report = replay_dump(&mut table, "bench", &text, &ProgressLog::silent(MIGRATION_CHANNEL))
        .await
        .unwrap();
    println!(
        "Replayed {} statements in {:?}",
        report.statements_executed,
        start.elapsed()
    );
    assert_eq!(report.statements_executed, 2_000);
}
