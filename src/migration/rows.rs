// ABOUTME: Batched row serializer turning a table scan into multi-row INSERTs
// ABOUTME: Flushes a statement every batch_size rows to bound memory and count

use crate::error::MigrationError;
use crate::executor::{QueryExecutor, RowVisitor};
use crate::migration::value::{encode_value, SqlValue};
use crate::utils::quote_identifier;
use anyhow::{Context, Result};
use std::io::Write;

/// Rows per INSERT statement unless the caller asks otherwise
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Per-table state while rows stream in
///
/// Holds the statement being built, the rows added since the last flush and
/// the running total. The column list is rendered once from the result set's
/// metadata, in source order.
pub struct BatchAccumulator<'a, W: Write> {
    out: &'a mut W,
    insert_prefix: String,
    table_ident: String,
    statement: String,
    batch_size: usize,
    batch_count: usize,
    total: u64,
}

impl<'a, W: Write> BatchAccumulator<'a, W> {
    pub fn new(out: &'a mut W, table: &str, batch_size: usize) -> Self {
        Self {
            out,
            insert_prefix: String::new(),
            table_ident: quote_identifier(table),
            statement: String::new(),
            batch_size,
            batch_count: 0,
            total: 0,
        }
    }

    /// Rows added so far, flushed or not
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Write the pending statement, if any, terminated by `;\n`
    pub fn flush(&mut self) -> Result<()> {
        if self.batch_count == 0 {
            return Ok(());
        }
        self.statement.push_str(";\n");
        self.out
            .write_all(self.statement.as_bytes())
            .context("Failed to write INSERT batch")?;
        self.statement.clear();
        self.batch_count = 0;
        Ok(())
    }

    /// Flush the final partial batch and report the row total
    pub fn finish(mut self) -> Result<u64> {
        self.flush()?;
        Ok(self.total)
    }
}

impl<W: Write> RowVisitor for BatchAccumulator<'_, W> {
    fn columns(&mut self, columns: &[String]) -> Result<()> {
        let column_list = columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        self.insert_prefix = format!(
            "INSERT INTO {} ({}) VALUES ",
            self.table_ident, column_list
        );
        Ok(())
    }

    fn row(&mut self, values: Vec<SqlValue>) -> Result<()> {
        // Literals are built from the owned row, never from a reused buffer
        let literals = values.iter().map(encode_value).collect::<Vec<_>>().join(", ");

        if self.batch_count == 0 {
            self.statement.push_str(&self.insert_prefix);
        } else {
            self.statement.push_str(", ");
        }
        self.statement.push('(');
        self.statement.push_str(&literals);
        self.statement.push(')');
        self.batch_count += 1;
        self.total += 1;

        if self.batch_count >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }
}

/// Stream every row of `db.table` into batched INSERT statements
///
/// A statement is flushed each time `batch_size` rows have accumulated, and
/// once more at the end for any remainder, so N rows yield `ceil(N / B)`
/// statements and an empty table yields none. Returns the number of rows
/// written.
///
/// # Errors
///
/// A zero batch size is a validation error. Query and write failures abort
/// the table; statements already flushed stay in `out`.
pub async fn write_table_data<E, W>(
    executor: &mut E,
    db_name: &str,
    table: &str,
    batch_size: usize,
    out: &mut W,
) -> Result<u64>
where
    E: QueryExecutor + ?Sized,
    W: Write + Send,
{
    if batch_size == 0 {
        return Err(MigrationError::validation("batch size must be at least 1").into());
    }

    let sql = format!(
        "SELECT * FROM {}.{}",
        quote_identifier(db_name),
        quote_identifier(table)
    );

    let mut batch = BatchAccumulator::new(out, table, batch_size);
    executor.query(&sql, &[], &mut batch).await?;
    let total = batch.finish()?;

    tracing::debug!("Wrote {} row(s) of '{}.{}'", total, db_name, table);
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::ScriptedExecutor;

    fn table_with_rows(n: i64) -> ScriptedExecutor {
        let rows = (1..=n)
            .map(|i| vec![SqlValue::Int(i), SqlValue::Text(format!("name{}", i))])
            .collect();
        ScriptedExecutor::new().with_result("SELECT * FROM `shop`.`t`", &["id", "name"], rows)
    }

    async fn dump(n: i64, batch: usize) -> (u64, String) {
        let mut exec = table_with_rows(n);
        let mut out = Vec::new();
        let total = write_table_data(&mut exec, "shop", "t", batch, &mut out)
            .await
            .unwrap();
        (total, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_statement_count_is_ceil_of_rows_over_batch() {
        for (n, b) in [(0, 3), (1, 3), (3, 3), (4, 3), (7, 2), (10, 1), (5, 500)] {
            let (total, text) = dump(n, b).await;
            let statements = text.matches(";\n").count();
            let expected = (n as usize).div_ceil(b);
            assert_eq!(total, n as u64);
            assert_eq!(statements, expected, "n={} b={}", n, b);
            assert_eq!(text.matches("INSERT INTO").count(), expected);
        }
    }

    #[tokio::test]
    async fn test_rows_keep_source_order_across_batches() {
        let (_, text) = dump(5, 2).await;
        assert_eq!(
            text,
            "INSERT INTO `t` (`id`, `name`) VALUES (1, 'name1'), (2, 'name2');\n\
             INSERT INTO `t` (`id`, `name`) VALUES (3, 'name3'), (4, 'name4');\n\
             INSERT INTO `t` (`id`, `name`) VALUES (5, 'name5');\n"
        );
    }

    #[tokio::test]
    async fn test_empty_table_writes_nothing() {
        let (total, text) = dump(0, 500).await;
        assert_eq!(total, 0);
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_rejected() {
        let mut exec = table_with_rows(1);
        let mut out = Vec::new();
        let err = write_table_data(&mut exec, "shop", "t", 0, &mut out)
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<MigrationError>().unwrap().is_validation());
        assert!(exec.queries.is_empty());
    }

    #[tokio::test]
    async fn test_mixed_values_are_encoded() {
        let mut exec = ScriptedExecutor::new().with_result(
            "SELECT * FROM `shop`.`blobs`",
            &["id", "payload", "note"],
            vec![vec![
                SqlValue::UInt(9),
                SqlValue::Bytes(vec![0x00, 0xff]),
                SqlValue::Null,
            ]],
        );
        let mut out = Vec::new();
        write_table_data(&mut exec, "shop", "blobs", 10, &mut out)
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "INSERT INTO `blobs` (`id`, `payload`, `note`) VALUES (9, 0x00ff, NULL);\n"
        );
    }

    #[tokio::test]
    async fn test_query_error_propagates() {
        let mut exec = ScriptedExecutor::new().failing_on("`locked`", "Lock wait timeout exceeded");
        let mut out = Vec::new();
        let err = write_table_data(&mut exec, "shop", "locked", 10, &mut out)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Lock wait timeout exceeded");
    }
}
