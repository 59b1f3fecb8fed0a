// ABOUTME: Query executor seam between the dump engine and a database driver
// ABOUTME: Streams result rows to visitors and runs statements for replay

use crate::migration::value::SqlValue;
use anyhow::Result;
use async_trait::async_trait;

/// Receives the rows of one query as they are read.
///
/// `columns` is called exactly once before any `row` call, even when the
/// result set is empty. Returning an error from either method stops the scan
/// and the executor hands that error back to the caller.
pub trait RowVisitor {
    fn columns(&mut self, columns: &[String]) -> Result<()>;
    fn row(&mut self, values: Vec<SqlValue>) -> Result<()>;
}

/// Capability the dump engine needs from a database connection
#[async_trait]
pub trait QueryExecutor: Send {
    /// Run a row-returning statement and stream its rows to `visitor`
    async fn query(
        &mut self,
        sql: &str,
        params: &[SqlValue],
        visitor: &mut (dyn RowVisitor + Send),
    ) -> Result<()>;

    /// Run a statement that returns no rows; yields the affected row count
    async fn exec(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64>;
}

/// Fully materialized result of a small query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl RowVisitor for RowSet {
    fn columns(&mut self, columns: &[String]) -> Result<()> {
        self.columns = columns.to_vec();
        Ok(())
    }

    fn row(&mut self, values: Vec<SqlValue>) -> Result<()> {
        self.rows.push(values);
        Ok(())
    }
}

/// Run a query and keep every row in memory. Only for metadata-sized results.
pub async fn collect_rows<E>(executor: &mut E, sql: &str, params: &[SqlValue]) -> Result<RowSet>
where
    E: QueryExecutor + ?Sized,
{
    let mut set = RowSet::default();
    executor.query(sql, params, &mut set).await?;
    Ok(set)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-memory executor for unit tests

    use super::*;
    use anyhow::bail;
    use std::collections::HashMap;

    #[derive(Debug, Default)]
    pub struct ScriptedExecutor {
        results: HashMap<String, RowSet>,
        failures: HashMap<String, String>,
        pub queries: Vec<String>,
        pub executed: Vec<String>,
        pub affected_per_exec: u64,
    }

    impl ScriptedExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_result(mut self, sql: &str, columns: &[&str], rows: Vec<Vec<SqlValue>>) -> Self {
            self.results.insert(
                sql.to_string(),
                RowSet {
                    columns: columns.iter().map(|c| c.to_string()).collect(),
                    rows,
                },
            );
            self
        }

        /// Make any query or statement whose text contains `needle` fail
        pub fn failing_on(mut self, needle: &str, message: &str) -> Self {
            self.failures.insert(needle.to_string(), message.to_string());
            self
        }

        fn check_failure(&self, sql: &str) -> Result<()> {
            for (needle, message) in &self.failures {
                if sql.contains(needle.as_str()) {
                    bail!("{}", message);
                }
            }
            Ok(())
        }
    }

    #[async_trait]
    impl QueryExecutor for ScriptedExecutor {
        async fn query(
            &mut self,
            sql: &str,
            _params: &[SqlValue],
            visitor: &mut (dyn RowVisitor + Send),
        ) -> Result<()> {
            self.queries.push(sql.to_string());
            self.check_failure(sql)?;
            let Some(set) = self.results.get(sql) else {
                bail!("Table '{}' doesn't exist", sql);
            };
            visitor.columns(&set.columns)?;
            for row in set.rows.clone() {
                visitor.row(row)?;
            }
            Ok(())
        }

        async fn exec(&mut self, sql: &str, _params: &[SqlValue]) -> Result<u64> {
            self.check_failure(sql)?;
            self.executed.push(sql.to_string());
            Ok(self.affected_per_exec)
        }
    }
}
