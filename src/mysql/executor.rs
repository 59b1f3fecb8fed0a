// ABOUTME: QueryExecutor implementation for live mysql_async connections
// ABOUTME: Streams binary-protocol rows and replays statements over the text protocol

use crate::executor::{QueryExecutor, RowVisitor};
use crate::migration::value::SqlValue;
use crate::mysql::converter::{mysql_row_to_values, to_params};
use anyhow::Result;
use async_trait::async_trait;
use mysql_async::{prelude::*, Conn};

#[async_trait]
impl QueryExecutor for Conn {
    async fn query(
        &mut self,
        sql: &str,
        params: &[SqlValue],
        visitor: &mut (dyn RowVisitor + Send),
    ) -> Result<()> {
        // Binary protocol so numbers and dates arrive typed
        let mut result = self.exec_iter(sql, to_params(params)).await?;

        let columns: Vec<String> = result
            .columns_ref()
            .iter()
            .map(|column| column.name_str().into_owned())
            .collect();
        visitor.columns(&columns)?;

        while let Some(row) = result.next().await? {
            visitor.row(mysql_row_to_values(row))?;
        }
        result.drop_result().await?;

        Ok(())
    }

    async fn exec(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        if params.is_empty() {
            // Text protocol: USE, SET and most DDL cannot be prepared
            self.query_drop(sql).await?;
        } else {
            self.exec_drop(sql, to_params(params)).await?;
        }
        Ok(self.affected_rows())
    }
}
