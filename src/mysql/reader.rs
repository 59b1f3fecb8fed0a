// ABOUTME: MySQL schema introspection through the query executor seam
// ABOUTME: Lists databases and base tables, table sizes, and CREATE TABLE text

use crate::executor::{collect_rows, QueryExecutor};
use crate::migration::value::SqlValue;
use crate::utils::quote_identifier;
use anyhow::{bail, Context, Result};

pub(crate) const LIST_TABLES_SQL: &str = "SELECT TABLE_NAME FROM information_schema.tables \
     WHERE table_schema = ? AND table_type = 'BASE TABLE'";

const TABLE_STATS_SQL: &str = "SELECT TABLE_NAME, TABLE_ROWS, DATA_LENGTH, INDEX_LENGTH \
     FROM information_schema.tables \
     WHERE table_schema = ? AND table_type = 'BASE TABLE'";

/// Size information for one base table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStat {
    pub name: String,
    /// Server estimate, not an exact count
    pub rows: i64,
    /// Data plus index length
    pub size_bytes: i64,
}

/// List every schema visible to the connected user
pub async fn list_databases<E>(executor: &mut E) -> Result<Vec<String>>
where
    E: QueryExecutor + ?Sized,
{
    let set = collect_rows(executor, "SHOW DATABASES", &[])
        .await
        .context("Failed to list databases")?;

    Ok(set
        .rows
        .iter()
        .filter_map(|row| row.first().and_then(SqlValue::as_text))
        .collect())
}

/// List the base tables of a schema in the order the server reports them
///
/// # Examples
///
/// ```no_run
/// # use mysql_dump_migrator::connection::ConnectionDescriptor;
/// # use mysql_dump_migrator::mysql::reader::list_tables;
/// # async fn example() -> anyhow::Result<()> {
/// let mut conn = ConnectionDescriptor::from_url("mysql://root@localhost/shop")?
///     .connect()
///     .await?;
/// let tables = list_tables(&mut conn, "shop").await?;
/// println!("Found {} tables", tables.len());
/// # Ok(())
/// # }
/// ```
pub async fn list_tables<E>(executor: &mut E, db_name: &str) -> Result<Vec<String>>
where
    E: QueryExecutor + ?Sized,
{
    tracing::debug!("Listing base tables of '{}'", db_name);

    let set = collect_rows(executor, LIST_TABLES_SQL, &[SqlValue::from(db_name)])
        .await
        .with_context(|| format!("Failed to list tables from database '{}'", db_name))?;

    let tables: Vec<String> = set
        .rows
        .iter()
        .filter_map(|row| row.first().and_then(SqlValue::as_text))
        .collect();

    tracing::debug!("Found {} table(s) in '{}'", tables.len(), db_name);
    Ok(tables)
}

/// Estimated rows and on-disk size of every base table. NULL sizes count as zero.
pub async fn table_stats<E>(executor: &mut E, db_name: &str) -> Result<Vec<TableStat>>
where
    E: QueryExecutor + ?Sized,
{
    let set = collect_rows(executor, TABLE_STATS_SQL, &[SqlValue::from(db_name)])
        .await
        .with_context(|| format!("Failed to read table statistics for '{}'", db_name))?;

    let stats = set
        .rows
        .iter()
        .filter_map(|row| {
            let name = row.first()?.as_text()?;
            let number = |idx: usize| row.get(idx).and_then(SqlValue::as_i64).unwrap_or(0);
            Some(TableStat {
                name,
                rows: number(1),
                size_bytes: number(2) + number(3),
            })
        })
        .collect();

    Ok(stats)
}

/// The server's own CREATE TABLE statement for one table, without terminator
pub async fn show_create_table<E>(executor: &mut E, db_name: &str, table: &str) -> Result<String>
where
    E: QueryExecutor + ?Sized,
{
    let sql = format!(
        "SHOW CREATE TABLE {}.{}",
        quote_identifier(db_name),
        quote_identifier(table)
    );
    let set = collect_rows(executor, &sql, &[]).await?;

    let Some(row) = set.rows.first() else {
        bail!("SHOW CREATE TABLE returned no rows for '{}.{}'", db_name, table);
    };
    match row.get(1).and_then(SqlValue::as_text) {
        Some(ddl) => Ok(ddl),
        None => bail!(
            "SHOW CREATE TABLE returned no statement for '{}.{}'",
            db_name,
            table
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::ScriptedExecutor;

    #[tokio::test]
    async fn test_list_tables_keeps_server_order() {
        let mut exec = ScriptedExecutor::new().with_result(
            LIST_TABLES_SQL,
            &["TABLE_NAME"],
            vec![
                vec![SqlValue::from("zeta")],
                vec![SqlValue::Bytes(b"alpha".to_vec())],
            ],
        );
        let tables = list_tables(&mut exec, "shop").await.unwrap();
        assert_eq!(tables, vec!["zeta", "alpha"]);
    }

    #[tokio::test]
    async fn test_table_stats_sums_sizes_and_tolerates_nulls() {
        let mut exec = ScriptedExecutor::new().with_result(
            TABLE_STATS_SQL,
            &["TABLE_NAME", "TABLE_ROWS", "DATA_LENGTH", "INDEX_LENGTH"],
            vec![
                vec![
                    SqlValue::from("users"),
                    SqlValue::UInt(10),
                    SqlValue::UInt(16384),
                    SqlValue::UInt(4096),
                ],
                vec![SqlValue::from("empty"), SqlValue::Null, SqlValue::Null, SqlValue::Null],
            ],
        );
        let stats = table_stats(&mut exec, "shop").await.unwrap();
        assert_eq!(
            stats[0],
            TableStat {
                name: "users".into(),
                rows: 10,
                size_bytes: 20480
            }
        );
        assert_eq!(stats[1].rows, 0);
        assert_eq!(stats[1].size_bytes, 0);
    }

    #[tokio::test]
    async fn test_show_create_table_returns_second_column() {
        let mut exec = ScriptedExecutor::new().with_result(
            "SHOW CREATE TABLE `shop`.`users`",
            &["Table", "Create Table"],
            vec![vec![
                SqlValue::from("users"),
                SqlValue::from("CREATE TABLE `users` (\n  `id` int\n)"),
            ]],
        );
        let ddl = show_create_table(&mut exec, "shop", "users").await.unwrap();
        assert!(ddl.starts_with("CREATE TABLE `users`"));
    }

    #[tokio::test]
    async fn test_show_create_table_propagates_error() {
        let mut exec = ScriptedExecutor::new();
        let err = show_create_table(&mut exec, "shop", "ghost").await.unwrap_err();
        assert!(err.to_string().contains("doesn't exist"));
    }
}
