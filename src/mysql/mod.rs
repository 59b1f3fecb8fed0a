// ABOUTME: MySQL adapter for the dump engine
// ABOUTME: Value conversion, executor implementation, and schema introspection

pub mod converter;
pub mod executor;
pub mod reader;

pub use reader::{list_databases, list_tables, show_create_table, table_stats, TableStat};
