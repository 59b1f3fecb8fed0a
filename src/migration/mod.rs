// ABOUTME: Dump and migration engine module
// ABOUTME: Value encoding, schema/data serialization, dump filtering, and replay

pub mod dump;
pub mod estimation;
pub mod external;
pub mod filter;
pub mod migrate;
pub mod replay;
pub mod rows;
pub mod schema;
pub mod value;

pub use dump::{dump_to, export_dump, DataSource, DumpMode, DumpRequest, DumpSummary};
pub use estimation::{estimate_selection, format_bytes, format_duration, SelectionEstimate};
pub use external::{dump_data_with_mysqldump, run_mysqldump, MysqldumpOptions};
pub use filter::filter_dump;
pub use migrate::{migrate, migrate_with, MigrationOutcome, MigrationPlan, MigrationStatus};
pub use replay::{extract_table_name, replay_dump, split_statements, ReplayReport};
pub use rows::{write_table_data, BatchAccumulator, DEFAULT_BATCH_SIZE};
pub use schema::write_schema;
pub use value::{encode_value, escape_sql_string, SqlValue};
