// ABOUTME: Command implementations for the CLI
// ABOUTME: Exports dump, filter, migrate, introspection, and profile commands

pub mod dump;
pub mod filter;
pub mod migrate;
pub mod profile;
mod spinner;
pub mod tables;

pub use dump::{dump, DumpOptions};
pub use filter::filter;
pub use migrate::migrate;
pub use spinner::SpinnerSink;
pub use tables::{databases, tables, test_connection};
