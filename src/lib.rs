// ABOUTME: Library module for mysql-dump-migrator
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod interactive;
pub mod migration;
pub mod mysql;
pub mod profiles;
pub mod progress;
pub mod utils;
