// ABOUTME: Parses migration job files and resolves connection references
// ABOUTME: Converts TOML jobs into MigrationPlan values using saved profiles

use crate::connection::ConnectionDescriptor;
use crate::error::MigrationError;
use crate::migration::{DumpMode, MigrationPlan, DEFAULT_BATCH_SIZE};
use crate::profiles::ProfileStore;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A connection in a job file: a profile name, a `mysql://` URL, or inline fields
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EndpointConfig {
    Reference(String),
    Inline(ConnectionDescriptor),
}

#[derive(Debug, Clone, Deserialize)]
pub struct MigrationJob {
    pub source: EndpointConfig,
    pub target: EndpointConfig,
    pub source_database: String,
    pub target_database: String,
    #[serde(default = "default_mode")]
    pub mode: DumpMode,
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_mode() -> DumpMode {
    DumpMode::Both
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Resolve a `mysql://` URL or the name/id of a saved profile
pub fn resolve_connection(reference: &str, store: &ProfileStore) -> Result<ConnectionDescriptor> {
    if reference.starts_with("mysql://") {
        return ConnectionDescriptor::from_url(reference);
    }
    match store.find(reference) {
        Some(profile) => Ok(profile.descriptor()),
        None => Err(MigrationError::validation(format!(
            "'{}' is neither a mysql:// URL nor a saved connection",
            reference
        ))
        .into()),
    }
}

impl EndpointConfig {
    pub fn resolve(&self, store: &ProfileStore) -> Result<ConnectionDescriptor> {
        match self {
            EndpointConfig::Reference(reference) => resolve_connection(reference, store),
            EndpointConfig::Inline(descriptor) => Ok(descriptor.clone()),
        }
    }
}

impl MigrationJob {
    pub fn into_plan(self, store: &ProfileStore) -> Result<MigrationPlan> {
        let source = self
            .source
            .resolve(store)
            .context("Failed to resolve job source")?
            .with_database(self.source_database);
        let target = self
            .target
            .resolve(store)
            .context("Failed to resolve job target")?
            .with_database(self.target_database);

        Ok(MigrationPlan::new(source, target, self.mode)
            .with_tables(self.tables)
            .with_batch_size(self.batch_size))
    }
}

pub fn load_migration_job(path: &Path) -> Result<MigrationJob> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read job file at {}", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("Failed to parse TOML job file at {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::ConnectionProfile;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn store() -> ProfileStore {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ProfileStore::load(dir.path()).unwrap();
        store
            .add(ConnectionProfile {
                name: "prod".into(),
                host: "prod.db".into(),
                port: 3306,
                user: "app".into(),
                ..Default::default()
            })
            .unwrap();
        store
    }

    #[test]
    fn test_parse_sample_job() {
        let mut tmp = NamedTempFile::new().unwrap();
        let contents = r#"
            source = "prod"
            source_database = "shop"
            target_database = "shop_copy"
            mode = "schema"
            tables = ["users", "orders"]
            batch_size = 100

            [target]
            host = "127.0.0.1"
            port = 3307
            user = "root"
        "#;
        write!(tmp, "{}", contents).unwrap();

        let job = load_migration_job(tmp.path()).unwrap();
        let plan = job.into_plan(&store()).unwrap();
        assert_eq!(plan.source.host, "prod.db");
        assert_eq!(plan.source.database, "shop");
        assert_eq!(plan.target.port, 3307);
        assert_eq!(plan.target.database, "shop_copy");
        assert_eq!(plan.mode, DumpMode::Schema);
        assert_eq!(plan.tables, vec!["users", "orders"]);
        assert_eq!(plan.batch_size, 100);
    }

    #[test]
    fn test_defaults_apply() {
        let job: MigrationJob = toml::from_str(
            r#"
            source = "mysql://root@a:3306"
            target = "mysql://root@b:3306"
            source_database = "x"
            target_database = "y"
            "#,
        )
        .unwrap();
        let plan = job.into_plan(&store()).unwrap();
        assert_eq!(plan.mode, DumpMode::Both);
        assert!(plan.tables.is_empty());
        assert_eq!(plan.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(plan.target.host, "b");
    }

    #[test]
    fn test_unknown_reference_is_rejected() {
        let err = resolve_connection("staging", &store()).unwrap_err();
        assert!(err.downcast_ref::<MigrationError>().unwrap().is_validation());
    }
}
