// ABOUTME: Saved connection profiles and application settings on disk
// ABOUTME: Explicit load/persist of connections.json and settings.json with atomic writes

use crate::connection::ConnectionDescriptor;
use crate::error::MigrationError;
use anyhow::{Context, Result};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "mysql-dump-migrator";
const CONNECTIONS_FILE: &str = "connections.json";
const SETTINGS_FILE: &str = "settings.json";

/// A named, saved connection
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: String,
}

impl std::fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

impl ConnectionProfile {
    pub fn descriptor(&self) -> ConnectionDescriptor {
        ConnectionDescriptor::new(
            self.host.clone(),
            self.port,
            self.user.clone(),
            self.password.clone(),
            self.database.clone(),
        )
    }

    fn check_required(&self) -> Result<()> {
        if self.name.trim().is_empty()
            || self.host.trim().is_empty()
            || self.port == 0
            || self.user.trim().is_empty()
        {
            return Err(
                MigrationError::validation("name, host, port and user are required").into(),
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub mysqldump_path: String,
}

impl AppSettings {
    /// Configured mysqldump path, if one is set
    pub fn mysqldump_path(&self) -> Option<&str> {
        let path = self.mysqldump_path.trim();
        (!path.is_empty()).then_some(path)
    }
}

/// Saved profiles and settings rooted at one directory
///
/// Nothing is written until `persist` is called.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
    profiles: Vec<ConnectionProfile>,
    settings: AppSettings,
}

/// `<user config dir>/mysql-dump-migrator`
pub fn default_store_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine the user config directory")?;
    Ok(base.join(APP_DIR))
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).map_err(|e| {
        MigrationError::encoding(format!("Failed to parse {}: {}", path.display(), e)).into()
    })
}

fn write_json<T: Serialize>(dir: &Path, file_name: &str, value: &T) -> Result<()> {
    let path = dir.join(file_name);
    // NamedTempFile is created owner-only (0600) on Unix and keeps that mode on persist
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    serde_json::to_writer_pretty(tmp.as_file_mut(), value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    tmp.persist(&path)
        .with_context(|| format!("Failed to persist {}", path.display()))?;
    Ok(())
}

fn generate_id() -> String {
    format!("{:016x}", rand::thread_rng().gen::<u64>())
}

impl ProfileStore {
    /// Load from `dir`; missing files mean an empty store
    pub fn load(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let profiles = read_json(&dir.join(CONNECTIONS_FILE))?;
        let settings = read_json(&dir.join(SETTINGS_FILE))?;
        Ok(Self {
            dir,
            profiles,
            settings,
        })
    }

    pub fn load_default() -> Result<Self> {
        Self::load(default_store_dir()?)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write both files atomically
    pub fn persist(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        write_json(&self.dir, CONNECTIONS_FILE, &self.profiles)?;
        write_json(&self.dir, SETTINGS_FILE, &self.settings)?;
        tracing::debug!("Saved profiles to {}", self.dir.display());
        Ok(())
    }

    pub fn profiles(&self) -> &[ConnectionProfile] {
        &self.profiles
    }

    /// Look a profile up by name, then by id
    pub fn find(&self, name_or_id: &str) -> Option<&ConnectionProfile> {
        self.profiles
            .iter()
            .find(|p| p.name == name_or_id)
            .or_else(|| self.profiles.iter().find(|p| p.id == name_or_id))
    }

    /// Add a profile, returning its id
    pub fn add(&mut self, mut profile: ConnectionProfile) -> Result<String> {
        profile.check_required()?;
        if self.profiles.iter().any(|p| p.name == profile.name) {
            return Err(MigrationError::validation(format!(
                "a connection named '{}' already exists",
                profile.name
            ))
            .into());
        }
        if profile.id.trim().is_empty() {
            profile.id = generate_id();
        }
        let id = profile.id.clone();
        self.profiles.push(profile);
        Ok(id)
    }

    /// Replace the profile with the same id
    pub fn update(&mut self, profile: ConnectionProfile) -> Result<()> {
        if profile.id.trim().is_empty() {
            return Err(MigrationError::validation("connection id is required").into());
        }
        profile.check_required()?;
        if self
            .profiles
            .iter()
            .any(|p| p.name == profile.name && p.id != profile.id)
        {
            return Err(MigrationError::validation(format!(
                "a connection named '{}' already exists",
                profile.name
            ))
            .into());
        }
        let Some(slot) = self.profiles.iter_mut().find(|p| p.id == profile.id) else {
            anyhow::bail!("No saved connection with id '{}'", profile.id);
        };
        *slot = profile;
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<ConnectionProfile> {
        if id.trim().is_empty() {
            return Err(MigrationError::validation("connection id is required").into());
        }
        let Some(idx) = self.profiles.iter().position(|p| p.id == id) else {
            anyhow::bail!("No saved connection with id '{}'", id);
        };
        Ok(self.profiles.remove(idx))
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: AppSettings) {
        self.settings = settings;
    }
}
