// ABOUTME: profile and settings commands over the saved connection store
// ABOUTME: Every change is persisted immediately after it succeeds

use crate::profiles::{AppSettings, ConnectionProfile, ProfileStore};
use anyhow::{Context, Result};

pub fn list(store: &ProfileStore) {
    if store.profiles().is_empty() {
        println!("No saved connections ({})", store.dir().display());
        return;
    }
    for p in store.profiles() {
        let db = if p.database.is_empty() { "-" } else { p.database.as_str() };
        println!(
            "{}  {}  {}@{}:{}  {}",
            p.id, p.name, p.user, p.host, p.port, db
        );
    }
}

pub fn add(store: &mut ProfileStore, profile: ConnectionProfile) -> Result<String> {
    let name = profile.name.clone();
    let id = store.add(profile)?;
    store.persist().context("Failed to save connections")?;
    println!("✓ Saved connection '{}' ({})", name, id);
    Ok(id)
}

/// Apply `edit` to the profile named or identified by `name_or_id`
pub fn update<F>(store: &mut ProfileStore, name_or_id: &str, edit: F) -> Result<()>
where
    F: FnOnce(&mut ConnectionProfile),
{
    let mut profile = store
        .find(name_or_id)
        .cloned()
        .with_context(|| format!("No saved connection named '{}'", name_or_id))?;
    edit(&mut profile);
    store.update(profile)?;
    store.persist().context("Failed to save connections")?;
    println!("✓ Updated connection '{}'", name_or_id);
    Ok(())
}

pub fn remove(store: &mut ProfileStore, name_or_id: &str) -> Result<()> {
    let id = store
        .find(name_or_id)
        .map(|p| p.id.clone())
        .with_context(|| format!("No saved connection named '{}'", name_or_id))?;
    let removed = store.remove(&id)?;
    store.persist().context("Failed to save connections")?;
    println!("✓ Removed connection '{}'", removed.name);
    Ok(())
}

/// Show settings, or change the mysqldump path when one is given
pub fn settings(store: &mut ProfileStore, mysqldump_path: Option<String>) -> Result<()> {
    if let Some(path) = mysqldump_path {
        store.set_settings(AppSettings {
            mysqldump_path: path,
        });
        store.persist().context("Failed to save settings")?;
    }
    match store.settings().mysqldump_path() {
        Some(path) => println!("mysqldump path: {}", path),
        None => println!("mysqldump path: (search PATH)"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn profile() -> ConnectionProfile {
        ConnectionProfile {
            name: "prod".into(),
            host: "db".into(),
            port: 3306,
            user: "app".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_changes_are_persisted() {
        let dir = tempdir().unwrap();
        let mut store = ProfileStore::load(dir.path()).unwrap();
        add(&mut store, profile()).unwrap();
        update(&mut store, "prod", |p| p.port = 3307).unwrap();
        settings(&mut store, Some("/usr/bin/mysqldump".into())).unwrap();

        let reloaded = ProfileStore::load(dir.path()).unwrap();
        assert_eq!(reloaded.find("prod").unwrap().port, 3307);
        assert_eq!(reloaded.settings().mysqldump_path(), Some("/usr/bin/mysqldump"));

        let mut store = reloaded;
        remove(&mut store, "prod").unwrap();
        assert!(ProfileStore::load(dir.path()).unwrap().profiles().is_empty());
    }

    #[test]
    fn test_unknown_profile_is_an_error() {
        let dir = tempdir().unwrap();
        let mut store = ProfileStore::load(dir.path()).unwrap();
        assert!(remove(&mut store, "ghost").is_err());
        assert!(update(&mut store, "ghost", |_| {}).is_err());
    }
}
