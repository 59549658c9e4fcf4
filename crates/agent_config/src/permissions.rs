use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths::{permissions_file, state_root};

/// Coarse capability flags consulted before every tool side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    #[serde(default = "default_true")]
    pub allow_file_io: bool,
    #[serde(default = "default_true")]
    pub allow_code_execution: bool,
    #[serde(default = "default_true")]
    pub allow_auto_browse: bool,
    #[serde(default = "default_true")]
    pub allow_host_control: bool,
}

impl Default for PermissionSet {
    fn default() -> Self {
        Self {
            allow_file_io: true,
            allow_code_execution: true,
            allow_auto_browse: true,
            allow_host_control: true,
        }
    }
}

impl PermissionSet {
    /// Keyed lookup matching the `permissions.json` field names.
    /// Unknown keys are denied.
    #[must_use]
    pub fn is_allowed(&self, key: &str) -> bool {
        match key {
            "allow_file_io" => self.allow_file_io,
            "allow_code_execution" => self.allow_code_execution,
            "allow_auto_browse" => self.allow_auto_browse,
            "allow_host_control" => self.allow_host_control,
            _ => false,
        }
    }
}

/// Read-side permission interface consumed by the tool executor.
pub trait PermissionGate {
    fn is_allowed(&self, key: &str) -> bool;
}

impl PermissionGate for PermissionSet {
    fn is_allowed(&self, key: &str) -> bool {
        PermissionSet::is_allowed(self, key)
    }
}

/// File-backed permission source.
///
/// Every query re-reads `permissions.json`, so edits made between turns
/// take effect without restarting the session. Missing or unreadable files
/// resolve to the defaults.
#[derive(Debug, Clone)]
pub struct PermissionsStore {
    path: PathBuf,
}

impl PermissionsStore {
    /// Opens the store, writing a defaults file when none exists.
    pub fn open(cwd: &Path) -> Result<Self, ConfigError> {
        let path = permissions_file(cwd);
        if !path.exists() {
            let dir = state_root(cwd);
            fs::create_dir_all(&dir)
                .map_err(|source| ConfigError::io("creating state directory", &dir, source))?;
            let rendered = serde_json::to_string_pretty(&PermissionSet::default())
                .map_err(|source| ConfigError::json_serialize(&path, source))?;
            fs::write(&path, rendered)
                .map_err(|source| ConfigError::io("writing permissions file", &path, source))?;
        }

        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current permission flags; defaults when the file is missing or corrupt.
    #[must_use]
    pub fn load(&self) -> PermissionSet {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }
}

impl PermissionGate for PermissionsStore {
    fn is_allowed(&self, key: &str) -> bool {
        self.load().is_allowed(key)
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{PermissionGate, PermissionSet, PermissionsStore};

    #[test]
    fn open_creates_defaults_file_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PermissionsStore::open(dir.path()).expect("open should succeed");

        assert!(store.path().exists());
        assert!(store.is_allowed("allow_file_io"));
        assert!(store.is_allowed("allow_code_execution"));
    }

    #[test]
    fn external_edits_take_effect_on_next_query() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PermissionsStore::open(dir.path()).expect("open should succeed");
        assert!(store.is_allowed("allow_code_execution"));

        fs::write(
            store.path(),
            r#"{ "allow_code_execution": false }"#,
        )
        .expect("rewrite permissions");

        assert!(!store.is_allowed("allow_code_execution"));
        // Fields absent from the edited file keep their defaults.
        assert!(store.is_allowed("allow_file_io"));
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PermissionsStore::open(dir.path()).expect("open should succeed");

        fs::write(store.path(), "not json").expect("corrupt the file");
        assert_eq!(store.load(), PermissionSet::default());
    }

    #[test]
    fn unknown_permission_keys_are_denied() {
        assert!(!PermissionSet::default().is_allowed("allow_time_travel"));
    }
}
