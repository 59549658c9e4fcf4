//! Persistent command history.
//!
//! Stored as a JSON array of strings. Loading is tolerant: a missing or
//! corrupt file yields an empty history rather than an error, because
//! history is a convenience, not session state.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use agent_config::ConfigError;

/// At most this many entries are persisted; older ones age out.
pub const MAX_SAVED_ENTRIES: usize = 50;

#[derive(Debug)]
pub struct CommandHistory {
    path: PathBuf,
    entries: Vec<String>,
}

impl CommandHistory {
    /// Loads history from `path`, tolerating absence and corruption.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str::<Vec<String>>(&raw).ok())
            .unwrap_or_default();
        Self { path, entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Records `entry` and persists. Repeated entries are ignored so the
    /// history stays a list of distinct commands.
    pub fn record(&mut self, entry: &str) -> Result<(), ConfigError> {
        if self.entries.iter().any(|existing| existing == entry) {
            return Ok(());
        }
        self.entries.push(entry.to_string());
        self.save()
    }

    fn save(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        let unique: Vec<&String> = self
            .entries
            .iter()
            .filter(|entry| seen.insert(entry.as_str()))
            .collect();
        let start = unique.len().saturating_sub(MAX_SAVED_ENTRIES);
        let to_save = &unique[start..];

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::io("creating state directory", parent, source))?;
        }
        let rendered = serde_json::to_string_pretty(to_save)
            .map_err(|source| ConfigError::json_serialize(&self.path, source))?;
        fs::write(&self.path, rendered)
            .map_err(|source| ConfigError::io("writing history file", &self.path, source))
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandHistory, MAX_SAVED_ENTRIES};

    #[test]
    fn missing_file_loads_as_empty_history() {
        let dir = tempfile::tempdir().expect("tempdir");
        let history = CommandHistory::load(dir.path().join("history.json"));
        assert!(history.entries().is_empty());
    }

    #[test]
    fn corrupt_file_loads_as_empty_history() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json").expect("write corrupt file");

        let history = CommandHistory::load(&path);
        assert!(history.entries().is_empty());
    }

    #[test]
    fn record_persists_and_reload_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.json");

        let mut history = CommandHistory::load(&path);
        history.record("/agent build it").expect("record");
        history.record("/chat hello").expect("record");

        let reloaded = CommandHistory::load(&path);
        assert_eq!(
            reloaded.entries(),
            ["/agent build it".to_string(), "/chat hello".to_string()]
        );
    }

    #[test]
    fn duplicate_entries_are_recorded_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.json");

        let mut history = CommandHistory::load(&path);
        history.record("ls").expect("record");
        history.record("ls").expect("record");

        assert_eq!(history.entries(), ["ls".to_string()]);
    }

    #[test]
    fn saved_history_is_capped_to_the_most_recent_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.json");

        let mut history = CommandHistory::load(&path);
        for index in 0..(MAX_SAVED_ENTRIES + 10) {
            history.record(&format!("command {index}")).expect("record");
        }

        let reloaded = CommandHistory::load(&path);
        assert_eq!(reloaded.entries().len(), MAX_SAVED_ENTRIES);
        assert_eq!(reloaded.entries()[0], "command 10");
        assert_eq!(
            reloaded.entries()[MAX_SAVED_ENTRIES - 1],
            format!("command {}", MAX_SAVED_ENTRIES + 9)
        );
    }
}
