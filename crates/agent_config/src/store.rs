use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::paths::{config_file, state_root};
use crate::schema::{AgentConfig, Provider};

/// Loads `config.json` once at startup and serves reads from memory.
///
/// Unlike permissions, the provider catalog is not re-read per query: model
/// resolution happens many times per agent run and the catalog is owned by
/// the operator, who restarts the session after editing it.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    config: AgentConfig,
}

impl ConfigStore {
    /// Opens the store. A missing file is created with defaults; a corrupt
    /// file is replaced by defaults (the original is overwritten, matching
    /// the recover-to-working-state policy of the config directory).
    pub fn open(cwd: &Path) -> Result<Self, ConfigError> {
        let path = config_file(cwd);
        let dir = state_root(cwd);
        fs::create_dir_all(&dir)
            .map_err(|source| ConfigError::io("creating state directory", &dir, source))?;

        let config = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<AgentConfig>(&raw) {
                Ok(config) => config,
                Err(_) => {
                    let config = AgentConfig::default();
                    write_config(&path, &config)?;
                    config
                }
            },
            Err(_) => {
                let config = AgentConfig::default();
                write_config(&path, &config)?;
                config
            }
        };

        Ok(Self { path, config })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    #[must_use]
    pub fn get_provider(&self, model_name: &str) -> Option<&Provider> {
        self.config.get_provider(model_name)
    }
}

fn write_config(path: &Path, config: &AgentConfig) -> Result<(), ConfigError> {
    let rendered = serde_json::to_string_pretty(config)
        .map_err(|source| ConfigError::json_serialize(path, source))?;
    fs::write(path, rendered).map_err(|source| ConfigError::io("writing config file", path, source))
}
