//! Externally-owned configuration for the agent runtime.
//!
//! Two on-disk documents live under a cwd-relative `.agent/` directory:
//! `config.json` (provider catalog plus default model names) and
//! `permissions.json` (coarse capability flags). Both are created with
//! defaults when missing and fall back to defaults when unreadable, so a
//! fresh checkout always starts in a working state.
//!
//! The core reads these structures; it never mutates them. Permissions are
//! re-read from disk on every query so an operator can edit
//! `permissions.json` between turns and have the change take effect.

mod error;
mod paths;
mod permissions;
mod schema;
mod store;

pub use error::ConfigError;
pub use paths::{
    config_file, error_log_file, history_file, permissions_file, sandbox_root, state_root,
    STATE_DIR,
};
pub use permissions::{PermissionGate, PermissionSet, PermissionsStore};
pub use schema::{AgentConfig, Provider, ProviderKind};
pub use store::ConfigStore;
