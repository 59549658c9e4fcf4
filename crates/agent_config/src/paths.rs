use std::path::{Path, PathBuf};

/// Directory under the working directory holding agent state files.
pub const STATE_DIR: &str = ".agent";

#[must_use]
pub fn state_root(cwd: &Path) -> PathBuf {
    cwd.join(STATE_DIR)
}

#[must_use]
pub fn config_file(cwd: &Path) -> PathBuf {
    state_root(cwd).join("config.json")
}

#[must_use]
pub fn permissions_file(cwd: &Path) -> PathBuf {
    state_root(cwd).join("permissions.json")
}

#[must_use]
pub fn history_file(cwd: &Path) -> PathBuf {
    state_root(cwd).join("history.json")
}

/// The error log stays at the top of the working directory so it is easy
/// to find after a failed run.
#[must_use]
pub fn error_log_file(cwd: &Path) -> PathBuf {
    cwd.join("error.log")
}

/// Sandbox root: the single directory all tool side effects are confined to.
#[must_use]
pub fn sandbox_root(cwd: &Path) -> PathBuf {
    cwd.join("project_folder")
}
