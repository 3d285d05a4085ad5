//! Well-known file locations.

use std::path::PathBuf;

pub const CONFIG_DIR_NAME: &str = "tunesync";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Per-user configuration directory, `None` when the platform reports no
/// config dir.
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME))
}

/// Full path of the configuration file.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}
