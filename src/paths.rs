//! Centralized path definitions for configuration and log files.
//!
//! Functions accept `&Path` so the request handler embedding this crate
//! decides where the config directory lives.

use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "settings.json";
pub const CREDENTIALS_FILE: &str = ".credentials";
pub const BATCH_LOGS_DIR: &str = "batch-logs";

/// Environment variable consulted when no API key is configured on disk.
pub const API_KEY_ENV: &str = "VIBE_BEATS_API_KEY";

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join(SETTINGS_FILE)
}

pub fn credentials_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CREDENTIALS_FILE)
}

pub fn batch_logs_dir(config_dir: &Path) -> PathBuf {
    config_dir.join(BATCH_LOGS_DIR)
}
