//! Tracker configuration supplied by the host renderer.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration handed to [`crate::CrashTracker::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Application name attached to every decoded dump.
    pub application_name: String,
    /// Optional application version attached alongside the name.
    pub application_version: Option<String>,
    /// Explicit dump root. When unset the per-user log directory is used.
    pub dump_root: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            application_name: "unknown".to_string(),
            application_version: None,
            dump_root: None,
        }
    }
}

impl TrackerConfig {
    pub fn new(application_name: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
            ..Self::default()
        }
    }

    /// Apply environment variable overrides, highest priority.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("GPUCRASH_DUMP_DIR") {
            self.dump_root = Some(PathBuf::from(dir));
        }
    }
}
