//! Storage configuration and path management for the beacon.
//!
//! A single `StorageConfig` owns every path decision so tests can inject a
//! temp root and production code never hardcodes locations.

use std::path::{Path, PathBuf};

/// Central configuration for all beacon storage paths.
///
/// Production code uses `StorageConfig::default()` which points to `~/.pwa-beacon/`.
/// Tests use `StorageConfig::with_root(temp_dir)` for isolation.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory for all beacon data (default: ~/.pwa-beacon)
    root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let home = dirs::home_dir().expect("Could not find home directory");
        Self {
            root: home.join(".pwa-beacon"),
        }
    }
}

impl StorageConfig {
    /// Creates a StorageConfig with a custom root directory.
    /// Used for testing with temp directories.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Returns the root directory for beacon data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to state.json (durable install-state flags and device id).
    pub fn state_file(&self) -> PathBuf {
        self.root.join("state.json")
    }

    /// Path to sessions/ directory (per-browsing-session markers).
    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    /// Path to one browsing session's marker file.
    /// The host names the session; a new session id starts with no markers.
    pub fn session_file(&self, session_id: &str) -> PathBuf {
        self.sessions_dir().join(format!("{}.json", session_id))
    }

    /// Path to logs/ directory (rolling hook logs).
    pub fn log_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Ensures the root directory and standard subdirectories exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        fs_err::create_dir_all(&self.root)?;
        fs_err::create_dir_all(self.sessions_dir())?;
        fs_err::create_dir_all(self.log_dir())?;
        Ok(())
    }
}
