//! Durable and session-scoped flag persistence.
//!
//! The tracker keeps its last-known install state in a small versioned JSON
//! file of string flags:
//!
//! ```json
//! {
//!   "version": 1,
//!   "flags": {
//!     "device_id": "….",
//!     "install_state": "install_reported"
//!   }
//! }
//! ```
//!
//! # Defensive Design
//!
//! Durable storage may be absent, corrupt, or read-only. We handle:
//! - Missing or empty files (return empty store)
//! - Corrupt JSON (return empty store, log warning)
//! - Version mismatches (return empty store)
//! - Failed saves (log warning, keep the in-memory value; writes are a
//!   silent no-op by contract, never an error the page sees)
//!
//! # Atomic Writes
//!
//! Uses temp file + rename so a crash mid-write never leaves a torn file.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{BeaconError, Result};

/// Durable key: the per-profile device identifier.
pub const KEY_DEVICE_ID: &str = "device_id";
/// Durable key: last-known install state.
pub const KEY_INSTALL_STATE: &str = "install_state";
/// Durable key: RFC 3339 timestamp of the last state change.
pub const KEY_STATE_CHANGED_AT: &str = "state_changed_at";
/// Session key: set once the uninstall heuristic has run this session.
pub const KEY_UNINSTALL_CHECKED: &str = "uninstall_checked";

const STORE_VERSION: u32 = 1;

/// The on-disk JSON structure for a flag file.
#[derive(Debug, Serialize, Deserialize)]
struct FlagFile {
    version: u32,
    flags: HashMap<String, String>,
}

impl Default for FlagFile {
    fn default() -> Self {
        FlagFile {
            version: STORE_VERSION,
            flags: HashMap::new(),
        }
    }
}

/// In-memory map of string flags, optionally backed by a file.
///
/// Create with [`FlagStore::load`] to read from disk, or
/// [`FlagStore::new_in_memory`] for tests and storage-less degradation.
#[derive(Debug)]
pub struct FlagStore {
    flags: HashMap<String, String>,
    file_path: Option<PathBuf>,
}

impl FlagStore {
    pub fn new_in_memory() -> Self {
        FlagStore {
            flags: HashMap::new(),
            file_path: None,
        }
    }

    /// Loads flags from `file_path`, degrading to an empty file-backed store
    /// on any read or parse problem. Never fails.
    pub fn load(file_path: &Path) -> Self {
        let empty = || FlagStore {
            flags: HashMap::new(),
            file_path: Some(file_path.to_path_buf()),
        };

        if !file_path.exists() {
            return empty();
        }

        let content = match fs_err::read_to_string(file_path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read flag file, starting empty");
                return empty();
            }
        };

        if content.trim().is_empty() {
            return empty();
        }

        match serde_json::from_str::<FlagFile>(&content) {
            Ok(file) if file.version == STORE_VERSION => FlagStore {
                flags: file.flags,
                file_path: Some(file_path.to_path_buf()),
            },
            Ok(file) => {
                tracing::warn!(
                    version = file.version,
                    "unsupported flag file version, starting empty"
                );
                empty()
            }
            Err(e) => {
                tracing::warn!(error = %e, "corrupt flag file, starting empty");
                empty()
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.flags.get(key).map(String::as_str)
    }

    /// Sets a flag and persists. A failed save keeps the in-memory value and
    /// logs; durable storage being unavailable is not an error here.
    pub fn set(&mut self, key: &str, value: &str) {
        self.flags.insert(key.to_string(), value.to_string());
        if let Err(e) = self.save() {
            tracing::warn!(key, error = %e, "flag save failed, keeping value in memory only");
        }
    }

    /// Removes a flag and persists, with the same no-op failure policy as `set`.
    pub fn remove(&mut self, key: &str) {
        if self.flags.remove(key).is_some() {
            if let Err(e) = self.save() {
                tracing::warn!(key, error = %e, "flag save failed after removal");
            }
        }
    }

    fn save(&self) -> Result<()> {
        let file_path = match &self.file_path {
            Some(path) => path,
            // In-memory store: nothing to persist.
            None => return Ok(()),
        };

        let file = FlagFile {
            version: STORE_VERSION,
            flags: self.flags.clone(),
        };
        let content = serde_json::to_string_pretty(&file).map_err(|e| BeaconError::Json {
            context: "serializing flag file".to_string(),
            source: e,
        })?;

        let parent_dir = file_path.parent().ok_or_else(|| BeaconError::Io {
            context: "flag file path has no parent directory".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?;
        let mut temp_file =
            NamedTempFile::new_in(parent_dir).map_err(|e| BeaconError::StateWriteFailed {
                path: file_path.clone(),
                source: e,
            })?;
        temp_file
            .write_all(content.as_bytes())
            .and_then(|_| temp_file.flush())
            .map_err(|e| BeaconError::StateWriteFailed {
                path: file_path.clone(),
                source: e,
            })?;
        temp_file
            .persist(file_path)
            .map_err(|e| BeaconError::StateWriteFailed {
                path: file_path.clone(),
                source: e.error,
            })?;

        Ok(())
    }
}

/// Flags scoped to one browsing session.
///
/// The marker must disappear when the session ends. In-process hosts hold an
/// in-memory instance whose lifetime *is* the session; the CLI hook backs it
/// with a per-session file under `sessions/` so repeated invocations within
/// one session share the marker (a fresh session id starts clean).
#[derive(Debug)]
pub struct SessionFlags {
    store: FlagStore,
}

impl SessionFlags {
    pub fn in_memory() -> Self {
        SessionFlags {
            store: FlagStore::new_in_memory(),
        }
    }

    pub fn load(file_path: &Path) -> Self {
        SessionFlags {
            store: FlagStore::load(file_path),
        }
    }

    pub fn uninstall_checked(&self) -> bool {
        self.store.get(KEY_UNINSTALL_CHECKED).is_some()
    }

    pub fn set_uninstall_checked(&mut self) {
        self.store.set(KEY_UNINSTALL_CHECKED, "true");
    }

    pub fn clear_uninstall_checked(&mut self) {
        self.store.remove(KEY_UNINSTALL_CHECKED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_missing_key_is_none() {
        let store = FlagStore::new_in_memory();
        assert_eq!(store.get(KEY_INSTALL_STATE), None);
    }

    #[test]
    fn test_set_then_get() {
        let mut store = FlagStore::new_in_memory();
        store.set(KEY_INSTALL_STATE, "install_reported");
        assert_eq!(store.get(KEY_INSTALL_STATE), Some("install_reported"));
    }

    #[test]
    fn test_remove_deletes_key() {
        let mut store = FlagStore::new_in_memory();
        store.set(KEY_DEVICE_ID, "abc");
        store.remove(KEY_DEVICE_ID);
        assert_eq!(store.get(KEY_DEVICE_ID), None);
    }

    #[test]
    fn test_flags_survive_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");

        let mut store = FlagStore::load(&path);
        store.set(KEY_DEVICE_ID, "id-123");
        store.set(KEY_INSTALL_STATE, "install_reported");

        let reloaded = FlagStore::load(&path);
        assert_eq!(reloaded.get(KEY_DEVICE_ID), Some("id-123"));
        assert_eq!(reloaded.get(KEY_INSTALL_STATE), Some("install_reported"));
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let store = FlagStore::load(&temp.path().join("nope.json"));
        assert_eq!(store.get(KEY_DEVICE_ID), None);
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        fs_err::write(&path, "{not json").unwrap();

        let store = FlagStore::load(&path);
        assert_eq!(store.get(KEY_DEVICE_ID), None);
    }

    #[test]
    fn test_unsupported_version_loads_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        fs_err::write(&path, r#"{"version": 99, "flags": {"device_id": "x"}}"#).unwrap();

        let store = FlagStore::load(&path);
        assert_eq!(store.get(KEY_DEVICE_ID), None);
    }

    #[test]
    fn test_unwritable_path_keeps_value_in_memory() {
        // Parent directory does not exist, so every save fails.
        let mut store = FlagStore::load(Path::new("/definitely/not/a/dir/state.json"));
        store.set(KEY_INSTALL_STATE, "install_reported");
        assert_eq!(store.get(KEY_INSTALL_STATE), Some("install_reported"));
    }

    #[test]
    fn test_session_marker_roundtrip() {
        let mut session = SessionFlags::in_memory();
        assert!(!session.uninstall_checked());

        session.set_uninstall_checked();
        assert!(session.uninstall_checked());

        session.clear_uninstall_checked();
        assert!(!session.uninstall_checked());
    }

    #[test]
    fn test_session_marker_shared_within_session_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tab-1.json");

        let mut session = SessionFlags::load(&path);
        session.set_uninstall_checked();

        // Same session id: marker visible.
        assert!(SessionFlags::load(&path).uninstall_checked());
        // New session id: clean slate.
        assert!(!SessionFlags::load(&temp.path().join("tab-2.json")).uninstall_checked());
    }
}
