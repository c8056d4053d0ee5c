//! Startup cleanup for accumulated session artifacts.
//!
//! Browsing sessions end without notice, so the marker files under
//! `sessions/` cannot be deleted at the moment their session dies. Each hook
//! invocation instead prunes markers old enough that their session is
//! certainly over, keeping the directory from growing forever.

use std::time::{Duration, SystemTime};

use crate::storage::StorageConfig;

/// Session marker files untouched for this long belong to dead sessions.
pub const STALE_SESSION_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Removes session marker files whose age is at least `max_age`.
///
/// Returns the number of files removed. Individual failures are logged and
/// skipped; cleanup never blocks tracking.
pub fn prune_stale_sessions(storage: &StorageConfig, max_age: Duration) -> u32 {
    let dir = storage.sessions_dir();
    let entries = match fs_err::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(error = %e, "no session directory to prune");
            return 0;
        }
    };

    let now = SystemTime::now();
    let mut removed = 0;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        let path = entry.path();
        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified,
            // No usable timestamp: leave the file alone.
            Err(_) => continue,
        };
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age < max_age {
            continue;
        }
        match fs_err::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove stale session file");
            }
        }
    }

    if removed > 0 {
        tracing::debug!(removed, "pruned stale session markers");
    }
    removed
}
