//! # beacon-core
//!
//! Core library for the PWA install beacon, providing the shared
//! lifecycle-tracking logic for all hosts (webview shells, the CLI hook).
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Hosts can wrap with async if needed.
//! - **Not thread-safe**: Hosts provide their own synchronization.
//! - **Graceful degradation**: Missing or corrupt state loads as `Unknown`; failed
//!   writes and failed reports are logged and swallowed, never surfaced to the page.
//! - **At-most-once delivery**: A missed beacon is acceptable, a duplicate is not.
//!   Beacons are never retried within a trigger; a later trigger re-attempts the
//!   transition if the state was not advanced.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use beacon_core::{
//!     FlagStore, HostDisplayMode, HttpReporter, LifecycleEvent, LifecycleTracker,
//!     SessionFlags, StorageConfig,
//! };
//!
//! let storage = StorageConfig::default();
//! let flags = FlagStore::load(&storage.state_file());
//! let session = SessionFlags::in_memory();
//! let probe = HostDisplayMode::new("browser", false);
//! let reporter = HttpReporter::new("https://example.com", None);
//! let mut tracker = LifecycleTracker::new(flags, session, probe, reporter, ua);
//! tracker.apply(&LifecycleEvent::PageLoad);
//! ```

// Public modules
pub mod cleanup;
pub mod device;
pub mod error;
pub mod flags;
pub mod identity;
pub mod probe;
pub mod report;
pub mod storage;
pub mod tracker;

// Re-export commonly used items at crate root
pub use cleanup::{prune_stale_sessions, STALE_SESSION_MAX_AGE};
pub use device::device_label;
pub use error::{BeaconError, Result};
pub use flags::{FlagStore, SessionFlags};
pub use probe::{DisplayModeProbe, HostDisplayMode};
pub use report::{
    Ack, BeaconPayload, HttpReporter, ReportError, Reporter, INSTALL_ENDPOINT, UNINSTALL_ENDPOINT,
};
pub use storage::StorageConfig;
pub use tracker::{InstallState, LifecycleEvent, LifecycleTracker, UNINSTALL_CHECK_DELAY};
