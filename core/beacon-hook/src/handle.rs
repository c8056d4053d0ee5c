//! Event handler for host-forwarded browser lifecycle events.
//!
//! Reads JSON from stdin, parses the event, and applies it to the tracker.
//!
//! ## Input
//!
//! ```json
//! {
//!   "event": "page-load",
//!   "session_id": "tab-42",
//!   "display_mode": "browser",
//!   "ios_standalone": false,
//!   "user_agent": "Mozilla/5.0 (…)",
//!   "cookie": "csrftoken=…; sessionid=…"
//! }
//! ```
//!
//! `event` is one of `appinstalled`, `prompt-accepted`, `prompt-dismissed`,
//! `page-load`, `uninstall-check`. Unknown events are ignored so newer hosts
//! can send more than this binary understands.

use std::io::{self, Read};

use serde::Deserialize;

use beacon_core::flags::{FlagStore, SessionFlags};
use beacon_core::{
    HostDisplayMode, HttpReporter, LifecycleEvent, LifecycleTracker, StorageConfig,
};

#[derive(Debug, Deserialize)]
pub struct EventInput {
    pub event: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub display_mode: Option<String>,
    #[serde(default)]
    pub ios_standalone: Option<bool>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub cookie: Option<String>,
}

impl EventInput {
    fn to_event(&self) -> Option<LifecycleEvent> {
        match self.event.as_str() {
            "appinstalled" => Some(LifecycleEvent::AppInstalled),
            "prompt-accepted" => Some(LifecycleEvent::InstallPromptAccepted),
            "prompt-dismissed" => Some(LifecycleEvent::InstallPromptDismissed),
            "page-load" => Some(LifecycleEvent::PageLoad),
            "uninstall-check" => Some(LifecycleEvent::UninstallCheck),
            _ => None,
        }
    }
}

pub fn run(base_url: &str) -> Result<(), String> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| format!("Failed to read stdin: {}", e))?;

    if input.trim().is_empty() {
        return Ok(());
    }

    let event_input: EventInput =
        serde_json::from_str(&input).map_err(|e| format!("Failed to parse event input: {}", e))?;

    run_with_input(event_input, base_url, &StorageConfig::default())
}

fn run_with_input(
    input: EventInput,
    base_url: &str,
    storage: &StorageConfig,
) -> Result<(), String> {
    let event = match input.to_event() {
        Some(event) => event,
        None => {
            tracing::debug!(event = %input.event, "ignoring unknown event");
            return Ok(());
        }
    };

    if let Err(e) = storage.ensure_dirs() {
        // Storage trouble degrades to in-memory tracking, never a hard failure.
        tracing::warn!(error = %e, "could not create storage dirs");
    }
    // Dead sessions leave their marker files behind; drop the old ones so
    // the sessions directory does not grow without bound.
    beacon_core::prune_stale_sessions(storage, beacon_core::STALE_SESSION_MAX_AGE);

    let flags = FlagStore::load(&storage.state_file());
    let session_id = input.session_id.as_deref().unwrap_or("default");
    let session = SessionFlags::load(&storage.session_file(session_id));
    let probe = HostDisplayMode::new(
        input.display_mode.as_deref().unwrap_or("browser"),
        input.ios_standalone.unwrap_or(false),
    );
    let reporter = HttpReporter::new(base_url, input.cookie.clone());
    let user_agent = input.user_agent.clone().unwrap_or_default();

    let mut tracker = LifecycleTracker::new(flags, session, probe, reporter, user_agent);
    tracker.apply(&event);
    Ok(())
}
