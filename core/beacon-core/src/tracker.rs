//! Install/uninstall lifecycle state machine.
//!
//! The tracker owns the decision logic: when has an install or uninstall
//! genuinely happened, and has it already been reported. State lives in the
//! durable flag store under `install_state`; the uninstall heuristic is
//! debounced by a once-per-session marker.
//!
//! ```text
//! AppInstalled / InstallPromptAccepted  → report install (unless already reported)
//! PageLoad, state Unknown               → report install (first run)
//! PageLoad / UninstallCheck, standalone → confirmed installed, clear marker
//! PageLoad / UninstallCheck, browser    → report uninstall once per session
//!                                         (only from InstallReported)
//! InstallPromptDismissed                → no state change
//! ```
//!
//! No browser fires a reliable "app removed" signal; the uninstall branch is
//! a re-entry heuristic (installed flag set, yet running in a plain tab) and
//! is stated as such. Reports are at-most-once: the state only advances on a
//! successful beacon, so a failed POST is retried by the next trigger rather
//! than by this one.
//!
//! Single-threaded by design. Two near-simultaneous triggers (native install
//! event racing the first-run check) can double-report; accepted as a
//! low-probability defect rather than paying for cross-trigger locking.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::device::device_label;
use crate::flags::{FlagStore, SessionFlags, KEY_INSTALL_STATE, KEY_STATE_CHANGED_AT};
use crate::identity;
use crate::probe::DisplayModeProbe;
use crate::report::{BeaconPayload, Reporter, INSTALL_ENDPOINT, UNINSTALL_ENDPOINT};

/// Hosts should schedule the delayed uninstall check this long after page
/// load, so it cannot race the install transition.
pub const UNINSTALL_CHECK_DELAY: Duration = Duration::from_secs(5);

/// Last-known install state, persisted under `install_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallState {
    Unknown,
    InstallReported,
    UninstallReported,
}

impl InstallState {
    /// The flag-store string for this state.
    pub fn as_flag(self) -> &'static str {
        match self {
            InstallState::Unknown => "unknown",
            InstallState::InstallReported => "install_reported",
            InstallState::UninstallReported => "uninstall_reported",
        }
    }

    /// Unrecognized or missing flag values degrade to `Unknown`.
    pub fn from_flag(value: Option<&str>) -> Self {
        match value {
            Some("install_reported") => InstallState::InstallReported,
            Some("uninstall_reported") => InstallState::UninstallReported,
            _ => InstallState::Unknown,
        }
    }
}

/// Browser lifecycle signals fed into the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The native `appinstalled` event fired.
    AppInstalled,
    /// The user accepted the deferred install prompt.
    InstallPromptAccepted,
    /// The user dismissed the deferred install prompt.
    InstallPromptDismissed,
    /// Page load / DOM ready.
    PageLoad,
    /// The host-scheduled delayed uninstall check fired.
    UninstallCheck,
}

/// What the tracker should do for one event. Pure decision, no effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Send the install beacon and advance to `InstallReported` on success.
    ReportInstall,
    /// Send the uninstall beacon; the session marker is consumed either way.
    ReportUninstall,
    /// Running standalone: still installed, clear any pending suspicion.
    ConfirmInstalled,
    /// Heuristic evaluated with nothing to report; consume the session marker.
    MarkChecked,
    NoOp,
}

/// Maps one event to an action. Conservative: the uninstall heuristic only
/// fires from `InstallReported` and at most once per session.
pub fn next_action(
    current: InstallState,
    event: &LifecycleEvent,
    standalone: bool,
    session_checked: bool,
) -> Action {
    match event {
        LifecycleEvent::AppInstalled | LifecycleEvent::InstallPromptAccepted => {
            if current == InstallState::InstallReported {
                Action::NoOp
            } else {
                Action::ReportInstall
            }
        }
        LifecycleEvent::InstallPromptDismissed => Action::NoOp,
        // First run: no browser fired an install event, but the app has never
        // been seen on this profile. Treated as an install by design.
        LifecycleEvent::PageLoad if current == InstallState::Unknown => Action::ReportInstall,
        LifecycleEvent::PageLoad | LifecycleEvent::UninstallCheck => {
            if standalone {
                Action::ConfirmInstalled
            } else if session_checked {
                Action::NoOp
            } else if current == InstallState::InstallReported {
                Action::ReportUninstall
            } else {
                Action::MarkChecked
            }
        }
    }
}

/// The only stateful core: orchestrates identity, flags, probe and reporter
/// into the install/uninstall decision logic. Construct once per page
/// context.
pub struct LifecycleTracker<P: DisplayModeProbe, R: Reporter> {
    flags: FlagStore,
    session: SessionFlags,
    probe: P,
    reporter: R,
    user_agent: String,
}

impl<P: DisplayModeProbe, R: Reporter> LifecycleTracker<P, R> {
    pub fn new(
        flags: FlagStore,
        session: SessionFlags,
        probe: P,
        reporter: R,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            flags,
            session,
            probe,
            reporter,
            user_agent: user_agent.into(),
        }
    }

    /// Current persisted state; missing or corrupt flags read as `Unknown`.
    pub fn state(&self) -> InstallState {
        InstallState::from_flag(self.flags.get(KEY_INSTALL_STATE))
    }

    /// The stable device id, generated and persisted on first use.
    pub fn device_id(&mut self) -> String {
        identity::device_id(&mut self.flags)
    }

    /// Applies one lifecycle event, performing at most one beacon report.
    pub fn apply(&mut self, event: &LifecycleEvent) {
        let standalone = self.probe.is_standalone();
        let action = next_action(
            self.state(),
            event,
            standalone,
            self.session.uninstall_checked(),
        );
        tracing::debug!(?event, ?action, standalone, state = ?self.state(), "lifecycle event");

        match action {
            Action::ReportInstall => self.report_install(),
            Action::ReportUninstall => self.report_uninstall(),
            Action::ConfirmInstalled => self.session.clear_uninstall_checked(),
            Action::MarkChecked => self.session.set_uninstall_checked(),
            Action::NoOp => {}
        }
    }

    fn report_install(&mut self) {
        let payload = self.payload();
        match self.reporter.report(INSTALL_ENDPOINT, &payload) {
            Ok(ack) => {
                tracing::info!(device_id = %payload.device_id, ?ack, "install tracked");
                self.set_state(InstallState::InstallReported);
                self.session.clear_uninstall_checked();
            }
            Err(e) => {
                // State stays put so the next trigger retries the transition.
                tracing::warn!(error = %e, "install beacon failed");
            }
        }
    }

    fn report_uninstall(&mut self) {
        // One evaluation per session, whether or not the beacon lands.
        self.session.set_uninstall_checked();

        let payload = self.payload();
        tracing::info!(device_id = %payload.device_id, "uninstall suspected: installed flag set but not standalone");
        match self.reporter.report(UNINSTALL_ENDPOINT, &payload) {
            Ok(ack) => {
                tracing::info!(?ack, "uninstall tracked");
                self.set_state(InstallState::UninstallReported);
            }
            Err(e) => {
                tracing::warn!(error = %e, "uninstall beacon failed");
            }
        }
    }

    fn payload(&mut self) -> BeaconPayload {
        BeaconPayload {
            device_id: self.device_id(),
            device_name: device_label(&self.user_agent).map(str::to_string),
            device_info: self.user_agent.clone(),
        }
    }

    fn set_state(&mut self, state: InstallState) {
        self.flags.set(KEY_INSTALL_STATE, state.as_flag());
        self.flags
            .set(KEY_STATE_CHANGED_AT, &chrono::Utc::now().to_rfc3339());
    }
}
