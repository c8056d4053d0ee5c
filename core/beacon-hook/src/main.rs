//! beacon-hook: CLI hook handler for PWA install lifecycle tracking.
//!
//! The webview host forwards browser lifecycle events to this binary as JSON
//! on stdin; it drives the lifecycle tracker against the shared storage root
//! and exits. The host schedules the delayed uninstall check itself (see
//! `beacon_core::UNINSTALL_CHECK_DELAY`).
//!
//! ## Subcommands
//!
//! - `handle`: Main event handler, reads JSON from stdin
//! - `device-id`: Prints the stable device id, generating one on first use
//! - `status`: Prints the last-known install state

mod handle;
mod logging;

use clap::{Parser, Subcommand};

use beacon_core::flags::{FlagStore, KEY_INSTALL_STATE};
use beacon_core::{identity, InstallState, StorageConfig};

#[derive(Parser)]
#[command(name = "beacon-hook")]
#[command(about = "PWA install lifecycle tracker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle a lifecycle event (reads JSON from stdin)
    Handle {
        /// Base URL the tracking endpoints hang off of
        #[arg(long, default_value = "http://127.0.0.1:8000")]
        base_url: String,
    },

    /// Print the stable device id
    DeviceId,

    /// Print the last-known install state
    Status,
}

fn main() {
    let _logging_guard = logging::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Handle { base_url } => {
            // Report failures are swallowed inside the tracker; only bad
            // input exits non-zero.
            if let Err(e) = handle::run(&base_url) {
                tracing::error!(error = %e, "beacon-hook handle failed");
                std::process::exit(1);
            }
        }
        Commands::DeviceId => {
            let storage = StorageConfig::default();
            if let Err(e) = storage.ensure_dirs() {
                tracing::warn!(error = %e, "could not create storage dirs");
            }
            let mut flags = FlagStore::load(&storage.state_file());
            println!("{}", identity::device_id(&mut flags));
        }
        Commands::Status => {
            let storage = StorageConfig::default();
            let flags = FlagStore::load(&storage.state_file());
            // Same parsing as the tracker, so a corrupt flag reads as unknown
            // here too.
            let state = InstallState::from_flag(flags.get(KEY_INSTALL_STATE));
            println!("{}", state.as_flag());
        }
    }
}
