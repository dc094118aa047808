//! Platform layer for the memory optimiser
//!
//! ```text
//! src/platform/
//! +-- mod.rs       <- This file (wiring for the current host)
//! +-- traits.rs    <- Collaborator traits and their error types
//! +-- sampler.rs   <- sysinfo-backed MemorySampler
//! +-- reclaim.rs   <- Purge command invokers
//! +-- notify.rs    <- Desktop / log / console notifiers
//! +-- linux/       <- /proc/meminfo and drop_caches
//! +-- macos/       <- vm_stat and purge
//! ```
//!
//! | Feature           | macOS                 | Linux              | Other    |
//! |-------------------|-----------------------|--------------------|----------|
//! | Primary counters  | sysinfo               | sysinfo            | sysinfo  |
//! | Active/Inactive   | vm_stat               | /proc/meminfo      | 0        |
//! | Wired             | vm_stat               | 0                  | 0        |
//! | Reclaim           | purge                 | drop_caches        | failure  |
//! | Notification      | osascript             | notify-send        | log      |

#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(target_os = "macos")]
pub mod macos;
pub mod notify;
pub mod reclaim;
pub mod sampler;
pub mod traits;

pub use notify::{ConsoleNotifier, DesktopNotifier, LogNotifier};
pub use reclaim::{is_root, CommandReclaimer, SimulatedReclaimer, UnsupportedReclaimer};
pub use sampler::SystemSampler;
pub use traits::{
    Collaborators, MemorySampler, NotifyFailure, Notifier, ReclaimFailure, ReclaimInvoker,
    ReclaimOutcome, SampleError,
};

use std::sync::Arc;
use tracing::debug;

use crate::core::config::{Elevation, Settings};

/// Returns the current platform name
pub fn platform_name() -> &'static str {
    if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else {
        "unsupported"
    }
}

/// Whether this host has a built-in reclaim command
pub fn is_reclaim_supported() -> bool {
    cfg!(any(target_os = "macos", target_os = "linux"))
}

/// "Darwin 14.4 (kernel 23.4.0)"-style description for the startup log
pub fn host_description() -> String {
    let name = sysinfo::System::name().unwrap_or_else(|| platform_name().to_string());
    let version = sysinfo::System::os_version().unwrap_or_default();
    match sysinfo::System::kernel_version() {
        Some(kernel) => format!("{} {} (kernel {})", name, version, kernel),
        None => format!("{} {}", name, version),
    }
}

/// Default purge argv for this host, or `None` when there is none
#[cfg(target_os = "macos")]
pub fn default_reclaim_command(elevation: Elevation) -> Option<Vec<String>> {
    Some(macos::default_reclaim_command(is_root(), elevation))
}

#[cfg(target_os = "linux")]
pub fn default_reclaim_command(elevation: Elevation) -> Option<Vec<String>> {
    Some(linux::default_reclaim_command(is_root(), elevation))
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
pub fn default_reclaim_command(_elevation: Elevation) -> Option<Vec<String>> {
    None
}

/// Reclaim invoker for the configured command or the host default
pub fn create_reclaimer(settings: &Settings) -> Arc<dyn ReclaimInvoker> {
    let argv = settings
        .reclaim
        .command
        .clone()
        .or_else(|| default_reclaim_command(settings.reclaim.elevation));

    match argv.and_then(CommandReclaimer::from_argv) {
        Some(reclaimer) => {
            debug!(
                "Reclaim command: {} {}",
                reclaimer.program(),
                reclaimer.args().join(" ")
            );
            Arc::new(reclaimer)
        }
        None => Arc::new(UnsupportedReclaimer::new(
            "Memory optimisation is only supported on macOS and Linux",
        )),
    }
}

/// Notifier honouring `[notify] desktop`
pub fn create_notifier(settings: &Settings) -> Arc<dyn Notifier> {
    if settings.notify.desktop {
        Arc::new(DesktopNotifier::new())
    } else {
        Arc::new(LogNotifier)
    }
}

/// Wire the real host collaborators
pub fn create_collaborators(settings: &Settings) -> Collaborators {
    Collaborators {
        sampler: Arc::new(SystemSampler::new()),
        reclaimer: create_reclaimer(settings),
        notifier: create_notifier(settings),
    }
}
