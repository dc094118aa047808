//! Reclaim invokers
//!
//! The real invoker shells out to a privileged purge command. There is no
//! timeout and no retry: the command may sit on a password prompt for as
//! long as the user takes, and a failure is reported once.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::platform::traits::{ReclaimFailure, ReclaimInvoker, ReclaimOutcome};

pub const RECLAIM_SUCCESS: &str = "Successfully freed up inactive memory";

/// Runs an argv and maps its exit status to a [`ReclaimOutcome`]
#[derive(Debug, Clone)]
pub struct CommandReclaimer {
    program: String,
    args: Vec<String>,
}

impl CommandReclaimer {
    /// Build from a full argv. Returns `None` for an empty argv.
    pub fn from_argv(argv: Vec<String>) -> Option<Self> {
        let mut argv = argv.into_iter();
        let program = argv.next()?;
        Some(Self {
            program,
            args: argv.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    async fn run(&self) -> Result<(), ReclaimFailure> {
        info!("Attempting to free up inactive memory...");
        debug!("Running reclaim command: {} {:?}", self.program, self.args);

        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .await
            .map_err(ReclaimFailure::Spawn)?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("Reclaim command exited with {}", output.status);
            Err(ReclaimFailure::CommandFailed {
                status: output.status.code(),
                stderr,
            })
        }
    }
}

#[async_trait]
impl ReclaimInvoker for CommandReclaimer {
    async fn reclaim(&self) -> ReclaimOutcome {
        match self.run().await {
            Ok(()) => ReclaimOutcome::success(RECLAIM_SUCCESS),
            Err(e) => e.into(),
        }
    }
}

/// Stand-in for hosts with no reclaim mechanism
#[derive(Debug, Clone)]
pub struct UnsupportedReclaimer {
    reason: String,
}

impl UnsupportedReclaimer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ReclaimInvoker for UnsupportedReclaimer {
    async fn reclaim(&self) -> ReclaimOutcome {
        warn!("{}", self.reason);
        ReclaimFailure::PlatformUnsupported(self.reason.clone()).into()
    }
}

/// Always succeeds without touching the system. Used by test mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedReclaimer;

#[async_trait]
impl ReclaimInvoker for SimulatedReclaimer {
    async fn reclaim(&self) -> ReclaimOutcome {
        info!("Simulated reclaim, no memory was purged");
        ReclaimOutcome::success(format!("{} (simulated)", RECLAIM_SUCCESS))
    }
}

/// Whether the process already runs as root, so no elevation is needed
pub fn is_root() -> bool {
    #[cfg(unix)]
    unsafe {
        libc::geteuid() == 0
    }

    #[cfg(not(unix))]
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_argv() {
        let reclaimer = CommandReclaimer::from_argv(argv(&["sudo", "purge"])).unwrap();
        assert_eq!(reclaimer.program(), "sudo");
        assert_eq!(reclaimer.args().to_vec(), vec!["purge".to_string()]);
        assert!(CommandReclaimer::from_argv(Vec::new()).is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_command() {
        let reclaimer = CommandReclaimer::from_argv(argv(&["sh", "-c", "exit 0"])).unwrap();
        let outcome = reclaimer.reclaim().await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.detail, RECLAIM_SUCCESS);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_reports_stderr() {
        let reclaimer = CommandReclaimer::from_argv(argv(&[
            "sh",
            "-c",
            "echo 'permission denied' >&2; exit 1",
        ]))
        .unwrap();
        let outcome = reclaimer.reclaim().await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.detail, "Failed to free up memory: permission denied");
    }

    #[tokio::test]
    async fn test_missing_program_is_a_failure_not_an_error() {
        let reclaimer =
            CommandReclaimer::from_argv(argv(&["memory-optimiser-no-such-binary"])).unwrap();
        let outcome = reclaimer.reclaim().await;
        assert!(!outcome.succeeded);
        assert!(outcome.detail.starts_with("Error optimising memory:"));
    }

    #[tokio::test]
    async fn test_unsupported_reclaimer() {
        let outcome = UnsupportedReclaimer::new("not on this host").reclaim().await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.detail, "not on this host");
    }

    #[tokio::test]
    async fn test_simulated_reclaimer() {
        assert!(SimulatedReclaimer.reclaim().await.succeeded);
    }
}
