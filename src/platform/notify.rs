//! User notification channels
//!
//! Notifiers are best-effort. A message that cannot be delivered is logged
//! and dropped; the caller never learns about it.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

use crate::platform::traits::{NotifyFailure, Notifier};

pub const NOTIFICATION_TITLE: &str = "Memory Optimiser";

/// Native desktop notifications, falling back to the log elsewhere
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    pub fn new() -> Self {
        Self
    }

    #[cfg(target_os = "macos")]
    async fn deliver(&self, message: &str) -> Result<(), NotifyFailure> {
        run(Command::new("osascript")
            .arg("-e")
            .arg(apple_script(NOTIFICATION_TITLE, message)))
        .await
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    async fn deliver(&self, message: &str) -> Result<(), NotifyFailure> {
        run(Command::new("notify-send")
            .arg("--app-name")
            .arg(NOTIFICATION_TITLE)
            .arg(NOTIFICATION_TITLE)
            .arg(message))
        .await
    }

    #[cfg(not(unix))]
    async fn deliver(&self, message: &str) -> Result<(), NotifyFailure> {
        info!("Notification: {}", message);
        Ok(())
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, message: &str) {
        if let Err(e) = self.deliver(message).await {
            warn!("Notification not delivered ({}): {}", e, message);
        }
    }
}

/// Writes notifications to the log only
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) {
        info!("Notification: {}", message);
    }
}

/// Prints notifications to stdout. Used by test mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, message: &str) {
        println!("\n=== User Notification ===");
        println!("{}", message);
    }
}

#[cfg_attr(not(unix), allow(dead_code))]
async fn run(command: &mut Command) -> Result<(), NotifyFailure> {
    let output = command.output().await.map_err(NotifyFailure::Spawn)?;
    if output.status.success() {
        Ok(())
    } else {
        Err(NotifyFailure::CommandFailed {
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// `display notification` script with the message and title quoted for AppleScript
pub fn apple_script(title: &str, message: &str) -> String {
    format!(
        "display notification \"{}\" with title \"{}\"",
        escape_apple_string(message),
        escape_apple_string(title)
    )
}

fn escape_apple_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
