//! Cancellation for the optimisation loop
//!
//! A [`ShutdownSignal`] is shared between the signal handlers and the loop.
//! The loop checks it before each tick and races its sleep against it.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Cloneable, one-way shutdown flag
#[derive(Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request shutdown. Idempotent.
    pub fn request_shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn shutdown_requested(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once shutdown has been requested, immediately if it already was.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close under us
        let _ = rx.wait_for(|requested| *requested).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Route Ctrl-C (and SIGTERM on Unix) to `signal`.
///
/// Must be called from inside a tokio runtime.
pub fn install_signal_handlers(signal: ShutdownSignal) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal as unix_signal, SignalKind};

        let mut terminate = unix_signal(SignalKind::terminate())?;
        let shutdown = signal.clone();
        tokio::spawn(async move {
            if terminate.recv().await.is_some() {
                info!("Received SIGTERM, stopping");
                shutdown.request_shutdown();
            }
        });
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping");
            signal.request_shutdown();
        }
    });

    Ok(())
}
