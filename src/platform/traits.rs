//! Collaborator traits for the optimisation loop
//!
//! The loop only ever talks to the host through these three seams:
//!
//! ```text
//! +------------------+
//! | OptimizationLoop |
//! +------------------+
//!    |      |      |
//!    v      v      v
//! Sampler Reclaim Notifier   <- host implementations or test fakes
//! ```
//!
//! Only sampling can fail. Reclaim reports failure in its outcome and
//! notification failures never leave the notifier.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::core::snapshot::MemorySnapshot;

// ============================================================================
// Error Types
// ============================================================================

/// Failure to read the host's memory counters
#[derive(Debug, Error)]
pub enum SampleError {
    /// The host does not expose a primary counter (total/used/free)
    #[error("platform unsupported: {0}")]
    PlatformUnsupported(String),

    #[error("memory query failed: {0}")]
    Query(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a reclaim attempt failed. Only ever surfaces as a [`ReclaimOutcome`] detail.
#[derive(Debug, Error)]
pub enum ReclaimFailure {
    #[error("{0}")]
    PlatformUnsupported(String),

    #[error("Error optimising memory: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Failed to free up memory: {stderr}")]
    CommandFailed { status: Option<i32>, stderr: String },
}

/// Why a notification was not delivered. Logged and dropped by notifiers.
#[derive(Debug, Error)]
pub enum NotifyFailure {
    #[error("failed to launch notifier: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("notifier exited with status {status:?}: {stderr}")]
    CommandFailed { status: Option<i32>, stderr: String },
}

// ============================================================================
// Reclaim Outcome
// ============================================================================

/// Result of one reclaim attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReclaimOutcome {
    pub succeeded: bool,
    /// Confirmation on success, cause on failure
    pub detail: String,
}

impl ReclaimOutcome {
    pub fn success(detail: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            detail: detail.into(),
        }
    }

    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            detail: detail.into(),
        }
    }
}

impl From<ReclaimFailure> for ReclaimOutcome {
    fn from(err: ReclaimFailure) -> Self {
        Self::failure(err.to_string())
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Reads the host's aggregate memory counters.
///
/// Expected to be fast and synchronous; callers apply no timeout.
pub trait MemorySampler: Send + Sync {
    fn sample(&self) -> Result<MemorySnapshot, SampleError>;
}

/// Runs the privileged purge of inactive memory.
///
/// May block on a credential prompt. Never fails: errors are folded into
/// the returned outcome.
#[async_trait]
pub trait ReclaimInvoker: Send + Sync {
    async fn reclaim(&self) -> ReclaimOutcome;
}

/// Best-effort delivery of a short message to the user.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str);
}

/// The three collaborators a loop is wired with
#[derive(Clone)]
pub struct Collaborators {
    pub sampler: Arc<dyn MemorySampler>,
    pub reclaimer: Arc<dyn ReclaimInvoker>,
    pub notifier: Arc<dyn Notifier>,
}

impl Collaborators {
    pub fn with_reclaimer(mut self, reclaimer: impl ReclaimInvoker + 'static) -> Self {
        self.reclaimer = Arc::new(reclaimer);
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }
}
