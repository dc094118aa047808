//! Memory Optimiser
//!
//! Periodically samples host memory utilization and, when it reaches a
//! configured threshold, either notifies the user or runs a privileged
//! command that purges inactive memory.
//!
//! ## Components
//!
//! - **MemorySampler**: reads the host's memory counters into a snapshot
//! - **ReclaimInvoker**: runs the privileged purge command
//! - **Notifier**: best-effort user notification
//! - **OptimizationLoop**: cadence, threshold decision and before/after measurement
//!
//! The collaborators are traits, so the loop runs against deterministic
//! fakes in tests and against the host in the binary.

pub mod core;
pub mod logging;
pub mod monitor;
pub mod platform;

// Re-exports
pub use core::config::{Classification, ConfigError, OptimizationConfig, Settings};
pub use core::optimizer::{LoopSummary, OptimizationLoop, TickOutcome};
pub use core::shutdown::{install_signal_handlers, ShutdownSignal};
pub use core::snapshot::{ExtendedCounters, MemorySnapshot};
pub use platform::{
    create_collaborators, Collaborators, MemorySampler, Notifier, ReclaimInvoker,
    ReclaimOutcome, SampleError,
};
