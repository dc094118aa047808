//! macOS Platform Support
//!
//! Provides memory statistics via `vm_stat` and reclaim via `purge`,
//! which needs root (through sudo or the administrator dialog).

pub mod memory;

pub use memory::{default_reclaim_command, extended_counters, parse_vm_stat, ADMIN_PURGE_SCRIPT};
