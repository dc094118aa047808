//! Linux Platform Support
//!
//! Extended counters come from /proc/meminfo; reclaim writes to
//! /proc/sys/vm/drop_caches, which requires root or CAP_SYS_ADMIN.

pub mod memory;

pub use memory::{
    default_reclaim_command, extended_counters, parse_meminfo, read_meminfo, Meminfo,
    DROP_CACHES_SCRIPT,
};
