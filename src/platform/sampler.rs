//! Host memory sampler
//!
//! Uses sysinfo for the primary counters on every platform, then layers the
//! host-specific extended counters on top.

use sysinfo::System;

use crate::core::snapshot::{ExtendedCounters, MemorySnapshot};
use crate::platform::traits::{MemorySampler, SampleError};

/// Reads the current host's memory counters
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSampler;

impl SystemSampler {
    pub fn new() -> Self {
        Self
    }
}

impl MemorySampler for SystemSampler {
    fn sample(&self) -> Result<MemorySnapshot, SampleError> {
        let mut sys = System::new();
        sys.refresh_memory();

        let total = sys.total_memory();
        if total == 0 {
            return Err(SampleError::PlatformUnsupported(
                "host does not report total memory".to_string(),
            ));
        }

        Ok(MemorySnapshot::from_counters(
            total,
            sys.available_memory(),
            host_extended_counters(),
        ))
    }
}

#[cfg(target_os = "linux")]
fn host_extended_counters() -> ExtendedCounters {
    super::linux::extended_counters()
}

#[cfg(target_os = "macos")]
fn host_extended_counters() -> ExtendedCounters {
    super::macos::extended_counters()
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn host_extended_counters() -> ExtendedCounters {
    ExtendedCounters::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_host() {
        let snap = SystemSampler::new().sample().unwrap();
        assert!(snap.total_bytes > 0);
        assert!((0.0..=100.0).contains(&snap.percent_used));
        assert_eq!(snap.used_bytes + snap.free_bytes, snap.total_bytes);
    }
}
