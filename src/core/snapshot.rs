//! Point-in-time memory readings
//!
//! A [`MemorySnapshot`] is built fresh on every sampling call and discarded
//! at the end of the tick that produced it.

use std::fmt;

/// Bytes per gibibyte, the unit used for every human-facing figure.
pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Secondary counters that not every host exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtendedCounters {
    pub active_bytes: u64,
    pub inactive_bytes: u64,
    pub wired_bytes: u64,
}

/// Immutable memory reading for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySnapshot {
    /// Share of total memory in use, 0-100
    pub percent_used: f64,
    pub total_bytes: u64,
    pub used_bytes: u64,
    /// Memory the host can hand out without swapping
    pub free_bytes: u64,
    pub active_bytes: u64,
    pub inactive_bytes: u64,
    pub wired_bytes: u64,
}

impl MemorySnapshot {
    /// Build a snapshot from the primary counters.
    ///
    /// `available` is clamped to `total`, so `used + free == total` and
    /// `percent_used` always lies in `[0, 100]`.
    pub fn from_counters(total: u64, available: u64, extended: ExtendedCounters) -> Self {
        let free = available.min(total);
        let used = total - free;
        let percent_used = if total > 0 {
            (used as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        Self {
            percent_used,
            total_bytes: total,
            used_bytes: used,
            free_bytes: free,
            active_bytes: extended.active_bytes,
            inactive_bytes: extended.inactive_bytes,
            wired_bytes: extended.wired_bytes,
        }
    }

    pub fn total_gb(&self) -> f64 {
        self.total_bytes as f64 / BYTES_PER_GB
    }

    pub fn used_gb(&self) -> f64 {
        self.used_bytes as f64 / BYTES_PER_GB
    }

    pub fn free_gb(&self) -> f64 {
        self.free_bytes as f64 / BYTES_PER_GB
    }

    pub fn active_gb(&self) -> f64 {
        self.active_bytes as f64 / BYTES_PER_GB
    }

    pub fn inactive_gb(&self) -> f64 {
        self.inactive_bytes as f64 / BYTES_PER_GB
    }

    pub fn wired_gb(&self) -> f64 {
        self.wired_bytes as f64 / BYTES_PER_GB
    }

    /// Signed change in free memory from `self` to `later`.
    ///
    /// Negative when other processes consumed memory in between.
    pub fn free_delta(&self, later: &MemorySnapshot) -> i64 {
        later.free_bytes as i64 - self.free_bytes as i64
    }
}

impl fmt::Display for MemorySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}% used ({:.2}GB/{:.2}GB) - Free: {:.2}GB, Active: {:.2}GB, Inactive: {:.2}GB, Wired: {:.2}GB",
            self.percent_used,
            self.used_gb(),
            self.total_gb(),
            self.free_gb(),
            self.active_gb(),
            self.inactive_gb(),
            self.wired_gb(),
        )
    }
}

/// Format a signed byte count as gibibytes with two decimals.
pub fn format_gb(bytes: i64) -> String {
    format!("{:.2}GB", bytes as f64 / BYTES_PER_GB)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn test_from_counters_derives_used_and_percent() {
        let snap = MemorySnapshot::from_counters(1000, 200, ExtendedCounters::default());
        assert_eq!(snap.used_bytes, 800);
        assert_eq!(snap.free_bytes, 200);
        assert_eq!(snap.percent_used, 80.0);
        assert_eq!(snap.used_bytes + snap.free_bytes, snap.total_bytes);
    }

    #[test]
    fn test_available_above_total_is_clamped() {
        let snap = MemorySnapshot::from_counters(100, 150, ExtendedCounters::default());
        assert_eq!(snap.free_bytes, 100);
        assert_eq!(snap.used_bytes, 0);
        assert_eq!(snap.percent_used, 0.0);
    }

    #[test]
    fn test_zero_total_yields_zero_percent() {
        let snap = MemorySnapshot::from_counters(0, 0, ExtendedCounters::default());
        assert_eq!(snap.percent_used, 0.0);
    }

    #[test]
    fn test_percent_stays_in_range() {
        for (total, available) in [(1, 0), (u64::MAX, 0), (u64::MAX, u64::MAX), (17, 3)] {
            let snap = MemorySnapshot::from_counters(total, available, ExtendedCounters::default());
            assert!((0.0..=100.0).contains(&snap.percent_used));
        }
    }

    #[test]
    fn test_free_delta_is_signed() {
        let before = MemorySnapshot::from_counters(16 * GB, 4 * GB, ExtendedCounters::default());
        let after = MemorySnapshot::from_counters(16 * GB, 3 * GB, ExtendedCounters::default());
        assert_eq!(before.free_delta(&after), -(GB as i64));
        assert_eq!(after.free_delta(&before), GB as i64);
    }

    #[test]
    fn test_display_includes_all_counters() {
        let snap = MemorySnapshot::from_counters(
            16 * GB,
            4 * GB,
            ExtendedCounters {
                active_bytes: 6 * GB,
                inactive_bytes: 2 * GB,
                wired_bytes: GB,
            },
        );
        let line = snap.to_string();
        assert!(line.starts_with("75.0% used (12.00GB/16.00GB)"));
        assert!(line.contains("Free: 4.00GB"));
        assert!(line.contains("Active: 6.00GB"));
        assert!(line.contains("Inactive: 2.00GB"));
        assert!(line.contains("Wired: 1.00GB"));
    }

    #[test]
    fn test_format_gb() {
        assert_eq!(format_gb(GB as i64 / 2), "0.50GB");
        assert_eq!(format_gb(-(2 * GB as i64)), "-2.00GB");
    }
}
