//! Linux memory counters and cache reclaim
//!
//! - /proc/meminfo for the Active and Inactive counters sysinfo does not expose
//! - /proc/sys/vm/drop_caches for reclaiming page cache, dentries and inodes

use std::fs;
use tracing::debug;

use crate::core::config::Elevation;
use crate::core::snapshot::ExtendedCounters;
use crate::platform::traits::SampleError;

const MEMINFO_PATH: &str = "/proc/meminfo";

/// Shell snippet that flushes dirty pages, then drops all caches (level 3).
pub const DROP_CACHES_SCRIPT: &str = "sync && echo 3 > /proc/sys/vm/drop_caches";

/// The /proc/meminfo counters sysinfo leaves out, in bytes.
///
/// `total` is only read to reject a truncated file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Meminfo {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
}

impl Meminfo {
    pub fn extended(&self) -> ExtendedCounters {
        ExtendedCounters {
            active_bytes: self.active,
            inactive_bytes: self.inactive,
            // Linux has no wired-page counter
            wired_bytes: 0,
        }
    }
}

/// Parse the text of /proc/meminfo. Unknown or malformed lines are skipped.
pub fn parse_meminfo(content: &str) -> Meminfo {
    let mut info = Meminfo::default();

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = parse_kb_value(value.trim());

        match key.trim() {
            "MemTotal" => info.total = value,
            "Active" => info.active = value,
            "Inactive" => info.inactive = value,
            _ => {}
        }
    }

    info
}

/// Parse "1234 kB" into bytes
fn parse_kb_value(value: &str) -> u64 {
    let mut parts = value.split_whitespace();
    let number = parts
        .next()
        .and_then(|n| n.parse::<u64>().ok())
        .unwrap_or(0);

    match parts.next() {
        Some("kB") | Some("KB") => number.saturating_mul(1024),
        _ => number,
    }
}

pub fn read_meminfo() -> Result<Meminfo, SampleError> {
    let content = fs::read_to_string(MEMINFO_PATH)?;
    let info = parse_meminfo(&content);
    if info.total == 0 {
        return Err(SampleError::Query(format!("MemTotal missing from {}", MEMINFO_PATH)));
    }
    Ok(info)
}

/// Active/Inactive from /proc/meminfo, zero when unreadable
pub fn extended_counters() -> ExtendedCounters {
    match read_meminfo() {
        Ok(info) => info.extended(),
        Err(e) => {
            debug!("Extended counters unavailable: {}", e);
            ExtendedCounters::default()
        }
    }
}

/// Argv that drops the page cache with the requested elevation
pub fn default_reclaim_command(is_root: bool, elevation: Elevation) -> Vec<String> {
    let mut argv = Vec::new();
    if !is_root {
        argv.push(
            match elevation {
                Elevation::Sudo => "sudo",
                Elevation::AdminDialog => "pkexec",
            }
            .to_string(),
        );
    }
    argv.extend(["sh", "-c", DROP_CACHES_SCRIPT].map(String::from));
    argv
}
