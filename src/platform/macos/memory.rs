//! macOS memory counters and purge
//!
//! sysinfo covers total and available memory. The active, inactive and
//! wired page counts come from `vm_stat`, and reclaim runs `purge`.

use std::process::Command;
use tracing::debug;

use crate::core::config::Elevation;
use crate::core::snapshot::ExtendedCounters;

/// Page size `vm_stat` reports on Apple Silicon; Intel Macs use 4096.
const FALLBACK_PAGE_SIZE: u64 = 16384;

/// Parse `vm_stat` output into byte counters.
///
/// ```text
/// Mach Virtual Memory Statistics: (page size of 16384 bytes)
/// Pages free:                               12345.
/// Pages active:                            234567.
/// Pages inactive:                          223344.
/// Pages wired down:                        112233.
/// ```
pub fn parse_vm_stat(output: &str) -> ExtendedCounters {
    let mut lines = output.lines();
    let page_size = lines
        .next()
        .and_then(parse_page_size)
        .unwrap_or(FALLBACK_PAGE_SIZE);

    let mut counters = ExtendedCounters::default();
    for line in lines {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let Ok(pages) = value.trim().trim_end_matches('.').parse::<u64>() else {
            continue;
        };
        let bytes = pages.saturating_mul(page_size);

        match key.trim() {
            "Pages active" => counters.active_bytes = bytes,
            "Pages inactive" => counters.inactive_bytes = bytes,
            "Pages wired down" => counters.wired_bytes = bytes,
            _ => {}
        }
    }

    counters
}

fn parse_page_size(header: &str) -> Option<u64> {
    let rest = header.split("page size of").nth(1)?;
    rest.split_whitespace().next()?.parse().ok()
}

/// Run `vm_stat`; zero counters when it is missing or fails
pub fn extended_counters() -> ExtendedCounters {
    match Command::new("vm_stat").output() {
        Ok(output) if output.status.success() => {
            parse_vm_stat(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            debug!("vm_stat exited with {}", output.status);
            ExtendedCounters::default()
        }
        Err(e) => {
            debug!("vm_stat unavailable: {}", e);
            ExtendedCounters::default()
        }
    }
}

/// AppleScript that asks for an administrator password, then purges
pub const ADMIN_PURGE_SCRIPT: &str = r#"do shell script "purge" with administrator privileges"#;

/// Argv that purges inactive memory with the requested elevation
pub fn default_reclaim_command(is_root: bool, elevation: Elevation) -> Vec<String> {
    if is_root {
        return vec!["purge".to_string()];
    }
    match elevation {
        Elevation::Sudo => vec!["sudo".to_string(), "purge".to_string()],
        Elevation::AdminDialog => vec![
            "osascript".to_string(),
            "-e".to_string(),
            ADMIN_PURGE_SCRIPT.to_string(),
        ],
    }
}
