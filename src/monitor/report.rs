//! Text status report printed by test mode

use crate::core::config::{Classification, OptimizationConfig};
use crate::core::snapshot::MemorySnapshot;

const BAR_WIDTH: usize = 40;

/// `[#####-----]`-style usage bar
pub fn usage_bar(percent_used: f64) -> String {
    let filled = ((percent_used.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

pub fn render_status(
    snapshot: &MemorySnapshot,
    config: &OptimizationConfig,
    sampled_at: chrono::DateTime<chrono::Local>,
) -> String {
    let status = match config.classify(snapshot) {
        Classification::OverThreshold => "OVER THRESHOLD",
        Classification::Normal => "OK",
    };

    format!(
r#"
=============== Memory Optimiser Status ===============
Sampled at:      {}

Memory Usage:    {} {:.1}%
Total Memory:    {:>8.2} GB
Used Memory:     {:>8.2} GB
Free Memory:     {:>8.2} GB
Active Memory:   {:>8.2} GB
Inactive Memory: {:>8.2} GB
Wired Memory:    {:>8.2} GB

Threshold:       {:.1}% ({})
Auto-optimise:   {}
========================================================
"#,
        sampled_at.format("%Y-%m-%d %H:%M:%S"),
        usage_bar(snapshot.percent_used),
        snapshot.percent_used,
        snapshot.total_gb(),
        snapshot.used_gb(),
        snapshot.free_gb(),
        snapshot.active_gb(),
        snapshot.inactive_gb(),
        snapshot.wired_gb(),
        config.threshold_percent,
        status,
        if config.auto_optimise { "Enabled" } else { "Disabled" },
    )
}
