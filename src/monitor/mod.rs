//! Human-readable memory status output

pub mod report;

pub use report::{render_status, usage_bar};
