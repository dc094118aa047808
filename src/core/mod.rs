//! Core optimiser logic

pub mod config;
pub mod optimizer;
pub mod shutdown;
pub mod snapshot;
