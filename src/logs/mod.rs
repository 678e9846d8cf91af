//! Log consolidation.

pub mod merger;

pub use merger::{merge_logs, subprocess_log_paths};
