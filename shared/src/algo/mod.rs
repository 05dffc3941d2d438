//! Small numeric helpers used by the search algorithms and the harness
//!
//! Arithmetic here never panics on degenerate input; it falls back to a
//! defined value instead so a single bad reading cannot stop a search.

pub mod misc;
pub mod stats;

pub use misc::{safe_div, skim};
pub use stats::{mean, std_dev};
