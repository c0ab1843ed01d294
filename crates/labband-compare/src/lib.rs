//! Longitudinal comparison of two classified lab reports.
//!
//! [`compare`] scores each biomarker's band move (critical → normal → good),
//! rolls the scores up per clinical category and derives the overall trend,
//! highlights, watch-list flags and presence diff.

pub mod dates;
pub mod engine;

pub use dates::{Chronology, chronology, parse_report_date};
pub use engine::{CompareOptions, HIGHLIGHT_LIMIT, compare, transition_score};
