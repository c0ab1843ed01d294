//! Band classification of lab results against reference ranges.
//!
//! [`resolve`] picks the sex/age branch of a biomarker's specification,
//! [`classify_numeric`] and [`classify_categorical`] place one value in a
//! band, [`classify_report`] runs a whole report, and [`group_by_section`]
//! arranges the result by clinical category.

pub mod classifier;
pub mod report;
pub mod resolver;
pub mod sections;

pub use classifier::{classify_categorical, classify_numeric};
pub use report::{ClassificationContext, classify_entry, classify_report};
pub use resolver::{resolve, select_age_branch};
pub use sections::{SectionBuckets, SectionOptions, group_by_section};
