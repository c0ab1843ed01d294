//! Adapter for the extraction service's output.
//!
//! Turns extracted document field maps into [`RawResult`](labband_model::RawResult)s,
//! merges the documents of one upload and derives the demographics used to
//! pick reference ranges.

pub mod demographics;
pub mod document;
pub mod error;
pub mod merge;

pub use demographics::{
    age_from_fields, age_on, chronological_age, parse_date_of_birth, sex_from_fields,
};
pub use document::{ExtractedDocument, METADATA_FIELDS, REPORT_DATE_FIELD, flatten_fields};
pub use error::IngestError;
pub use merge::{MergedUpload, merge_documents};
