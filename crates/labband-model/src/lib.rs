//! Data model for lab-result band classification and report comparison.

pub mod bands;
pub mod category;
pub mod comparison;
pub mod enums;
pub mod error;
pub mod key;
pub mod report;

pub use bands::{
    AgeBand, AgeBranch, BandSpec, Bands, CategoricalBands, NumericBands, RangePredicate,
    ResolvedBandSpec,
};
pub use category::{Category, CategoryIndex, UNMAPPED_CATEGORY};
pub use comparison::{
    BandTransition, CategoryAggregate, ComparisonDates, ComparisonResult, Diff, Flags, Highlight,
    Highlights, Overall,
};
pub use enums::{Band, Bucket, InvalidReason, Sex, Trend};
pub use error::{ModelError, Result};
pub use key::BiomarkerKey;
pub use report::{
    ClassificationCounts, ClassificationOutcome, ClassifiedReport, InvalidRecord, RawResult,
    RecordValue, RecordedReason, ValueRecord,
};
