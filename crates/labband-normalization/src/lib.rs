//! Normalization of free-text lab inputs: unit spellings and conversions,
//! biomarker names, and numeric results.

pub mod error;
pub mod names;
pub mod numeric;
pub mod units;

pub use error::{ConversionError, UnitTableError};
pub use names::{NameAliases, NameConfig, slugify};
pub use numeric::{VALUE_DECIMALS, parse_lenient_f64, round_to};
pub use units::{UnitConfig, UnitTable, normalize_spelling};
