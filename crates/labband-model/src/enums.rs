//! Type-safe enumerations for classification and comparison.
//!
//! Reference tables and stored reports spell these as lowercase strings;
//! the enums keep the spelling in one place and give each value an order
//! where one exists.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Clinical risk band a value is classified into.
///
/// Bands are tested in declaration order: the first band whose predicates
/// match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    /// Within the optimal reference interval.
    Optimal,
    /// Outside optimal but not of concern. Reported as "normal".
    Average,
    /// Of clinical concern. Reported as "critical".
    Poor,
}

impl Band {
    /// Bands in classification priority order.
    pub const PRIORITY: [Band; 3] = [Band::Optimal, Band::Average, Band::Poor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Optimal => "optimal",
            Band::Average => "average",
            Band::Poor => "poor",
        }
    }

    /// Output bucket that holds values classified into this band.
    pub fn bucket(&self) -> Bucket {
        match self {
            Band::Optimal => Bucket::Good,
            Band::Average => Bucket::Normal,
            Band::Poor => Bucket::Critical,
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Band {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "optimal" => Ok(Band::Optimal),
            "average" | "normal" => Ok(Band::Average),
            "poor" => Ok(Band::Poor),
            _ => Err(ModelError::UnknownBand(s.to_string())),
        }
    }
}

/// Output bucket of a classified report.
///
/// Ordered from worst to best so that `Ord` matches [`Bucket::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Critical,
    Normal,
    Good,
}

impl Bucket {
    /// All buckets, best first. This is the lookup order used when a key
    /// is (incorrectly) present in more than one bucket.
    pub const ALL: [Bucket; 3] = [Bucket::Good, Bucket::Normal, Bucket::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Critical => "critical",
            Bucket::Normal => "normal",
            Bucket::Good => "good",
        }
    }

    /// Numeric rank used for transition scoring: critical 0, normal 1, good 2.
    pub fn rank(&self) -> i32 {
        match self {
            Bucket::Critical => 0,
            Bucket::Normal => 1,
            Bucket::Good => 2,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Bucket::Critical),
            "normal" => Ok(Bucket::Normal),
            "good" => Ok(Bucket::Good),
            _ => Err(ModelError::UnknownBucket(s.to_string())),
        }
    }
}

/// Biological sex used to select sex-branched reference ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    /// The branch key used in reference tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }

    /// Lenient parse of a free-text gender field; anything unrecognised is `None`.
    pub fn from_gender(value: &str) -> Option<Sex> {
        value.parse().ok()
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Sex {
    type Err = ModelError;

    /// Accepts `M`/`F` and `male`/`female`, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "M" | "MALE" => Ok(Sex::Male),
            "F" | "FEMALE" => Ok(Sex::Female),
            _ => Err(ModelError::UnknownSex(s.to_string())),
        }
    }
}

/// Direction of a band transition or of a category's net score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Better,
    Worse,
    Same,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Better => "better",
            Trend::Worse => "worse",
            Trend::Same => "same",
        }
    }

    /// Trend implied by the sign of a score.
    pub fn from_score(score: i32) -> Trend {
        match score.signum() {
            1 => Trend::Better,
            -1 => Trend::Worse,
            _ => Trend::Same,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a raw result could not be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// Name not present in the reference table.
    UnknownMarker,
    /// No conversion path from the reported unit to the expected unit.
    UnitMismatch,
    /// Numeric biomarker whose result does not parse as a number.
    NonNumericValue,
    /// Value falls outside every configured band.
    NoBandMatch,
    /// Categorical value did not match any accepted label.
    UnclassifiedCategorical,
}

impl InvalidReason {
    pub const ALL: [InvalidReason; 5] = [
        InvalidReason::UnknownMarker,
        InvalidReason::UnitMismatch,
        InvalidReason::NonNumericValue,
        InvalidReason::NoBandMatch,
        InvalidReason::UnclassifiedCategorical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::UnknownMarker => "unknown_marker",
            InvalidReason::UnitMismatch => "unit_mismatch",
            InvalidReason::NonNumericValue => "non_numeric_value",
            InvalidReason::NoBandMatch => "no_band_match",
            InvalidReason::UnclassifiedCategorical => "unclassified_categorical",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
