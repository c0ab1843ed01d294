//! Reference band specifications.
//!
//! A [`BandSpec`] is the strict, parsed form of one biomarker's entry in the
//! reference-range table. Raw tables mix flat, sex-branched and age-branched
//! shapes; they are converted into these variants once at load time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::enums::Band;
use crate::error::ModelError;

/// Absolute tolerance used by `equal_to` predicates.
pub const EQUAL_TOLERANCE: f64 = 1e-9;

fn default_true() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

/// One numeric interval. Absent bounds are unbounded; bounds are inclusive
/// unless stated otherwise. `equal_to` overrides both bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangePredicate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub inclusive_min: bool,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub inclusive_max: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equal_to: Option<f64>,
}

impl Default for RangePredicate {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            inclusive_min: true,
            inclusive_max: true,
            equal_to: None,
        }
    }
}

impl RangePredicate {
    /// Closed interval `[min, max]`.
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..Self::default()
        }
    }

    /// `value >= min`.
    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            ..Self::default()
        }
    }

    /// `value <= max`.
    pub fn at_most(max: f64) -> Self {
        Self {
            max: Some(max),
            ..Self::default()
        }
    }

    pub fn exactly(value: f64) -> Self {
        Self {
            equal_to: Some(value),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn exclusive_min(mut self) -> Self {
        self.inclusive_min = false;
        self
    }

    #[must_use]
    pub fn exclusive_max(mut self) -> Self {
        self.inclusive_max = false;
        self
    }

    /// A predicate with `min > max` can never be satisfied and is skipped.
    pub fn is_malformed(&self) -> bool {
        matches!((self.min, self.max), (Some(lo), Some(hi)) if lo > hi)
    }

    pub fn matches(&self, value: f64) -> bool {
        if let Some(target) = self.equal_to {
            return (value - target).abs() <= EQUAL_TOLERANCE;
        }
        if let Some(lo) = self.min {
            let ok = if self.inclusive_min {
                value >= lo
            } else {
                value > lo
            };
            if !ok {
                return false;
            }
        }
        if let Some(hi) = self.max {
            let ok = if self.inclusive_max {
                value <= hi
            } else {
                value < hi
            };
            if !ok {
                return false;
            }
        }
        true
    }
}

/// Numeric band lists. Predicates within one band are OR-ed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericBands {
    #[serde(default)]
    pub optimal: Vec<RangePredicate>,
    #[serde(default)]
    pub average: Vec<RangePredicate>,
    #[serde(default)]
    pub poor: Vec<RangePredicate>,
}

impl NumericBands {
    pub fn get(&self, band: Band) -> &[RangePredicate] {
        match band {
            Band::Optimal => &self.optimal,
            Band::Average => &self.average,
            Band::Poor => &self.poor,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.optimal.is_empty() && self.average.is_empty() && self.poor.is_empty()
    }
}

/// Categorical band lists of accepted label fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalBands {
    #[serde(default)]
    pub optimal: Vec<String>,
    #[serde(default)]
    pub average: Vec<String>,
    #[serde(default)]
    pub poor: Vec<String>,
}

impl CategoricalBands {
    pub fn get(&self, band: Band) -> &[String] {
        match band {
            Band::Optimal => &self.optimal,
            Band::Average => &self.average,
            Band::Poor => &self.poor,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.optimal.is_empty() && self.average.is_empty() && self.poor.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Bands {
    Numeric(NumericBands),
    Categorical(CategoricalBands),
}

impl Bands {
    pub fn is_categorical(&self) -> bool {
        matches!(self, Bands::Categorical(_))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Bands::Numeric(bands) => bands.is_empty(),
            Bands::Categorical(bands) => bands.is_empty(),
        }
    }
}

impl Default for Bands {
    fn default() -> Self {
        Bands::Numeric(NumericBands::default())
    }
}

/// Age predicate used as a branch key: `<N`, `≤N`, `≥N` (or `>=N`), `A-B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeBand {
    Below(u32),
    AtMost(u32),
    AtLeast(u32),
    /// Inclusive on both ends.
    Between(u32, u32),
}

/// Stand-in for an unbounded end when measuring span width.
const OPEN_END: i64 = 1_000_000_000;

impl AgeBand {
    pub fn contains(&self, age: u32) -> bool {
        match *self {
            AgeBand::Below(n) => age < n,
            AgeBand::AtMost(n) => age <= n,
            AgeBand::AtLeast(n) => age >= n,
            AgeBand::Between(lo, hi) => lo <= age && age <= hi,
        }
    }

    /// Inclusive `(lo, hi)` bounds; open ends are replaced by a large sentinel.
    pub fn bounds(&self) -> (i64, i64) {
        match *self {
            AgeBand::Below(n) => (-OPEN_END, i64::from(n) - 1),
            AgeBand::AtMost(n) => (-OPEN_END, i64::from(n)),
            AgeBand::AtLeast(n) => (i64::from(n), OPEN_END),
            AgeBand::Between(lo, hi) => (i64::from(lo), i64::from(hi)),
        }
    }

    pub fn span(&self) -> i64 {
        let (lo, hi) = self.bounds();
        hi - lo
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeBand::Below(n) => write!(f, "<{n}"),
            AgeBand::AtMost(n) => write!(f, "≤{n}"),
            AgeBand::AtLeast(n) => write!(f, "≥{n}"),
            AgeBand::Between(lo, hi) => write!(f, "{lo}-{hi}"),
        }
    }
}

impl FromStr for AgeBand {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        let invalid = |message: &str| ModelError::InvalidAgeBand {
            key: s.to_string(),
            message: message.to_string(),
        };
        let number = |text: &str| -> Result<u32, ModelError> {
            let text = text.trim();
            if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid("expected a whole number of years"));
            }
            text.parse::<u32>()
                .map_err(|_| invalid("age out of range"))
        };

        if let Some(rest) = key.strip_prefix(">=").or_else(|| key.strip_prefix('≥')) {
            return Ok(AgeBand::AtLeast(number(rest)?));
        }
        if let Some(rest) = key.strip_prefix("<=").or_else(|| key.strip_prefix('≤')) {
            return Ok(AgeBand::AtMost(number(rest)?));
        }
        if let Some(rest) = key.strip_prefix('<') {
            return Ok(AgeBand::Below(number(rest)?));
        }
        if let Some((lo, hi)) = key.split_once('-') {
            let lo = number(lo)?;
            let hi = number(hi)?;
            if lo > hi {
                return Err(invalid("lower bound exceeds upper bound"));
            }
            return Ok(AgeBand::Between(lo, hi));
        }
        Err(invalid("expected <N, ≤N, ≥N, >=N or A-B"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgeBranch {
    pub band: AgeBand,
    pub spec: BandSpec,
}

/// Reference specification for one biomarker.
///
/// `unit` is the expected unit as written in the table (display spelling);
/// branches that omit it inherit the nearest ancestor's unit on resolution.
/// `fallback` holds band lists declared next to the branches; they apply
/// when no branch is selected.
#[derive(Debug, Clone, PartialEq)]
pub enum BandSpec {
    Flat {
        unit: Option<String>,
        bands: Bands,
    },
    SexBranched {
        unit: Option<String>,
        male: Option<Box<BandSpec>>,
        female: Option<Box<BandSpec>>,
        fallback: Option<Bands>,
    },
    AgeBranched {
        unit: Option<String>,
        branches: Vec<AgeBranch>,
        fallback: Option<Bands>,
    },
}

impl BandSpec {
    pub fn unit(&self) -> Option<&str> {
        match self {
            BandSpec::Flat { unit, .. }
            | BandSpec::SexBranched { unit, .. }
            | BandSpec::AgeBranched { unit, .. } => unit.as_deref(),
        }
    }

    /// Short name of the top-level shape, used in summaries.
    pub fn shape(&self) -> &'static str {
        match self {
            BandSpec::Flat {
                bands: Bands::Numeric(_),
                ..
            } => "numeric",
            BandSpec::Flat {
                bands: Bands::Categorical(_),
                ..
            } => "categorical",
            BandSpec::SexBranched { .. } => "sex_branched",
            BandSpec::AgeBranched { .. } => "age_branched",
        }
    }
}

/// A spec after sex/age branch selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBandSpec {
    /// Expected unit as written in the table, or empty.
    pub unit: String,
    pub bands: Bands,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inclusive_and_exclusive_edges() {
        let closed = RangePredicate::between(4.2, 5.0);
        assert!(closed.matches(4.2));
        assert!(closed.matches(5.0));
        let open = RangePredicate::between(5.0, 5.5).exclusive_min();
        assert!(!open.matches(5.0));
        assert!(open.matches(5.5));
    }

    #[test]
    fn equal_to_uses_tolerance() {
        let exact = RangePredicate {
            min: Some(100.0),
            ..RangePredicate::exactly(1.0)
        };
        assert!(exact.matches(1.0 + 1e-10));
        assert!(!exact.matches(1.001));
    }

    #[test]
    fn malformed_predicate_detected() {
        assert!(RangePredicate::between(5.0, 1.0).is_malformed());
        assert!(!RangePredicate::at_least(5.0).is_malformed());
    }

    #[test]
    fn predicate_defaults_from_json() {
        let p: RangePredicate =
            serde_json::from_str(r#"{"min": 1.0, "inclusive_max": false}"#).expect("parse");
        assert!(p.inclusive_min);
        assert!(!p.inclusive_max);
        assert_eq!(p.max, None);
    }

    #[test]
    fn age_bands_parse() {
        assert_eq!("<60".parse::<AgeBand>(), Ok(AgeBand::Below(60)));
        assert_eq!("≤17".parse::<AgeBand>(), Ok(AgeBand::AtMost(17)));
        assert_eq!("≥60".parse::<AgeBand>(), Ok(AgeBand::AtLeast(60)));
        assert_eq!(">= 50".parse::<AgeBand>(), Ok(AgeBand::AtLeast(50)));
        assert_eq!("18 - 29".parse::<AgeBand>(), Ok(AgeBand::Between(18, 29)));
        assert!("29-18".parse::<AgeBand>().is_err());
        assert!("adult".parse::<AgeBand>().is_err());
        assert!("M".parse::<AgeBand>().is_err());
    }

    #[test]
    fn age_band_membership_and_span() {
        assert!(AgeBand::Below(60).contains(59));
        assert!(!AgeBand::Below(60).contains(60));
        assert!(AgeBand::AtLeast(60).contains(60));
        assert!(AgeBand::Between(18, 29).contains(29));
        assert_eq!(AgeBand::Between(18, 29).span(), 11);
        assert!(AgeBand::Between(18, 29).span() < AgeBand::AtLeast(18).span());
    }

    #[test]
    fn age_band_display_round_trips() {
        for key in ["<60", "≤17", "≥60", "18-29"] {
            let band: AgeBand = key.parse().expect("parse");
            assert_eq!(band.to_string(), key);
        }
    }
}
