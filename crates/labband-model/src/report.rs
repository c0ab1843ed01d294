//! Raw inputs and classification outputs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::enums::{Band, Bucket, InvalidReason};
use crate::key::BiomarkerKey;

/// One untrusted lab result as produced by the extraction collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResult {
    pub biomarker_name: String,
    pub result: String,
    #[serde(default)]
    pub units: String,
}

impl RawResult {
    pub fn new(
        biomarker_name: impl Into<String>,
        result: impl Into<String>,
        units: impl Into<String>,
    ) -> Self {
        Self {
            biomarker_name: biomarker_name.into(),
            result: result.into(),
            units: units.into(),
        }
    }
}

/// A stored value: numeric for numeric biomarkers, the raw label otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordValue {
    Number(f64),
    Text(String),
}

impl RecordValue {
    /// Numeric view of the value; text is parsed leniently, failures are `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RecordValue::Number(value) => Some(*value),
            RecordValue::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite()),
        }
    }
}

impl From<f64> for RecordValue {
    fn from(value: f64) -> Self {
        RecordValue::Number(value)
    }
}

impl From<&str> for RecordValue {
    fn from(value: &str) -> Self {
        RecordValue::Text(value.to_string())
    }
}

/// Value stored under a classified biomarker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
    pub value: RecordValue,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub expected_unit: String,
    /// `converted:<from>-><to>` when a unit conversion was applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Reason on an invalid record.
///
/// Older stored reports carry free text (`"Invalid unit"`) instead of a
/// reason code; that text is kept as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordedReason {
    Known(InvalidReason),
    Other(String),
}

impl RecordedReason {
    pub fn known(&self) -> Option<InvalidReason> {
        match self {
            RecordedReason::Known(reason) => Some(*reason),
            RecordedReason::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RecordedReason::Known(reason) => reason.as_str(),
            RecordedReason::Other(text) => text,
        }
    }
}

impl From<InvalidReason> for RecordedReason {
    fn from(reason: InvalidReason) -> Self {
        RecordedReason::Known(reason)
    }
}

impl PartialEq<InvalidReason> for RecordedReason {
    fn eq(&self, other: &InvalidReason) -> bool {
        self.known() == Some(*other)
    }
}

impl fmt::Display for RecordedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload recorded for a biomarker that could not be classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidRecord {
    pub reason: RecordedReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RecordValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl InvalidRecord {
    /// Record carrying only the reason.
    pub fn bare(reason: InvalidReason) -> Self {
        Self {
            reason: reason.into(),
            value: None,
            unit: None,
            expected_unit: None,
            detail: None,
        }
    }
}

/// Result of classifying one raw entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationOutcome {
    Classified { band: Band, record: ValueRecord },
    Invalid(InvalidRecord),
}

impl ClassificationOutcome {
    pub fn invalid_reason(&self) -> Option<InvalidReason> {
        match self {
            ClassificationOutcome::Classified { .. } => None,
            ClassificationOutcome::Invalid(record) => record.reason.known(),
        }
    }
}

/// Per-outcome counts of a classified report.
///
/// `optimal + normal + poor + invalid` equals the number of distinct
/// biomarker keys; `duplicates` counts raw entries overwritten by a later
/// entry with the same key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationCounts {
    pub optimal: usize,
    pub normal: usize,
    pub poor: usize,
    pub invalid: usize,
    #[serde(default)]
    pub duplicates: usize,
    #[serde(default)]
    pub invalid_breakdown: BTreeMap<InvalidReason, usize>,
}

impl Default for ClassificationCounts {
    fn default() -> Self {
        Self {
            optimal: 0,
            normal: 0,
            poor: 0,
            invalid: 0,
            duplicates: 0,
            invalid_breakdown: InvalidReason::ALL.iter().map(|r| (*r, 0)).collect(),
        }
    }
}

impl ClassificationCounts {
    pub fn record(&mut self, outcome: &ClassificationOutcome) {
        match outcome {
            ClassificationOutcome::Classified { band, .. } => match band {
                Band::Optimal => self.optimal += 1,
                Band::Average => self.normal += 1,
                Band::Poor => self.poor += 1,
            },
            ClassificationOutcome::Invalid(record) => {
                self.invalid += 1;
                if let Some(reason) = record.reason.known() {
                    *self.invalid_breakdown.entry(reason).or_insert(0) += 1;
                }
            }
        }
    }

    pub fn total(&self) -> usize {
        self.optimal + self.normal + self.poor + self.invalid
    }
}

/// A lab report bucketed into good / normal / critical plus invalid entries.
///
/// Deserialization also accepts the stored `*_biomarkers` key spellings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredReport")]
pub struct ClassifiedReport {
    pub counts: ClassificationCounts,
    pub good: BTreeMap<BiomarkerKey, ValueRecord>,
    pub normal: BTreeMap<BiomarkerKey, ValueRecord>,
    pub critical: BTreeMap<BiomarkerKey, ValueRecord>,
    pub invalid: BTreeMap<BiomarkerKey, InvalidRecord>,
}

type Bucketed = BTreeMap<BiomarkerKey, ValueRecord>;

/// Wire shape of a report, current and legacy keys side by side.
///
/// As soon as any of `good`, `normal` or `critical` is present the legacy
/// band keys are ignored; `invalid` likewise wins over `invalid_biomarkers`.
#[derive(Deserialize)]
struct StoredReport {
    #[serde(default)]
    counts: ClassificationCounts,
    good: Option<Bucketed>,
    normal: Option<Bucketed>,
    critical: Option<Bucketed>,
    invalid: Option<BTreeMap<BiomarkerKey, InvalidRecord>>,
    good_biomarkers: Option<Bucketed>,
    normal_biomarkers: Option<Bucketed>,
    critical_biomarkers: Option<Bucketed>,
    invalid_biomarkers: Option<BTreeMap<BiomarkerKey, InvalidRecord>>,
}

impl From<StoredReport> for ClassifiedReport {
    fn from(stored: StoredReport) -> Self {
        let current = stored.good.is_some() || stored.normal.is_some() || stored.critical.is_some();
        let (good, normal, critical) = if current {
            (stored.good, stored.normal, stored.critical)
        } else {
            (
                stored.good_biomarkers,
                stored.normal_biomarkers,
                stored.critical_biomarkers,
            )
        };
        Self {
            counts: stored.counts,
            good: good.unwrap_or_default(),
            normal: normal.unwrap_or_default(),
            critical: critical.unwrap_or_default(),
            invalid: stored
                .invalid
                .or(stored.invalid_biomarkers)
                .unwrap_or_default(),
        }
    }
}

impl ClassifiedReport {
    pub fn bucket(&self, bucket: Bucket) -> &BTreeMap<BiomarkerKey, ValueRecord> {
        match bucket {
            Bucket::Good => &self.good,
            Bucket::Normal => &self.normal,
            Bucket::Critical => &self.critical,
        }
    }

    pub fn bucket_mut(&mut self, bucket: Bucket) -> &mut BTreeMap<BiomarkerKey, ValueRecord> {
        match bucket {
            Bucket::Good => &mut self.good,
            Bucket::Normal => &mut self.normal,
            Bucket::Critical => &mut self.critical,
        }
    }

    /// Bucket holding `key`, searched good → normal → critical.
    pub fn bucket_of(&self, key: &str) -> Option<Bucket> {
        Bucket::ALL
            .into_iter()
            .find(|bucket| self.bucket(*bucket).contains_key(key))
    }

    /// The stored record for `key`, searched in the same order as [`Self::bucket_of`].
    pub fn record_of(&self, key: &str) -> Option<&ValueRecord> {
        Bucket::ALL
            .into_iter()
            .find_map(|bucket| self.bucket(bucket).get(key))
    }

    /// Keys present in any of the three band buckets (invalid entries excluded).
    pub fn classified_keys(&self) -> impl Iterator<Item = &BiomarkerKey> {
        self.good
            .keys()
            .chain(self.normal.keys())
            .chain(self.critical.keys())
    }

    /// True when no biomarker landed in a band bucket.
    pub fn has_no_classified(&self) -> bool {
        self.good.is_empty() && self.normal.is_empty() && self.critical.is_empty()
    }
}
