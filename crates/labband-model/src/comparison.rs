//! Output shape of a two-report band comparison.

use serde::{Deserialize, Serialize};

use crate::enums::{Bucket, Trend};
use crate::key::BiomarkerKey;

/// Band change of one biomarker between the older and the newer report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandTransition {
    pub biomarker: BiomarkerKey,
    /// Category title.
    pub category: String,
    #[serde(rename = "from")]
    pub from_band: Option<Bucket>,
    #[serde(rename = "to")]
    pub to_band: Option<Bucket>,
    pub trend: Trend,
    pub step: u32,
    pub score: i32,
    pub weight: f64,
    pub old_value: Option<f64>,
    pub new_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAggregate {
    pub key: String,
    #[serde(rename = "category")]
    pub title: String,
    pub improved: usize,
    pub worsened: usize,
    pub same: usize,
    pub net_score: i32,
    pub weighted_net: f64,
    pub trend: Trend,
}

impl CategoryAggregate {
    pub fn empty(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            improved: 0,
            worsened: 0,
            same: 0,
            net_score: 0,
            weighted_net: 0.0,
            trend: Trend::Same,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonDates {
    pub old: String,
    pub new: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overall {
    pub date_old: String,
    pub date_new: String,
    pub better_categories: usize,
    pub same_categories: usize,
    pub worse_categories: usize,
    pub net_score: i32,
    pub weighted_net_score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub key: String,
    /// Category title.
    pub category: String,
    pub delta: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlights {
    pub improvements: Vec<Highlight>,
    pub regressions: Vec<Highlight>,
}

/// Watch-list flags rendered as `"<biomarker> <from>→<to>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    #[serde(rename = "Positive")]
    pub positive: Vec<String>,
    #[serde(rename = "Caution")]
    pub caution: Vec<String>,
}

impl Flags {
    pub fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.caution.is_empty()
    }
}

/// Biomarkers present on only one side. Informational; never scored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    pub appeared: Vec<BiomarkerKey>,
    pub disappeared: Vec<BiomarkerKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub dates: ComparisonDates,
    pub overall: Overall,
    pub categories: Vec<CategoryAggregate>,
    pub transitions: Vec<BandTransition>,
    pub highlights: Highlights,
    pub flags: Flags,
    pub diff: Diff,
}
