//! Grouping of a classified report by clinical category.

use labband_model::{BiomarkerKey, CategoryIndex, ClassifiedReport};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionOptions {
    /// Add an `invalid` list per category.
    pub include_invalid: bool,
    /// Add a `missing` list of members found nowhere in the report.
    pub include_missing: bool,
}

impl Default for SectionOptions {
    fn default() -> Self {
        Self {
            include_invalid: true,
            include_missing: false,
        }
    }
}

/// Members of one category, partitioned by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionBuckets {
    pub key: String,
    pub title: String,
    pub optimal: Vec<BiomarkerKey>,
    pub normal: Vec<BiomarkerKey>,
    pub poor: Vec<BiomarkerKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid: Option<Vec<BiomarkerKey>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<BiomarkerKey>>,
}

/// Partition each category's members by where they landed in `report`.
///
/// Categories keep index order and members keep their declared order.
pub fn group_by_section(
    index: &CategoryIndex,
    report: &ClassifiedReport,
    options: SectionOptions,
) -> Vec<SectionBuckets> {
    index
        .categories()
        .iter()
        .map(|category| {
            let mut buckets = SectionBuckets {
                key: category.key.clone(),
                title: category.title.clone(),
                invalid: options.include_invalid.then(Vec::new),
                missing: options.include_missing.then(Vec::new),
                ..SectionBuckets::default()
            };
            for member in &category.biomarkers {
                let target = if report.normal.contains_key(member) {
                    Some(&mut buckets.normal)
                } else if report.good.contains_key(member) {
                    Some(&mut buckets.optimal)
                } else if report.critical.contains_key(member) {
                    Some(&mut buckets.poor)
                } else if buckets.invalid.is_some() && report.invalid.contains_key(member) {
                    buckets.invalid.as_mut()
                } else {
                    buckets.missing.as_mut()
                };
                if let Some(list) = target {
                    list.push(member.clone());
                }
            }
            buckets
        })
        .collect()
}
