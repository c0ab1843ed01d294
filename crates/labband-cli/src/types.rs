use labband_classify::SectionBuckets;
use labband_model::{ClassifiedReport, Sex};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ClassifyResult {
    pub documents: usize,
    pub report_date: Option<String>,
    pub sex: Option<Sex>,
    pub age: Option<u32>,
    /// `None` when no result could be classified.
    pub report: Option<ClassifiedReport>,
    pub sections: Vec<SectionBuckets>,
}
