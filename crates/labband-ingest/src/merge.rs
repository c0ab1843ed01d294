//! Merge of the documents of one upload into a single report.

use labband_model::RawResult;
use serde_json::{Map, Value};
use tracing::{debug, info_span};

use crate::document::{ExtractedDocument, REPORT_DATE_FIELD, flatten_fields, is_empty_value};

/// Combined fields of several documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedUpload {
    pub fields: Map<String, Value>,
    /// Report date of the latest document, if it carries one.
    pub report_date: Option<String>,
    pub document_count: usize,
}

impl MergedUpload {
    pub fn raw_results(&self) -> Vec<RawResult> {
        flatten_fields(&self.fields)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Merge documents ordered by their report date text.
///
/// Later documents overwrite earlier ones field by field, but only with
/// non-empty values. Documents with equal or missing dates keep their
/// given order, missing dates sorting first.
pub fn merge_documents(mut documents: Vec<ExtractedDocument>) -> MergedUpload {
    let span = info_span!("merge_documents", documents = documents.len());
    let _guard = span.enter();

    documents.sort_by(|a, b| {
        a.report_date()
            .unwrap_or_default()
            .cmp(&b.report_date().unwrap_or_default())
    });

    let mut fields = Map::new();
    for document in &documents {
        for (name, value) in &document.fields {
            if name == REPORT_DATE_FIELD || is_empty_value(value) {
                continue;
            }
            if fields.insert(name.clone(), value.clone()).is_some() {
                debug!(field = %name, "field overwritten by later document");
            }
        }
    }

    MergedUpload {
        fields,
        report_date: documents
            .last()
            .and_then(ExtractedDocument::report_date)
            .map(str::to_string),
        document_count: documents.len(),
    }
}
