//! Extracted lab documents and their flattening into raw results.

use std::fs;
use std::path::Path;

use labband_model::RawResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::IngestError;

/// Field holding the document's report date.
pub const REPORT_DATE_FIELD: &str = "report date";

/// Header fields of an extracted document that are not lab results.
pub const METADATA_FIELDS: [&str; 10] = [
    "patient name",
    "patient id",
    "DOB",
    "age",
    "collection date",
    REPORT_DATE_FIELD,
    "laboratory",
    "gender",
    "referring doctor",
    "fasting status",
];

/// Field map produced by the extraction service for one uploaded file.
///
/// Biomarker fields hold either a list of `{Result|Results, Units}` rows or a
/// single such row; header fields hold plain strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedDocument {
    pub fields: Map<String, Value>,
}

impl ExtractedDocument {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Parse a document from JSON text. `path` is only used in errors.
    pub fn from_json_str(text: &str, path: &Path) -> Result<Self, IngestError> {
        let value: Value =
            serde_json::from_str(text).map_err(|source| IngestError::json(path, source))?;
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(IngestError::NotAnObject {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn load(path: &Path) -> Result<Self, IngestError> {
        let text = fs::read_to_string(path).map_err(|source| IngestError::io(path, source))?;
        Self::from_json_str(&text, path)
    }

    pub fn report_date(&self) -> Option<&str> {
        self.fields
            .get(REPORT_DATE_FIELD)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|date| !date.is_empty())
    }

    /// Lab results of the document, metadata and empty rows dropped.
    pub fn raw_results(&self) -> Vec<RawResult> {
        flatten_fields(&self.fields)
    }
}

/// Flatten an extracted field map into raw results.
///
/// List-valued fields use their first row. A row without a non-empty
/// `Result` (or `Results`) is skipped; missing units become empty.
pub fn flatten_fields(fields: &Map<String, Value>) -> Vec<RawResult> {
    let mut results = Vec::new();
    for (name, value) in fields {
        if METADATA_FIELDS.contains(&name.as_str()) || is_empty_value(value) {
            continue;
        }
        let row = match value {
            Value::Array(rows) => match rows.first() {
                Some(Value::Object(row)) => row,
                _ => continue,
            },
            Value::Object(row) => row,
            _ => continue,
        };
        let Some(result) = row_text(row.get("Result")).or_else(|| row_text(row.get("Results")))
        else {
            debug!(field = %name, "skipping row without a result");
            continue;
        };
        let units = row
            .get("Units")
            .and_then(Value::as_str)
            .unwrap_or_default();
        results.push(RawResult::new(name.as_str(), result, units));
    }
    results
}

/// Null, empty strings and empty containers carry no information.
pub(crate) fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn row_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
