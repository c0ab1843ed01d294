#![deny(unsafe_code)]

use std::collections::BTreeSet;
use std::path::Path;

use labband_model::{BiomarkerKey, Category, CategoryIndex, UNMAPPED_CATEGORY};
use serde::Deserialize;

use crate::error::StandardsError;

#[derive(Debug, Clone, Deserialize)]
struct SectionsFile {
    #[serde(default)]
    category: Vec<SectionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct SectionEntry {
    key: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    biomarkers: Vec<String>,
}

/// Parse `sections.toml` into an ordered [`CategoryIndex`].
///
/// Category keys must be unique and a biomarker may belong to only one
/// category. A missing title is derived from the key.
pub fn parse_sections_toml(path: &Path, contents: &str) -> Result<CategoryIndex, StandardsError> {
    let file: SectionsFile =
        toml::from_str(contents).map_err(|e| StandardsError::toml(path, e))?;
    let invalid = |message: String| StandardsError::InvalidSections {
        path: path.to_path_buf(),
        message,
    };

    if file.category.is_empty() {
        return Err(invalid("no categories declared".to_string()));
    }

    let mut keys: BTreeSet<&str> = BTreeSet::new();
    let mut members: BTreeSet<&str> = BTreeSet::new();
    for entry in &file.category {
        let key = entry.key.trim();
        if key.is_empty() {
            return Err(invalid("category key must not be empty".to_string()));
        }
        if key == UNMAPPED_CATEGORY {
            return Err(invalid(format!("category key '{UNMAPPED_CATEGORY}' is reserved")));
        }
        if !keys.insert(key) {
            return Err(invalid(format!("duplicate category key: {key}")));
        }
        for biomarker in &entry.biomarkers {
            let biomarker = biomarker.trim();
            if biomarker.is_empty() {
                return Err(invalid(format!("category {key} lists an empty biomarker")));
            }
            if !members.insert(biomarker) {
                return Err(invalid(format!(
                    "biomarker {biomarker} listed in more than one category"
                )));
            }
        }
    }

    let categories = file
        .category
        .iter()
        .map(|entry| {
            let biomarkers = entry
                .biomarkers
                .iter()
                .map(|b| BiomarkerKey::new(b.trim()))
                .collect();
            match &entry.title {
                Some(title) => Category {
                    key: entry.key.trim().to_string(),
                    title: title.clone(),
                    biomarkers,
                },
                None => Category::untitled(entry.key.trim(), biomarkers),
            }
        })
        .collect();
    Ok(CategoryIndex::new(categories))
}
