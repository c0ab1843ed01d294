use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::key::BiomarkerKey;

/// Category key used for biomarkers that belong to no configured category.
pub const UNMAPPED_CATEGORY: &str = "unmapped";

/// A clinical category such as `lipid_and_cardiovascular`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub biomarkers: Vec<BiomarkerKey>,
}

impl Category {
    /// Category whose title is derived from its key (`bone_and_mineral` → `Bone And Mineral`).
    pub fn untitled(key: impl Into<String>, biomarkers: Vec<BiomarkerKey>) -> Self {
        let key = key.into();
        Self {
            title: title_from_key(&key),
            key,
            biomarkers,
        }
    }
}

/// Ordered clinical categories with a reverse biomarker lookup.
///
/// The order of `categories` is the canonical presentation order. A
/// biomarker listed under several categories maps to the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIndex {
    categories: Vec<Category>,
    by_biomarker: BTreeMap<BiomarkerKey, usize>,
}

impl CategoryIndex {
    pub fn new(categories: Vec<Category>) -> Self {
        let mut by_biomarker = BTreeMap::new();
        for (index, category) in categories.iter().enumerate() {
            for biomarker in &category.biomarkers {
                by_biomarker.entry(biomarker.clone()).or_insert(index);
            }
        }
        Self {
            categories,
            by_biomarker,
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Category by its key.
    pub fn get(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    /// Category a biomarker belongs to.
    pub fn category_of(&self, biomarker: &str) -> Option<&Category> {
        self.by_biomarker
            .get(biomarker)
            .and_then(|index| self.categories.get(*index))
    }

    pub fn biomarker_count(&self) -> usize {
        self.by_biomarker.len()
    }
}

/// Title-case a snake_case key.
pub fn title_from_key(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
