//! Single-value band classification.

use labband_model::{Band, CategoricalBands, NumericBands};

/// First band, in priority order, with a predicate matching `value`.
///
/// Predicates within a band are OR-ed. Malformed predicates (`min > max`)
/// are skipped rather than failing the whole classification.
pub fn classify_numeric(value: f64, bands: &NumericBands) -> Option<Band> {
    if !value.is_finite() {
        return None;
    }
    Band::PRIORITY.into_iter().find(|band| {
        bands
            .get(*band)
            .iter()
            .filter(|predicate| !predicate.is_malformed())
            .any(|predicate| predicate.matches(value))
    })
}

/// First band, in priority order, with a label matching `raw`.
///
/// Matching is case-insensitive and tolerant: the value matches a label
/// when either contains the other. A blank value matches nothing and blank
/// labels are ignored.
pub fn classify_categorical(raw: &str, bands: &CategoricalBands) -> Option<Band> {
    let value = raw.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }
    Band::PRIORITY.into_iter().find(|band| {
        bands
            .get(*band)
            .iter()
            .any(|label| label_matches(&value, label))
    })
}

fn label_matches(value: &str, label: &str) -> bool {
    let label = label.trim().to_lowercase();
    if label.is_empty() {
        return false;
    }
    value == label || value.contains(&label) || label.contains(value)
}
