//! Comparison settings files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use labband_compare::CompareOptions;
use labband_model::BiomarkerKey;

/// Load [`CompareOptions`] from a `.json` file, or TOML for any other extension.
pub fn load_compare_settings(path: &Path) -> Result<CompareOptions> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read settings file {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&text).with_context(|| format!("parse JSON {}", path.display()))
    } else {
        toml::from_str(&text).with_context(|| format!("parse TOML {}", path.display()))
    }
}

/// Rewrite every biomarker key in `options` through `canonical`.
pub fn canonicalize_keys<F>(options: &mut CompareOptions, canonical: F)
where
    F: Fn(&str) -> BiomarkerKey,
{
    options.weights = std::mem::take(&mut options.weights)
        .into_iter()
        .map(|(key, weight)| (canonical(key.as_str()), weight))
        .collect();
    for key in options
        .risk_markers_positive
        .iter_mut()
        .chain(options.risk_markers_caution.iter_mut())
    {
        *key = canonical(key.as_str());
    }
}
