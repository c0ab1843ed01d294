#![deny(unsafe_code)]

//! Parsing of the reference-range table into strict [`BandSpec`] values.
//!
//! The table maps a biomarker key to an object in one of these shapes:
//!
//! - flat: `{unit?, optimal?, average?, poor?}` where each band is a range
//!   object, a list of range objects, a label, or a list of labels
//! - bare interval: `{unit?, min, max}`, read as a single optimal band
//! - sex-branched: `{unit?, "M": {...}, "F": {...}}`
//! - age-branched: `{unit?, "<60": {...}, "≥60": {...}, optimal?, ...}`
//!
//! Band lists declared next to sex or age branches become the fallback
//! used when no branch is selected.

use std::collections::BTreeMap;
use std::path::Path;

use labband_model::{
    AgeBand, AgeBranch, BandSpec, Bands, BiomarkerKey, CategoricalBands, NumericBands,
    RangePredicate,
};
use serde_json::{Map, Value};

use crate::error::StandardsError;

const BAND_KEYS: [&str; 3] = ["optimal", "average", "poor"];

/// Where a spec object sits, which limits the branches it may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Root,
    SexBranch,
    AgeBranch,
}

/// Parse the whole range table.
pub fn parse_ranges_json(
    path: &Path,
    bytes: &[u8],
) -> Result<BTreeMap<BiomarkerKey, BandSpec>, StandardsError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| StandardsError::json(path, e))?;
    let Value::Object(entries) = value else {
        return Err(invalid(path, "<root>", "range table must be a JSON object"));
    };
    let mut specs = BTreeMap::new();
    for (key, entry) in &entries {
        let spec = parse_band_spec(entry, Level::Root).map_err(|m| invalid(path, key, &m))?;
        specs.insert(BiomarkerKey::new(key.clone()), spec);
    }
    Ok(specs)
}

/// Parse ratio override bands: `{key: {unit?, optimal, average, poor}}`.
pub fn parse_ratio_overrides_json(
    path: &Path,
    bytes: &[u8],
) -> Result<BTreeMap<BiomarkerKey, NumericBands>, StandardsError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| StandardsError::json(path, e))?;
    let Value::Object(entries) = value else {
        return Err(invalid(path, "<root>", "ratio overrides must be a JSON object"));
    };
    let mut overrides = BTreeMap::new();
    for (key, entry) in &entries {
        let Value::Object(object) = entry else {
            return Err(invalid(path, key, "override must be an object"));
        };
        match parse_bands(object).map_err(|m| invalid(path, key, &m))? {
            Some(Bands::Numeric(bands)) => {
                overrides.insert(BiomarkerKey::new(key.clone()), bands);
            }
            Some(Bands::Categorical(_)) => {
                return Err(invalid(path, key, "ratio override bands must be numeric"));
            }
            None => return Err(invalid(path, key, "ratio override declares no bands")),
        }
    }
    Ok(overrides)
}

fn invalid(path: &Path, biomarker: &str, message: &str) -> StandardsError {
    StandardsError::InvalidRange {
        path: path.to_path_buf(),
        biomarker: biomarker.to_string(),
        message: message.to_string(),
    }
}

fn is_sex_key(key: &str) -> bool {
    key == "M" || key == "F"
}

fn is_bare_bound(key: &str) -> bool {
    matches!(
        key,
        "min" | "max" | "inclusive_min" | "inclusive_max" | "equal_to"
    )
}

fn parse_band_spec(value: &Value, level: Level) -> Result<BandSpec, String> {
    let Value::Object(object) = value else {
        return Err("specification must be an object".to_string());
    };

    let unit = match object.get("unit") {
        None | Some(Value::Null) => None,
        Some(Value::String(unit)) => Some(unit.clone()),
        Some(other) => return Err(format!("unit must be a string, got {other}")),
    };

    let mut sex_branches: Vec<(&str, &Value)> = Vec::new();
    let mut age_branches: Vec<(AgeBand, &Value)> = Vec::new();
    for (key, child) in object {
        if key == "unit" || BAND_KEYS.contains(&key.as_str()) || is_bare_bound(key) {
            continue;
        }
        if is_sex_key(key) {
            sex_branches.push((key.as_str(), child));
            continue;
        }
        match key.parse::<AgeBand>() {
            Ok(band) => age_branches.push((band, child)),
            Err(_) => return Err(format!("unrecognised key '{key}'")),
        }
    }

    let fallback = parse_bands(object)?;

    if !sex_branches.is_empty() {
        if level != Level::Root {
            return Err("sex branches are only allowed at the top level".to_string());
        }
        if !age_branches.is_empty() {
            return Err("sex and age branches cannot be mixed at one level".to_string());
        }
        let mut male = None;
        let mut female = None;
        for (key, child) in sex_branches {
            let spec = parse_band_spec(child, Level::SexBranch)
                .map_err(|m| format!("branch '{key}': {m}"))?;
            if key == "M" {
                male = Some(Box::new(spec));
            } else {
                female = Some(Box::new(spec));
            }
        }
        return Ok(BandSpec::SexBranched {
            unit,
            male,
            female,
            fallback,
        });
    }

    if !age_branches.is_empty() {
        if level == Level::AgeBranch {
            return Err("age branches cannot be nested".to_string());
        }
        let mut branches = Vec::with_capacity(age_branches.len());
        for (band, child) in age_branches {
            let spec = parse_band_spec(child, Level::AgeBranch)
                .map_err(|m| format!("branch '{band}': {m}"))?;
            branches.push(AgeBranch { band, spec });
        }
        return Ok(BandSpec::AgeBranched {
            unit,
            branches,
            fallback,
        });
    }

    match fallback {
        Some(bands) => Ok(BandSpec::Flat { unit, bands }),
        None => Err("specification declares no bands".to_string()),
    }
}

fn is_categorical_value(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Array(items) => items.iter().any(|item| !item.is_object()),
        _ => false,
    }
}

/// Band lists declared directly on `object`, or `None` when there are none.
fn parse_bands(object: &Map<String, Value>) -> Result<Option<Bands>, String> {
    let declared: Vec<(&str, &Value)> = BAND_KEYS
        .iter()
        .filter_map(|key| object.get(*key).map(|value| (*key, value)))
        .filter(|(_, value)| !value.is_null())
        .collect();

    if declared.iter().any(|(_, value)| is_categorical_value(value)) {
        let mut bands = CategoricalBands::default();
        for (key, value) in declared {
            let labels = parse_labels(value).map_err(|m| format!("band '{key}': {m}"))?;
            match key {
                "optimal" => bands.optimal = labels,
                "average" => bands.average = labels,
                _ => bands.poor = labels,
            }
        }
        return Ok(Some(Bands::Categorical(bands)));
    }

    let mut bands = NumericBands::default();
    for (key, value) in &declared {
        let predicates = parse_predicates(value).map_err(|m| format!("band '{key}': {m}"))?;
        match *key {
            "optimal" => bands.optimal = predicates,
            "average" => bands.average = predicates,
            _ => bands.poor = predicates,
        }
    }

    if !object.contains_key("optimal") {
        if let (Some(min), Some(max)) = (
            object.get("min").and_then(Value::as_f64),
            object.get("max").and_then(Value::as_f64),
        ) {
            bands.optimal = vec![RangePredicate::between(min, max)];
            return Ok(Some(Bands::Numeric(bands)));
        }
    }

    if declared.is_empty() {
        return Ok(None);
    }
    Ok(Some(Bands::Numeric(bands)))
}

fn parse_labels(value: &Value) -> Result<Vec<String>, String> {
    let items: &[Value] = match value {
        Value::Array(items) => items,
        single => std::slice::from_ref(single),
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(label) => Ok(label.clone()),
            Value::Number(number) => Ok(number.to_string()),
            other => Err(format!("expected a label, got {other}")),
        })
        .collect()
}

fn parse_predicates(value: &Value) -> Result<Vec<RangePredicate>, String> {
    let items: &[Value] = match value {
        Value::Array(items) => items,
        single => std::slice::from_ref(single),
    };
    items
        .iter()
        .map(|item| {
            if !item.is_object() {
                return Err(format!("expected a range object, got {item}"));
            }
            serde_json::from_value::<RangePredicate>(item.clone()).map_err(|e| e.to_string())
        })
        .collect()
}
