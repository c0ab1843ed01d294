//! Whole-report classification.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use labband_model::{
    BandSpec, Bands, BiomarkerKey, ClassificationCounts, ClassificationOutcome, ClassifiedReport,
    InvalidReason, InvalidRecord, NumericBands, RawResult, RecordValue, Sex, ValueRecord,
};
use labband_normalization::{NameAliases, UnitTable, VALUE_DECIMALS, parse_lenient_f64, round_to};
use labband_standards::ReferenceRegistry;
use regex::Regex;
use tracing::{debug, info, info_span, warn};

use crate::classifier::{classify_categorical, classify_numeric};
use crate::resolver::resolve;

/// Keys that name a ratio, index or score are never unit-converted.
static UNITLESS_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(ratio|index|score)\b").expect("Invalid unitless name regex"));

/// Unit shown for values classified through a ratio override.
const RATIO_UNIT: &str = "ratio";

/// Borrowed, read-only lookup tables used by the classifier.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationContext<'a> {
    pub ranges: &'a BTreeMap<BiomarkerKey, BandSpec>,
    pub ratio_overrides: &'a BTreeMap<BiomarkerKey, NumericBands>,
    pub units: &'a UnitTable,
    pub names: &'a NameAliases,
}

impl<'a> ClassificationContext<'a> {
    pub fn from_registry(registry: &'a ReferenceRegistry) -> Self {
        Self {
            ranges: &registry.ranges,
            ratio_overrides: &registry.ratio_overrides,
            units: &registry.units,
            names: &registry.names,
        }
    }
}

/// Classify every raw result and bucket the outcomes.
///
/// Entries whose names canonicalize to the same key are resolved
/// last-write-wins; overwritten entries are counted in
/// `counts.duplicates` and excluded from the other counts. Returns `None`
/// when no entry landed in a band bucket.
pub fn classify_report(
    ctx: &ClassificationContext<'_>,
    raw_results: &[RawResult],
    sex: Option<Sex>,
    age: Option<u32>,
) -> Option<ClassifiedReport> {
    let span = info_span!(
        "classify_report",
        entries = raw_results.len(),
        sex = sex.map(|s| s.as_str()),
        age
    );
    let _guard = span.enter();

    let mut outcomes: BTreeMap<BiomarkerKey, ClassificationOutcome> = BTreeMap::new();
    let mut duplicates = 0usize;
    for raw in raw_results {
        let key = ctx.names.canonical_key(&raw.biomarker_name);
        let outcome = classify_entry(ctx, &key, raw, sex, age);
        debug!(
            biomarker = %key,
            outcome = outcome_label(&outcome),
            "classified entry"
        );
        if outcomes.insert(key.clone(), outcome).is_some() {
            duplicates += 1;
            warn!(biomarker = %key, "duplicate biomarker entry; keeping the later one");
        }
    }

    let mut report = ClassifiedReport::default();
    report.counts.duplicates = duplicates;
    for (key, outcome) in outcomes {
        report.counts.record(&outcome);
        match outcome {
            ClassificationOutcome::Classified { band, record } => {
                report.bucket_mut(band.bucket()).insert(key, record);
            }
            ClassificationOutcome::Invalid(record) => {
                report.invalid.insert(key, record);
            }
        }
    }

    log_counts(&report.counts);
    if report.has_no_classified() {
        info!("no biomarker could be classified");
        return None;
    }
    Some(report)
}

fn log_counts(counts: &ClassificationCounts) {
    info!(
        optimal = counts.optimal,
        normal = counts.normal,
        poor = counts.poor,
        invalid = counts.invalid,
        duplicates = counts.duplicates,
        "classification complete"
    );
}

fn outcome_label(outcome: &ClassificationOutcome) -> &str {
    match outcome {
        ClassificationOutcome::Classified { band, .. } => band.as_str(),
        ClassificationOutcome::Invalid(record) => record.reason.as_str(),
    }
}

/// Classify one raw result already keyed by its canonical biomarker key.
pub fn classify_entry(
    ctx: &ClassificationContext<'_>,
    key: &BiomarkerKey,
    raw: &RawResult,
    sex: Option<Sex>,
    age: Option<u32>,
) -> ClassificationOutcome {
    let Some(spec) = ctx.ranges.get(key) else {
        return ClassificationOutcome::Invalid(InvalidRecord::bare(InvalidReason::UnknownMarker));
    };
    let resolved = resolve(spec, sex, age);
    let number = parse_lenient_f64(&raw.result);

    if let (Some(override_bands), Some(value)) = (ctx.ratio_overrides.get(key), number) {
        let bands = match &resolved.bands {
            Bands::Numeric(spec_bands) if override_bands.is_empty() => spec_bands,
            _ => override_bands,
        };
        return classify_ratio(ctx, raw, value, bands);
    }

    match &resolved.bands {
        Bands::Categorical(bands) => match classify_categorical(&raw.result, bands) {
            Some(band) => ClassificationOutcome::Classified {
                band,
                record: ValueRecord {
                    value: RecordValue::Text(raw.result.clone()),
                    unit: ctx.units.display(&raw.units),
                    expected_unit: ctx.units.display(&resolved.unit),
                    detail: None,
                },
            },
            None => invalid_raw(InvalidReason::UnclassifiedCategorical, raw, &resolved.unit),
        },
        Bands::Numeric(bands) => {
            let Some(value) = number else {
                return invalid_raw(InvalidReason::NonNumericValue, raw, &resolved.unit);
            };
            classify_measurement(ctx, key, raw, value, &resolved.unit, bands)
        }
    }
}

fn classify_ratio(
    ctx: &ClassificationContext<'_>,
    raw: &RawResult,
    value: f64,
    bands: &NumericBands,
) -> ClassificationOutcome {
    let rounded = round_to(value, VALUE_DECIMALS);
    match classify_numeric(value, bands) {
        Some(band) => ClassificationOutcome::Classified {
            band,
            record: ValueRecord {
                value: RecordValue::Number(rounded),
                unit: ctx.units.display(RATIO_UNIT),
                expected_unit: ctx.units.display(RATIO_UNIT),
                detail: None,
            },
        },
        None => ClassificationOutcome::Invalid(InvalidRecord {
            reason: InvalidReason::NoBandMatch.into(),
            value: Some(RecordValue::Number(rounded)),
            unit: Some(ctx.units.display(&raw.units)),
            expected_unit: Some(ctx.units.display(RATIO_UNIT)),
            detail: None,
        }),
    }
}

fn classify_measurement(
    ctx: &ClassificationContext<'_>,
    key: &BiomarkerKey,
    raw: &RawResult,
    value: f64,
    expected_unit: &str,
    bands: &NumericBands,
) -> ClassificationOutcome {
    let lab_unit = ctx.units.canonicalize(&raw.units);
    let exp_unit = ctx.units.canonicalize(expected_unit);

    let mut final_value = value;
    let mut final_unit = lab_unit.clone();
    let mut detail = None;

    if ctx.units.is_unitless(&exp_unit) || UNITLESS_NAME.is_match(key.as_str()) {
        if !exp_unit.is_empty() {
            final_unit = exp_unit;
        }
    } else if !exp_unit.is_empty() && lab_unit != exp_unit {
        match ctx.units.convert(value, &lab_unit, &exp_unit, key.as_str()) {
            Ok(converted) => {
                final_value = converted;
                detail = Some(format!("converted:{lab_unit}->{exp_unit}"));
                final_unit = exp_unit;
            }
            Err(err) => {
                return ClassificationOutcome::Invalid(InvalidRecord {
                    reason: InvalidReason::UnitMismatch.into(),
                    value: Some(RecordValue::Number(value)),
                    unit: Some(raw.units.clone()),
                    expected_unit: Some(expected_unit.to_string()),
                    detail: Some(err.to_string()),
                });
            }
        }
    }

    let shown_unit = if final_unit.is_empty() {
        ctx.units.display(&raw.units)
    } else {
        ctx.units.display(&final_unit)
    };
    let rounded = round_to(final_value, VALUE_DECIMALS);
    match classify_numeric(final_value, bands) {
        Some(band) => ClassificationOutcome::Classified {
            band,
            record: ValueRecord {
                value: RecordValue::Number(rounded),
                unit: shown_unit,
                expected_unit: ctx.units.display(expected_unit),
                detail,
            },
        },
        None => ClassificationOutcome::Invalid(InvalidRecord {
            reason: InvalidReason::NoBandMatch.into(),
            value: Some(RecordValue::Number(rounded)),
            unit: Some(shown_unit),
            expected_unit: Some(ctx.units.display(expected_unit)),
            detail,
        }),
    }
}

/// Invalid record echoing the raw inputs.
fn invalid_raw(reason: InvalidReason, raw: &RawResult, expected_unit: &str) -> ClassificationOutcome {
    ClassificationOutcome::Invalid(InvalidRecord {
        reason: reason.into(),
        value: Some(RecordValue::Text(raw.result.clone())),
        unit: Some(raw.units.clone()),
        expected_unit: Some(expected_unit.to_string()),
        detail: None,
    })
}
