use std::path::PathBuf;
use std::sync::LazyLock;

use labband_classify::{
    ClassificationContext, SectionOptions, classify_entry, classify_report, group_by_section,
};
use labband_model::{
    Band, BiomarkerKey, ClassificationOutcome, ClassifiedReport, InvalidReason, RawResult,
    RecordValue, Sex,
};
use labband_standards::ReferenceRegistry;
use proptest::prelude::*;

static REGISTRY: LazyLock<ReferenceRegistry> = LazyLock::new(|| {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../reference");
    ReferenceRegistry::verify_and_load(&dir)
        .expect("load reference data")
        .0
});

fn ctx() -> ClassificationContext<'static> {
    ClassificationContext::from_registry(&REGISTRY)
}

fn classify_one(
    name: &str,
    result: &str,
    units: &str,
    sex: Option<Sex>,
    age: Option<u32>,
) -> ClassificationOutcome {
    let key = REGISTRY.names.canonical_key(name);
    let raw = RawResult::new(name, result, units);
    classify_entry(&ctx(), &key, &raw, sex, age)
}

fn band_of(outcome: &ClassificationOutcome) -> Option<Band> {
    match outcome {
        ClassificationOutcome::Classified { band, .. } => Some(*band),
        ClassificationOutcome::Invalid(_) => None,
    }
}

#[test]
fn fasting_glucose_examples() {
    let poor = classify_one("Fasting Glucose", "6.2", "mmol/L", None, None);
    assert_eq!(band_of(&poor), Some(Band::Poor));

    let average = classify_one("Fasting Glucose", "5.3", "mmol/L", None, None);
    assert_eq!(band_of(&average), Some(Band::Average));

    let edge = classify_one("Fasting Glucose", "5.0", "mmol / l", None, None);
    assert_eq!(band_of(&edge), Some(Band::Optimal));
}

#[test]
fn analyte_override_converts_c_peptide() {
    let outcome = classify_one("C-Peptide", "2.0", "ng/mL", None, None);
    let ClassificationOutcome::Classified { band, record } = outcome else {
        panic!("expected c-peptide to classify");
    };
    assert_eq!(band, Band::Optimal);
    assert_eq!(record.value, RecordValue::Number(0.662));
    assert_eq!(record.unit, "nmol/L");
    assert_eq!(record.detail.as_deref(), Some("converted:ng/ml->nmol/l"));
}

#[test]
fn sex_branches_select_different_bands() {
    let male = classify_one("Uric Acid", "300", "umol/L", Some(Sex::Male), None);
    assert_eq!(band_of(&male), Some(Band::Optimal));

    let female = classify_one("Uric Acid", "300", "umol/L", Some(Sex::Female), None);
    assert_eq!(band_of(&female), Some(Band::Average));

    let ferritin = classify_one("Ferritin", "80", "ng/mL", Some(Sex::Female), None);
    let ClassificationOutcome::Classified { record, .. } = ferritin else {
        panic!("expected ferritin to classify");
    };
    assert_eq!(record.unit, "µg/L");
    assert_eq!(record.detail.as_deref(), Some("converted:ng/ml->µg/l"));
}

#[test]
fn psa_age_branches_and_fallback() {
    let psa = |age| {
        classify_one(
            "PSA (Prostate Specific Antigen)",
            "1.5",
            "ug/L",
            Some(Sex::Male),
            age,
        )
    };
    assert_eq!(band_of(&psa(Some(65))), Some(Band::Optimal));

    // The <60 branch declares only an optimal band.
    assert_eq!(
        psa(Some(45)).invalid_reason(),
        Some(InvalidReason::NoBandMatch)
    );

    assert_eq!(band_of(&psa(None)), Some(Band::Average));
}

#[test]
fn ratio_override_and_categorical_share_a_key() {
    let numeric = classify_one("HDL Large / LDL Medium", "1.8", "%", None, None);
    let ClassificationOutcome::Classified { band, record } = numeric else {
        panic!("expected ratio classification");
    };
    assert_eq!(band, Band::Average);
    assert_eq!(record.unit, "ratio");

    let textual = classify_one(
        "HDL Large / LDL Medium",
        "Low HDL large and high LDL medium",
        "",
        None,
        None,
    );
    assert_eq!(band_of(&textual), Some(Band::Poor));
}

#[test]
fn genotype_labels_match_loosely() {
    assert_eq!(
        band_of(&classify_one("APOE Genotype", "e3/e3", "", None, None)),
        Some(Band::Optimal)
    );
    assert_eq!(
        band_of(&classify_one("APOE Genotype", "E4/E4", "", None, None)),
        Some(Band::Poor)
    );
}

#[test]
fn report_buckets_and_sections() {
    let raw = vec![
        RawResult::new("Fasting Glucose", "6.2", "mmol/L"),
        RawResult::new("HDL-C", "1.6", "mmol/L"),
        RawResult::new("Total Cholesterol", "5.2", "mmol/L"),
        RawResult::new("Mystery Marker", "12", "U/L"),
    ];
    let report = classify_report(&ctx(), &raw, Some(Sex::Male), Some(52)).expect("classifiable");

    assert!(report.critical.contains_key("fasting_glucose"));
    assert!(report.good.contains_key("hdl_cholesterol"));
    assert!(report.normal.contains_key("total_cholesterol"));
    assert_eq!(
        report.invalid.get("mystery_marker").and_then(|r| r.reason.known()),
        Some(InvalidReason::UnknownMarker)
    );
    assert_eq!(report.counts.total(), raw.len());

    let sections = group_by_section(&REGISTRY.categories, &report, SectionOptions::default());
    assert_eq!(sections.len(), REGISTRY.categories.len());
    let placed: usize = sections
        .iter()
        .map(|s| s.optimal.len() + s.normal.len() + s.poor.len())
        .sum();
    assert_eq!(placed, 3);
}

#[test]
fn stored_report_round_trips_through_json() {
    let raw = vec![RawResult::new("Fasting Glucose", "4.6", "mmol/L")];
    let report = classify_report(&ctx(), &raw, None, None).expect("classifiable");
    let json = serde_json::to_string(&report).expect("serialize");
    let back: ClassifiedReport = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, report);
    assert_eq!(
        back.record_of("fasting_glucose").map(|r| r.value.clone()),
        Some(RecordValue::Number(4.6))
    );
    assert_eq!(back.bucket_of("fasting_glucose").map(|b| b.as_str()), Some("good"));
    assert!(back.invalid.is_empty());
    assert!(!back.classified_keys().any(|k| *k == BiomarkerKey::new("hba1c")));
}

fn raw_entry() -> impl Strategy<Value = RawResult> {
    let names = prop::sample::select(vec![
        "Fasting Glucose",
        "glucose, fasting",
        "HDL-C",
        "Ferritin",
        "C-Peptide",
        "Uric Acid",
        "APOE Genotype",
        "Unknown Thing",
    ]);
    let results = prop_oneof![
        (0.0f64..400.0).prop_map(|v| format!("{v:.2}")),
        Just("pending".to_string()),
        Just("E3/E3".to_string()),
    ];
    let units = prop::sample::select(vec!["mmol/L", "mg/dL", "ng/mL", "umol/L", "", "U/L"]);
    (names, results, units).prop_map(|(n, r, u)| RawResult::new(n, r, u))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn classification_is_idempotent(
        raw in prop::collection::vec(raw_entry(), 0..12),
        male in any::<bool>(),
        age in prop::option::of(18u32..90),
    ) {
        let sex = Some(if male { Sex::Male } else { Sex::Female });
        let first = classify_report(&ctx(), &raw, sex, age);
        let second = classify_report(&ctx(), &raw, sex, age);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn every_entry_is_counted_once(raw in prop::collection::vec(raw_entry(), 1..12)) {
        if let Some(report) = classify_report(&ctx(), &raw, None, None) {
            prop_assert_eq!(report.counts.total() + report.counts.duplicates, raw.len());
            let breakdown: usize = report.counts.invalid_breakdown.values().sum();
            prop_assert_eq!(breakdown, report.counts.invalid);
            prop_assert_eq!(report.invalid.len(), report.counts.invalid);
        }
    }
}
