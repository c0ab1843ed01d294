use std::path::PathBuf;

use labband_normalization::{UnitConfig, UnitTable, normalize_spelling};
use proptest::prelude::*;

fn reference_units() -> UnitTable {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../reference/units.toml");
    let contents = std::fs::read_to_string(&path).expect("read units.toml");
    let config: UnitConfig = toml::from_str(&contents).expect("parse units.toml");
    UnitTable::from_config(&config).expect("build unit table")
}

#[test]
fn reference_overrides_round_trip() {
    let units = reference_units();
    let analytes: Vec<String> = units.override_analytes().map(str::to_string).collect();
    assert!(analytes.iter().any(|a| a == "c_peptide"));
    for analyte in &analytes {
        for (from, to) in units.override_pairs(analyte) {
            for value in [0.001, 1.0, 7.5, 1234.5] {
                let there = units
                    .convert(value, &from, &to, analyte)
                    .expect("forward conversion");
                let back = units
                    .convert(there, &to, &from, analyte)
                    .expect("reverse conversion");
                assert!(
                    (back - value).abs() <= 1e-9 * value.abs().max(1.0),
                    "{analyte}: {from}->{to} round trip {value} -> {back}"
                );
            }
        }
    }
}

#[test]
fn reference_display_covers_range_units() {
    let units = reference_units();
    assert_eq!(units.display("mmol/L"), "mmol/L");
    assert_eq!(units.display("umol/L"), "µmol/L");
    assert_eq!(units.display("x10^9/L"), "x10^9/L");
    assert_eq!(units.display("ml/min/1.73m2"), "mL/min/1.73m²");
    assert_eq!(units.display("UG/L"), "µg/L");
}

#[test]
fn igf_factor_matches_molecular_weight() {
    let units = reference_units();
    let nmol = units
        .convert(7649.0, "µg/L", "nmol/L", "igf_1")
        .expect("igf-1 conversion");
    assert!((nmol - 1000.0).abs() < 1e-6);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn canonicalize_is_idempotent(raw in "[a-zA-Z0-9/µμ^×.*² ⁹-]{0,12}") {
        let units = reference_units();
        let once = units.canonicalize(&raw);
        prop_assert_eq!(units.canonicalize(&once), once.clone());
    }

    #[test]
    fn spelling_ignores_whitespace_and_case(raw in "[a-z/]{1,8}") {
        let spaced: String = raw.chars().flat_map(|c| [c.to_ascii_uppercase(), ' ']).collect();
        prop_assert_eq!(normalize_spelling(&spaced), normalize_spelling(&raw));
    }

    #[test]
    fn generic_conversions_round_trip(value in 0.001f64..100_000.0) {
        let units = reference_units();
        let grams = units.convert(value, "mg/dL", "g/L", "any").expect("forward");
        let back = units.convert(grams, "g/L", "mg/dL", "any").expect("reverse");
        prop_assert!((back - value).abs() <= 1e-9 * value);
    }
}
