use std::fs;
use std::path::{Path, PathBuf};

use labband_model::BandSpec;
use labband_standards::hash::sha256_hex;
use labband_standards::{ReferenceRegistry, StandardsError};

fn repo_reference_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../reference")
}

fn unique_temp_dir(name: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "labband-{}-{}-{}",
        name,
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock before epoch")
            .as_nanos()
    ));
    dir
}

fn write(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write file");
}

const RANGES: &[u8] = br#"{
  "fasting_glucose": {
    "unit": "mmol/L",
    "optimal": {"min": 4.2, "max": 5.0},
    "average": {"min": 5.0, "max": 5.5, "inclusive_min": false},
    "poor": [{"min": 5.6}, {"max": 3.5}]
  },
  "ferritin": {
    "unit": "ng/mL",
    "M": {"optimal": {"min": 50, "max": 150}},
    "F": {"optimal": {"min": 30, "max": 100}}
  }
}"#;

const RATIOS: &[u8] = br#"{"ldl_hdl_ratio": {"optimal": {"max": 2.5}, "poor": {"min": 3.5}}}"#;

const UNITS: &[u8] = br#"[aliases]
"mu/l" = "miu/l"

[display]
"mmol/l" = "mmol/L"
"#;

const NAMES: &[u8] = br#"[aliases]
"glucose fasting" = "fasting_glucose"
"#;

const SECTIONS: &[u8] = br#"[[category]]
key = "metabolic"
biomarkers = ["fasting_glucose"]

[[category]]
key = "iron"
title = "Iron Studies"
biomarkers = ["ferritin"]
"#;

/// Writes a complete minimal reference directory with a valid manifest.
fn write_reference(dir: &Path) {
    let files: [(&str, &str, &str, &[u8]); 5] = [
        ("names.toml", "toml", "names", NAMES),
        ("ranges.json", "json", "ranges", RANGES),
        ("ratio_overrides.json", "json", "ratio_overrides", RATIOS),
        ("sections.toml", "toml", "sections", SECTIONS),
        ("units.toml", "toml", "units", UNITS),
    ];
    let mut manifest = String::from(
        "[manifest]\nschema = \"labband.reference-manifest\"\nschema_version = 1\n\n\
         [pins]\nranges = \"test\"\nunits = \"test\"\nsections = \"test\"\n",
    );
    for (path, kind, role, contents) in files {
        write(&dir.join(path), contents);
        manifest.push_str(&format!(
            "\n[[files]]\npath = \"{path}\"\nsha256 = \"{}\"\nkind = \"{kind}\"\nrole = \"{role}\"\n",
            sha256_hex(contents)
        ));
    }
    write(&dir.join("manifest.toml"), manifest.as_bytes());
}

#[test]
fn repository_reference_data_verifies() {
    let (registry, summary) =
        ReferenceRegistry::verify_and_load(&repo_reference_dir()).expect("verify reference/");

    assert_eq!(summary.file_count, 5);
    assert_eq!(summary.biomarker_count, registry.ranges.len());
    assert!(summary.biomarker_count >= 100);
    assert_eq!(summary.shapes.get("age_branched"), Some(&1));
    assert!(summary.category_count > 0);
    assert_eq!(summary.categorized_biomarker_count, summary.biomarker_count);

    assert!(matches!(
        registry.ranges.get("psa_prostate_specific_antigen"),
        Some(BandSpec::AgeBranched { .. })
    ));
    assert_eq!(
        registry.names.canonical_key("HDL-C").as_str(),
        "hdl_cholesterol"
    );
    assert_eq!(registry.units.canonicalize("mU/L"), "miu/l");
}

#[test]
fn minimal_reference_summary_snapshot() {
    let dir = unique_temp_dir("minimal");
    write_reference(&dir);

    let (registry, summary) = ReferenceRegistry::verify_and_load(&dir).expect("verify");
    assert_eq!(
        registry
            .categories
            .category_of("ferritin")
            .map(|c| c.title.as_str()),
        Some("Iron Studies")
    );

    let mut summary = summary;
    summary.reference_dir = PathBuf::from("<tmp>");
    insta::assert_json_snapshot!(summary, @r#"
    {
      "reference_dir": "<tmp>",
      "manifest_pins": {
        "ranges": "test",
        "units": "test",
        "sections": "test"
      },
      "file_count": 5,
      "biomarker_count": 2,
      "shapes": {
        "numeric": 1,
        "sex_branched": 1
      },
      "ratio_override_count": 1,
      "category_count": 2,
      "categorized_biomarker_count": 2,
      "name_alias_count": 1,
      "unit_alias_count": 1,
      "conversion_count": 0,
      "analyte_override_count": 0
    }
    "#);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn tampered_file_fails_hash_check() {
    let dir = unique_temp_dir("tampered");
    write_reference(&dir);
    write(&dir.join("ratio_overrides.json"), b"{}");

    let err = ReferenceRegistry::verify_and_load(&dir).expect_err("hash mismatch");
    assert!(matches!(err, StandardsError::Sha256Mismatch { .. }));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn stray_file_is_rejected() {
    let dir = unique_temp_dir("stray");
    write_reference(&dir);
    write(&dir.join("extra/notes.txt"), b"not pinned");

    let err = ReferenceRegistry::verify_and_load(&dir).expect_err("unexpected file");
    assert!(matches!(err, StandardsError::UnexpectedFile { .. }));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn manifest_without_sections_role_is_rejected() {
    let dir = unique_temp_dir("missing-role");
    write_reference(&dir);
    let manifest = fs::read_to_string(dir.join("manifest.toml")).expect("read manifest");
    let trimmed = manifest.replace("role = \"sections\"", "role = \"other_sections\"");
    write(&dir.join("manifest.toml"), trimmed.as_bytes());

    let err = ReferenceRegistry::verify_and_load(&dir).expect_err("missing role");
    match err {
        StandardsError::MissingRole { role } => assert_eq!(role, "sections"),
        other => panic!("unexpected error: {other}"),
    }

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn declared_kind_must_match_extension() {
    let dir = unique_temp_dir("kind-mismatch");
    write_reference(&dir);
    let manifest = fs::read_to_string(dir.join("manifest.toml")).expect("read manifest");
    let mislabelled = manifest.replace(
        "kind = \"json\"\nrole = \"ranges\"",
        "kind = \"toml\"\nrole = \"ranges\"",
    );
    assert_ne!(mislabelled, manifest);
    write(&dir.join("manifest.toml"), mislabelled.as_bytes());

    let err = ReferenceRegistry::verify_and_load(&dir).expect_err("kind mismatch");
    match err {
        StandardsError::InvalidManifest { message } => {
            assert_eq!(message, "kind 'toml' does not match ranges.json");
        }
        other => panic!("unexpected error: {other}"),
    }

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn parent_traversal_path_is_rejected() {
    let dir = unique_temp_dir("traversal");
    write_reference(&dir);
    let manifest = fs::read_to_string(dir.join("manifest.toml")).expect("read manifest");
    let escaped = manifest.replace("path = \"names.toml\"", "path = \"../names.toml\"");
    write(&dir.join("manifest.toml"), escaped.as_bytes());

    let err = ReferenceRegistry::verify_and_load(&dir).expect_err("traversal");
    assert!(matches!(err, StandardsError::InvalidPath { .. }));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn section_member_without_range_is_rejected() {
    let dir = unique_temp_dir("orphan-member");
    write_reference(&dir);
    let sections = br#"[[category]]
key = "metabolic"
biomarkers = ["fasting_glucose", "hba1c"]
"#;
    write(&dir.join("sections.toml"), sections);
    let manifest = fs::read_to_string(dir.join("manifest.toml")).expect("read manifest");
    let repinned = manifest.replace(&sha256_hex(SECTIONS), &sha256_hex(sections));
    write(&dir.join("manifest.toml"), repinned.as_bytes());

    let err = ReferenceRegistry::verify_and_load(&dir).expect_err("orphan member");
    assert!(matches!(err, StandardsError::InvalidSections { .. }));

    fs::remove_dir_all(&dir).ok();
}
