use std::fs;
use std::path::{Path, PathBuf};

use labband_cli::logging::{REDACTED_VALUE, default_directives, redact_value};
use labband_cli::settings::{canonicalize_keys, load_compare_settings};
use labband_model::BiomarkerKey;
use tracing::level_filters::LevelFilter;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{prefix}_{stamp}_{}", std::process::id()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write settings");
    path
}

#[test]
fn toml_settings_fill_defaults() {
    let dir = unique_temp_dir("labband_cli_toml");
    let path = write(
        &dir,
        "compare.toml",
        r#"
risk_markers_caution = ["HDL-C"]

[weights]
ldl_cholesterol = 2.0
"#,
    );
    let mut options = load_compare_settings(&path).expect("load toml settings");
    assert!(options.consider_only_old_present);
    assert!(options.risk_markers_positive.is_empty());
    assert_eq!(
        options.weights.get("ldl_cholesterol").copied(),
        Some(2.0)
    );

    canonicalize_keys(&mut options, |name| {
        BiomarkerKey::new(if name == "HDL-C" { "hdl_cholesterol" } else { name })
    });
    assert_eq!(
        options.risk_markers_caution,
        vec![BiomarkerKey::new("hdl_cholesterol")]
    );
}

#[test]
fn json_settings_by_extension() {
    let dir = unique_temp_dir("labband_cli_json");
    let path = write(
        &dir,
        "compare.JSON",
        r#"{"consider_only_old_present": false, "sex": "F", "risk_markers_positive": ["ferritin"]}"#,
    );
    let options = load_compare_settings(&path).expect("load json settings");
    assert!(!options.consider_only_old_present);
    assert_eq!(options.risk_markers_positive, vec![BiomarkerKey::new("ferritin")]);
}

#[test]
fn malformed_settings_name_the_file() {
    let dir = unique_temp_dir("labband_cli_bad");
    let path = write(&dir, "compare.toml", "weights = 3");
    let err = load_compare_settings(&path).expect_err("weights must be a table");
    assert!(format!("{err:#}").contains("compare.toml"));
}

#[test]
fn values_are_redacted_by_default() {
    assert_eq!(redact_value("5.6"), REDACTED_VALUE);
}

#[test]
fn directives_cover_every_crate() {
    insta::assert_snapshot!(default_directives(LevelFilter::DEBUG), @"warn,labband=debug,labband_classify=debug,labband_compare=debug,labband_ingest=debug,labband_model=debug,labband_normalization=debug,labband_standards=debug");
}
