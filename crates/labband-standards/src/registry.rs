#![deny(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use labband_model::{BandSpec, BiomarkerKey, CategoryIndex, NumericBands};
use labband_normalization::{NameAliases, NameConfig, UnitConfig, UnitTable};

use crate::error::StandardsError;
use crate::hash::{is_sha256_hex, read_with_sha256};
use crate::manifest::{Manifest, ManifestFile, Pins, REQUIRED_ROLES};
use crate::ranges::{parse_ranges_json, parse_ratio_overrides_json};
use crate::sections::parse_sections_toml;

#[derive(Debug, Clone, serde::Serialize)]
pub struct ReferenceSummary {
    pub reference_dir: PathBuf,
    pub manifest_pins: Pins,
    pub file_count: usize,
    pub biomarker_count: usize,
    /// Biomarker count per top-level spec shape.
    pub shapes: BTreeMap<String, usize>,
    pub ratio_override_count: usize,
    pub category_count: usize,
    pub categorized_biomarker_count: usize,
    pub name_alias_count: usize,
    pub unit_alias_count: usize,
    pub conversion_count: usize,
    pub analyte_override_count: usize,
}

/// Verified, parsed reference data. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct ReferenceRegistry {
    pub manifest: Manifest,
    pub files: Vec<ManifestFile>,
    pub ranges: BTreeMap<BiomarkerKey, BandSpec>,
    pub ratio_overrides: BTreeMap<BiomarkerKey, NumericBands>,
    pub units: UnitTable,
    pub names: NameAliases,
    pub categories: CategoryIndex,
}

impl ReferenceRegistry {
    /// Verify every file against the manifest pins, then parse the tables.
    pub fn verify_and_load(
        reference_dir: &Path,
    ) -> Result<(Self, ReferenceSummary), StandardsError> {
        let manifest = load_manifest(&reference_dir.join("manifest.toml"))?;

        validate_manifest(&manifest, reference_dir)?;

        let mut files = manifest.files.clone();
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let mut contents: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        for file in &files {
            let bytes = verify_file(reference_dir, file)?;
            contents.insert(file.role.clone(), bytes);
        }

        let (path, bytes) = role_contents(reference_dir, &manifest, &contents, "ranges")?;
        let ranges = parse_ranges_json(&path, bytes)?;

        let (path, bytes) = role_contents(reference_dir, &manifest, &contents, "ratio_overrides")?;
        let ratio_overrides = parse_ratio_overrides_json(&path, bytes)?;

        let (path, bytes) = role_contents(reference_dir, &manifest, &contents, "units")?;
        let unit_config: UnitConfig =
            toml::from_str(&utf8(&path, bytes)?).map_err(|e| StandardsError::toml(&path, e))?;
        let units = UnitTable::from_config(&unit_config)
            .map_err(|source| StandardsError::UnitTable { path, source })?;

        let (path, bytes) = role_contents(reference_dir, &manifest, &contents, "names")?;
        let name_config: NameConfig =
            toml::from_str(&utf8(&path, bytes)?).map_err(|e| StandardsError::toml(&path, e))?;
        let names = NameAliases::from_config(&name_config);

        let (path, bytes) = role_contents(reference_dir, &manifest, &contents, "sections")?;
        let categories = parse_sections_toml(&path, &utf8(&path, bytes)?)?;
        check_section_members(&path, &categories, &ranges)?;

        let mut shapes: BTreeMap<String, usize> = BTreeMap::new();
        for spec in ranges.values() {
            *shapes.entry(spec.shape().to_string()).or_insert(0) += 1;
        }

        let summary = ReferenceSummary {
            reference_dir: reference_dir.to_path_buf(),
            manifest_pins: manifest.pins.clone(),
            file_count: files.len(),
            biomarker_count: ranges.len(),
            shapes,
            ratio_override_count: ratio_overrides.len(),
            category_count: categories.len(),
            categorized_biomarker_count: categories.biomarker_count(),
            name_alias_count: names.len(),
            unit_alias_count: units.alias_count(),
            conversion_count: units.conversion_count(),
            analyte_override_count: units.override_count(),
        };

        Ok((
            Self {
                manifest,
                files,
                ranges,
                ratio_overrides,
                units,
                names,
                categories,
            },
            summary,
        ))
    }
}

fn load_manifest(path: &Path) -> Result<Manifest, StandardsError> {
    let contents = std::fs::read_to_string(path).map_err(|e| StandardsError::io(path, e))?;
    toml::from_str(&contents).map_err(|e| StandardsError::toml(path, e))
}

fn validate_manifest(manifest: &Manifest, reference_dir: &Path) -> Result<(), StandardsError> {
    if let Some(message) = manifest.header_problem() {
        return Err(StandardsError::InvalidManifest { message });
    }

    let mut roles: BTreeSet<&str> = BTreeSet::new();
    let mut manifest_paths: BTreeSet<PathBuf> = BTreeSet::new();

    for file in &manifest.files {
        if !roles.insert(file.role.as_str()) {
            return Err(StandardsError::DuplicateRole {
                role: file.role.clone(),
            });
        }

        if !file.kind_matches_path() {
            return Err(StandardsError::InvalidManifest {
                message: format!("kind '{}' does not match {}", file.kind.as_str(), file.path),
            });
        }

        if !is_sha256_hex(&file.sha256) {
            return Err(StandardsError::InvalidSha256 {
                path: PathBuf::from(&file.path),
                message: "sha256 must be 64 hex characters".to_string(),
            });
        }

        manifest_paths.insert(normalize_path(&validate_path(&file.path)?));
    }

    for role in REQUIRED_ROLES {
        if !roles.contains(role) {
            return Err(StandardsError::MissingRole {
                role: role.to_string(),
            });
        }
    }

    for path in list_files_under(reference_dir)? {
        if path == Path::new("manifest.toml") {
            continue;
        }
        if !manifest_paths.contains(&normalize_path(&path)) {
            return Err(StandardsError::UnexpectedFile {
                path: reference_dir.join(path),
            });
        }
    }

    Ok(())
}

fn verify_file(reference_dir: &Path, file: &ManifestFile) -> Result<Vec<u8>, StandardsError> {
    let full_path = reference_dir.join(&file.path);
    let (bytes, actual) = read_with_sha256(&full_path)?;
    let expected = file.sha256.to_ascii_lowercase();
    if actual != expected {
        return Err(StandardsError::Sha256Mismatch {
            path: full_path,
            expected,
            actual,
        });
    }
    Ok(bytes)
}

fn role_contents<'a>(
    reference_dir: &Path,
    manifest: &Manifest,
    contents: &'a BTreeMap<String, Vec<u8>>,
    role: &str,
) -> Result<(PathBuf, &'a [u8]), StandardsError> {
    let missing = || StandardsError::MissingRole {
        role: role.to_string(),
    };
    let file = manifest.file_for_role(role).ok_or_else(missing)?;
    let bytes = contents.get(role).ok_or_else(missing)?;
    Ok((reference_dir.join(&file.path), bytes.as_slice()))
}

fn utf8(path: &Path, bytes: &[u8]) -> Result<String, StandardsError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| {
        StandardsError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        )
    })
}

fn check_section_members(
    path: &Path,
    categories: &CategoryIndex,
    ranges: &BTreeMap<BiomarkerKey, BandSpec>,
) -> Result<(), StandardsError> {
    for category in categories.categories() {
        for biomarker in &category.biomarkers {
            if !ranges.contains_key(biomarker) {
                return Err(StandardsError::InvalidSections {
                    path: path.to_path_buf(),
                    message: format!(
                        "category {} lists {} which has no reference range",
                        category.key, biomarker
                    ),
                });
            }
        }
    }
    Ok(())
}

fn validate_path(path: &str) -> Result<PathBuf, StandardsError> {
    if path.contains('\\') {
        return Err(StandardsError::InvalidPath {
            path: PathBuf::from(path),
            message: "manifest path must use '/' separators".to_string(),
        });
    }

    let p = PathBuf::from(path);
    if p.is_absolute() {
        return Err(StandardsError::InvalidPath {
            path: p,
            message: "manifest path must be relative".to_string(),
        });
    }

    if p.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(StandardsError::InvalidPath {
            path: p,
            message: "manifest path must not traverse out of reference/".to_string(),
        });
    }

    Ok(p)
}

fn list_files_under(root: &Path) -> Result<BTreeSet<PathBuf>, StandardsError> {
    let mut stack = vec![root.to_path_buf()];
    let mut files = BTreeSet::new();

    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir).map_err(|e| StandardsError::io(&dir, e))? {
            let entry = entry.map_err(|e| StandardsError::io(&dir, e))?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                let rel = path
                    .strip_prefix(root)
                    .map_err(|e| StandardsError::InvalidPath {
                        path: path.clone(),
                        message: format!("failed to relativize path: {e}"),
                    })?
                    .to_path_buf();
                files.insert(rel);
            }
        }
    }

    Ok(files)
}

fn normalize_path(p: &Path) -> PathBuf {
    p.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
