#![deny(unsafe_code)]

use std::path::Path;

use serde::{Deserialize, Serialize};

pub const MANIFEST_SCHEMA: &str = "labband.reference-manifest";
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// Roles every reference directory must provide, one file each.
pub const REQUIRED_ROLES: [&str; 5] = ["ranges", "ratio_overrides", "units", "names", "sections"];

/// Contents of `reference/manifest.toml`.
///
/// Each reference table is listed under `[[files]]` with its sha256 and the
/// role it plays; tables are only parsed after their hash matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub manifest: ManifestHeader,
    #[serde(default)]
    pub notes: Option<ManifestNotes>,
    pub pins: Pins,
    pub files: Vec<ManifestFile>,
}

impl Manifest {
    /// Message describing an unsupported header, if any.
    pub fn header_problem(&self) -> Option<String> {
        if self.manifest.schema != MANIFEST_SCHEMA {
            return Some(format!("unsupported schema: {}", self.manifest.schema));
        }
        if self.manifest.schema_version != MANIFEST_SCHEMA_VERSION {
            return Some(format!(
                "unsupported schema_version: {}",
                self.manifest.schema_version
            ));
        }
        None
    }

    pub fn file_for_role(&self, role: &str) -> Option<&ManifestFile> {
        self.files.iter().find(|file| file.role == role)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestHeader {
    pub schema: String,
    pub schema_version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestNotes {
    pub summary: Option<String>,
}

/// Release labels of the range, unit and section tables, echoed in the
/// `reference` summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pins {
    pub ranges: String,
    pub units: String,
    pub sections: String,
}

/// Encoding of a reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Json,
    Toml,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Json => "json",
            FileKind::Toml => "toml",
        }
    }

    /// Kind implied by a file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(FileKind::Json),
            "toml" => Some(FileKind::Toml),
            _ => None,
        }
    }
}

/// One pinned reference table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestFile {
    /// Path relative to the reference directory.
    pub path: String,
    pub sha256: String,
    pub kind: FileKind,
    pub role: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ManifestFile {
    /// True when the declared kind agrees with the file extension.
    pub fn kind_matches_path(&self) -> bool {
        FileKind::from_path(Path::new(&self.path)) == Some(self.kind)
    }
}
