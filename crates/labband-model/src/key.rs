use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical identifier of one lab analyte (`fasting_glucose`, `iron_serum`).
///
/// The type does not canonicalize on construction; keys are produced by the
/// name canonicalizer or read from reference data that is already canonical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BiomarkerKey(String);

impl BiomarkerKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for BiomarkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for BiomarkerKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BiomarkerKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BiomarkerKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BiomarkerKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}
