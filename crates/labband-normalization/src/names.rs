//! Biomarker-name canonicalization.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use labband_model::BiomarkerKey;
use serde::Deserialize;

use regex::Regex;

static NON_KEY_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-z0-9_]+").expect("Invalid key character regex"));

static REPEATED_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("_+").expect("Invalid underscore regex"));

/// Lowercase, replace runs of non `[a-z0-9_]` characters with `_`, collapse
/// repeated underscores and trim them from both ends.
pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let replaced = NON_KEY_CHARS.replace_all(&lowered, "_");
    let collapsed = REPEATED_UNDERSCORES.replace_all(&replaced, "_");
    collapsed.trim_matches('_').to_string()
}

/// Name aliases as written in `names.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NameConfig {
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

/// Alias table applied after [`slugify`].
#[derive(Debug, Clone, Default)]
pub struct NameAliases {
    aliases: BTreeMap<String, BiomarkerKey>,
}

impl NameAliases {
    /// Both sides are slugified so aliases may be written in any spelling.
    pub fn from_config(config: &NameConfig) -> Self {
        let aliases = config
            .aliases
            .iter()
            .map(|(alias, target)| (slugify(alias), BiomarkerKey::new(slugify(target))))
            .filter(|(alias, target)| alias.as_str() != target.as_str())
            .collect();
        Self { aliases }
    }

    pub fn canonical_key(&self, name: &str) -> BiomarkerKey {
        let slug = slugify(name);
        match self.aliases.get(&slug) {
            Some(target) => target.clone(),
            None => BiomarkerKey::new(slug),
        }
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
