//! Unit canonicalization, display spelling and conversion.
//!
//! Canonical units are spelling-normalized lowercase tokens (`mmol/l`,
//! `µmol/l`, `x10^9/l`). Canonicalization never changes a value; only
//! [`UnitTable::convert`] does, using factors from configuration.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{ConversionError, UnitTableError};

/// `10` followed by superscript digits, e.g. `10⁹`.
static SUPERSCRIPT_EXPONENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("10([⁰¹²³⁴⁵⁶⁷⁸⁹]+)").expect("Invalid superscript exponent regex"));

/// Cell-count powers of ten in their many spellings: `×10^9/`, `10*9/`, `109/`.
static POWER_OF_TEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[x*]?10(?:\^|\*{1,2})?(9|12)/").expect("Invalid power-of-ten regex")
});

fn superscript_digit(c: char) -> Option<char> {
    let digit = match c {
        '⁰' => '0',
        '¹' => '1',
        '²' => '2',
        '³' => '3',
        '⁴' => '4',
        '⁵' => '5',
        '⁶' => '6',
        '⁷' => '7',
        '⁸' => '8',
        '⁹' => '9',
        _ => return None,
    };
    Some(digit)
}

/// Normalize the spelling of a unit without consulting any alias table.
///
/// Removes whitespace, lowercases, unifies the micro sign, rewrites
/// superscripts and power-of-ten notation and spells the body-surface
/// area unit as `m²`.
pub fn normalize_spelling(raw: &str) -> String {
    let trimmed = raw.trim();
    let exponent = SUPERSCRIPT_EXPONENT.replace_all(trimmed, |caps: &regex::Captures<'_>| {
        let digits: String = caps[1].chars().filter_map(superscript_digit).collect();
        format!("10^{digits}")
    });
    let mut spelled: String = exponent
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| superscript_digit(c).unwrap_or(c))
        .collect::<String>()
        .to_lowercase()
        .replace('μ', "µ")
        .replace('×', "x");
    if POWER_OF_TEN.is_match(&spelled) {
        spelled = POWER_OF_TEN.replace(&spelled, "x10^${1}/").into_owned();
    }
    spelled.replace("m2", "m²")
}

fn default_empty_tokens() -> Vec<String> {
    ["", "-", "—", "na", "n/a", "none"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_unitless() -> Vec<String> {
    ["", "ratio", "index", "score", "pattern", "profile", "genotype"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanonicalConfig {
    /// Spellings that mean "no unit".
    #[serde(default = "default_empty_tokens")]
    pub empty_tokens: Vec<String>,
    /// Expected units for which conversion is never attempted.
    #[serde(default = "default_unitless")]
    pub unitless: Vec<String>,
}

impl Default for CanonicalConfig {
    fn default() -> Self {
        Self {
            empty_tokens: default_empty_tokens(),
            unitless: default_unitless(),
        }
    }
}

/// `value_in_to = value_in_from * factor`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionRule {
    pub from: String,
    pub to: String,
    pub factor: f64,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyteOverride {
    pub analyte: String,
    pub from: String,
    pub to: String,
    pub factor: f64,
    #[serde(default)]
    pub note: Option<String>,
}

/// Unit tables as written in `units.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnitConfig {
    #[serde(default)]
    pub canonical: CanonicalConfig,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub display: BTreeMap<String, String>,
    #[serde(default, rename = "conversion")]
    pub conversions: Vec<ConversionRule>,
    #[serde(default, rename = "override")]
    pub overrides: Vec<AnalyteOverride>,
}

type UnitPair = (String, String);

/// Immutable unit lookup tables built once from [`UnitConfig`].
#[derive(Debug, Clone, Default)]
pub struct UnitTable {
    empty_tokens: BTreeSet<String>,
    unitless: BTreeSet<String>,
    aliases: BTreeMap<String, String>,
    display: BTreeMap<String, String>,
    generic: BTreeMap<UnitPair, f64>,
    overrides: BTreeMap<String, BTreeMap<UnitPair, f64>>,
    explicit_generic: usize,
    explicit_overrides: usize,
}

impl UnitTable {
    /// Build the tables, canonicalizing every key and deriving reverse
    /// factors (`1 / factor`) for pairs not configured in both directions.
    pub fn from_config(config: &UnitConfig) -> Result<Self, UnitTableError> {
        let empty_tokens: BTreeSet<String> = config
            .canonical
            .empty_tokens
            .iter()
            .map(|t| normalize_spelling(t))
            .collect();

        let mut aliases = BTreeMap::new();
        for (alias, target) in &config.aliases {
            let alias = normalize_spelling(alias);
            let target = normalize_spelling(target);
            if alias != target {
                aliases.insert(alias, target);
            }
        }
        for (alias, target) in &aliases {
            if aliases.contains_key(target) {
                return Err(UnitTableError::AliasChain {
                    alias: alias.clone(),
                    target: target.clone(),
                });
            }
        }

        let mut table = Self {
            empty_tokens,
            aliases,
            ..Self::default()
        };
        table.unitless = config
            .canonical
            .unitless
            .iter()
            .map(|u| table.canonicalize(u))
            .collect();
        table.display = config
            .display
            .iter()
            .map(|(unit, shown)| (table.canonicalize(unit), shown.clone()))
            .collect();

        let generic_rules: Vec<(UnitPair, f64)> = config
            .conversions
            .iter()
            .map(|rule| table.canonical_rule(&rule.from, &rule.to, rule.factor))
            .collect::<Result<_, _>>()?;
        table.explicit_generic = generic_rules.len();
        table.generic = build_factor_map("generic", &generic_rules)?;

        let mut by_analyte: BTreeMap<String, Vec<(UnitPair, f64)>> = BTreeMap::new();
        for rule in &config.overrides {
            let entry = table.canonical_rule(&rule.from, &rule.to, rule.factor)?;
            by_analyte
                .entry(rule.analyte.trim().to_string())
                .or_default()
                .push(entry);
        }
        table.explicit_overrides = config.overrides.len();
        for (analyte, rules) in by_analyte {
            let factors = build_factor_map(&analyte, &rules)?;
            table.overrides.insert(analyte, factors);
        }

        Ok(table)
    }

    fn canonical_rule(
        &self,
        from: &str,
        to: &str,
        factor: f64,
    ) -> Result<(UnitPair, f64), UnitTableError> {
        let from = self.canonicalize(from);
        let to = self.canonicalize(to);
        if !factor.is_finite() || factor <= 0.0 {
            return Err(UnitTableError::InvalidFactor { from, to, factor });
        }
        if from == to {
            return Err(UnitTableError::SameUnit { unit: from });
        }
        Ok(((from, to), factor))
    }

    /// Canonical token for a free-text unit. Empty-unit spellings map to `""`.
    pub fn canonicalize(&self, raw: &str) -> String {
        let spelled = normalize_spelling(raw);
        if self.empty_tokens.contains(&spelled) {
            return String::new();
        }
        match self.aliases.get(&spelled) {
            Some(target) => target.clone(),
            None => spelled,
        }
    }

    /// Human spelling of a unit (`mmol/L`); unknown units are returned as given.
    pub fn display(&self, raw: &str) -> String {
        let canonical = self.canonicalize(raw);
        match self.display.get(&canonical) {
            Some(shown) => shown.clone(),
            None => raw.to_string(),
        }
    }

    /// True when conversion must never be attempted against this expected unit.
    pub fn is_unitless(&self, canonical: &str) -> bool {
        self.unitless.contains(canonical)
    }

    /// Factor for `from -> to` (canonical tokens), analyte overrides first.
    pub fn factor(&self, from: &str, to: &str, analyte: &str) -> Option<f64> {
        let pair = (from.to_string(), to.to_string());
        self.overrides
            .get(analyte)
            .and_then(|factors| factors.get(&pair))
            .or_else(|| self.generic.get(&pair))
            .copied()
    }

    /// Convert `value` between units. Equal canonical units pass through
    /// unchanged without a table lookup.
    pub fn convert(
        &self,
        value: f64,
        from: &str,
        to: &str,
        analyte: &str,
    ) -> Result<f64, ConversionError> {
        let from = self.canonicalize(from);
        let to = self.canonicalize(to);
        if from == to {
            return Ok(value);
        }
        match self.factor(&from, &to, analyte) {
            Some(factor) => Ok(value * factor),
            None => Err(ConversionError::NoConversion { from, to }),
        }
    }

    /// Analyte-specific `(from, to)` pairs, including derived reverses.
    pub fn override_pairs(&self, analyte: &str) -> Vec<(String, String)> {
        self.overrides
            .get(analyte)
            .map(|factors| factors.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn override_analytes(&self) -> impl Iterator<Item = &str> {
        self.overrides.keys().map(String::as_str)
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    /// Number of configured generic rules (derived reverses excluded).
    pub fn conversion_count(&self) -> usize {
        self.explicit_generic
    }

    /// Number of configured analyte rules (derived reverses excluded).
    pub fn override_count(&self) -> usize {
        self.explicit_overrides
    }
}

const FACTOR_TOLERANCE: f64 = 1e-9;

fn same_factor(a: f64, b: f64) -> bool {
    (a - b).abs() <= FACTOR_TOLERANCE * a.abs().max(b.abs())
}

fn build_factor_map(
    scope: &str,
    rules: &[(UnitPair, f64)],
) -> Result<BTreeMap<UnitPair, f64>, UnitTableError> {
    let mut explicit: BTreeMap<UnitPair, f64> = BTreeMap::new();
    for (pair, factor) in rules {
        if let Some(existing) = explicit.get(pair) {
            if !same_factor(*existing, *factor) {
                return Err(UnitTableError::ConflictingFactor {
                    scope: scope.to_string(),
                    from: pair.0.clone(),
                    to: pair.1.clone(),
                    first: *existing,
                    second: *factor,
                });
            }
            continue;
        }
        explicit.insert(pair.clone(), *factor);
    }

    let mut factors = explicit.clone();
    for ((from, to), factor) in &explicit {
        let reverse = (to.clone(), from.clone());
        if !explicit.contains_key(&reverse) {
            factors.insert(reverse, 1.0 / factor);
        }
    }
    Ok(factors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> UnitTable {
        let config: UnitConfig = toml::from_str(
            r#"
            [aliases]
            "mu/l" = "miu/l"
            "umol/l" = "µmol/l"
            "ml/min/1.73m2" = "ml/min/1.73m²"

            [display]
            "mmol/l" = "mmol/L"
            "µmol/l" = "µmol/L"
            "x10^9/l" = "x10^9/L"

            [[conversion]]
            from = "mg/dl"
            to = "g/l"
            factor = 0.01

            [[override]]
            analyte = "c_peptide"
            from = "ng/ml"
            to = "nmol/l"
            factor = 0.331
            "#,
        )
        .expect("parse unit config");
        UnitTable::from_config(&config).expect("build unit table")
    }

    #[test]
    fn spelling_variants_collapse() {
        let units = table();
        assert_eq!(units.canonicalize(" mmol / L "), "mmol/l");
        assert_eq!(units.canonicalize("μmol/L"), "µmol/l");
        assert_eq!(units.canonicalize("umol/L"), "µmol/l");
        assert_eq!(units.canonicalize("×10^9/L"), "x10^9/l");
        assert_eq!(units.canonicalize("×10⁹/L"), "x10^9/l");
        assert_eq!(units.canonicalize("10*12/L"), "x10^12/l");
        assert_eq!(units.canonicalize("mL/min/1.73m2"), "ml/min/1.73m²");
        assert_eq!(units.canonicalize("mU/L"), "miu/l");
    }

    #[test]
    fn empty_tokens_are_unitless() {
        let units = table();
        for token in ["", " ", "-", "—", "NA", "n/a", "None"] {
            assert_eq!(units.canonicalize(token), "", "token {token:?}");
        }
        assert!(units.is_unitless(""));
        assert!(units.is_unitless("ratio"));
        assert!(!units.is_unitless("mmol/l"));
    }

    #[test]
    fn display_falls_back_to_raw() {
        let units = table();
        assert_eq!(units.display("umol/l"), "µmol/L");
        assert_eq!(units.display("MMOL/L"), "mmol/L");
        assert_eq!(units.display("furlongs"), "furlongs");
    }

    #[test]
    fn equal_units_skip_lookup() {
        let units = table();
        assert_eq!(units.convert(5.2, "mmol/L", "MMOL/L", "fasting_glucose"), Ok(5.2));
    }

    #[test]
    fn override_precedes_generic_and_reverses() {
        let units = table();
        let nmol = units
            .convert(2.0, "ng/mL", "nmol/L", "c_peptide")
            .expect("override applies");
        assert!((nmol - 0.662).abs() < 1e-12);
        let back = units
            .convert(nmol, "nmol/L", "ng/mL", "c_peptide")
            .expect("derived reverse applies");
        assert!((back - 2.0).abs() < 1e-9);
        assert!(units.convert(2.0, "ng/mL", "nmol/L", "insulin").is_err());
        let mg = units.convert(1.5, "g/L", "mg/dL", "lpa").expect("generic reverse");
        assert!((mg - 150.0).abs() < 1e-9);
    }

    #[test]
    fn missing_path_reports_canonical_units() {
        let units = table();
        let err = units
            .convert(1.0, "mg/dL", "mmol/L", "fasting_glucose")
            .expect_err("no path");
        assert_eq!(err.to_string(), "no_conversion:mg/dl->mmol/l");
    }

    #[test]
    fn conflicting_factors_rejected() {
        let config: UnitConfig = toml::from_str(
            r#"
            [[conversion]]
            from = "mg/dl"
            to = "g/l"
            factor = 0.01

            [[conversion]]
            from = "MG/DL"
            to = "g/L"
            factor = 0.1
            "#,
        )
        .expect("parse");
        assert!(matches!(
            UnitTable::from_config(&config),
            Err(UnitTableError::ConflictingFactor { .. })
        ));
    }

    #[test]
    fn invalid_rules_rejected() {
        let zero: UnitConfig = toml::from_str(
            r#"
            [[conversion]]
            from = "a"
            to = "b"
            factor = 0.0
            "#,
        )
        .expect("parse");
        assert!(matches!(
            UnitTable::from_config(&zero),
            Err(UnitTableError::InvalidFactor { .. })
        ));

        let chain: UnitConfig = toml::from_str(
            r#"
            [aliases]
            "a" = "b"
            "b" = "c"
            "#,
        )
        .expect("parse");
        assert!(matches!(
            UnitTable::from_config(&chain),
            Err(UnitTableError::AliasChain { .. })
        ));
    }
}
