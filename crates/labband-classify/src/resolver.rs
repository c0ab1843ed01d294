//! Sex and age branch selection.

use labband_model::{AgeBranch, BandSpec, Bands, ResolvedBandSpec, Sex};

/// Select the band specification that applies to a patient.
///
/// A sex branch is entered when `sex` names one that exists. Age branches
/// are only considered when `age` is known; among the branches containing
/// the age the narrowest wins, then the one with the lower lower bound.
/// When no branch applies the bands declared beside the branches are used,
/// or no bands at all. Branches inherit the nearest ancestor's `unit`.
///
/// The shared table is never modified; the result owns its bands.
pub fn resolve(spec: &BandSpec, sex: Option<Sex>, age: Option<u32>) -> ResolvedBandSpec {
    resolve_within(spec, None, sex, age)
}

fn resolve_within(
    spec: &BandSpec,
    inherited_unit: Option<&str>,
    sex: Option<Sex>,
    age: Option<u32>,
) -> ResolvedBandSpec {
    let unit = spec.unit().or(inherited_unit);
    match spec {
        BandSpec::Flat { bands, .. } => resolved(unit, bands.clone()),
        BandSpec::SexBranched {
            male,
            female,
            fallback,
            ..
        } => {
            let branch = match sex {
                Some(Sex::Male) => male.as_deref(),
                Some(Sex::Female) => female.as_deref(),
                None => None,
            };
            match branch {
                Some(child) => resolve_within(child, unit, sex, age),
                None => resolved(unit, fallback.clone().unwrap_or_default()),
            }
        }
        BandSpec::AgeBranched {
            branches, fallback, ..
        } => match age.and_then(|age| select_age_branch(branches, age)) {
            Some(branch) => resolve_within(&branch.spec, unit, sex, age),
            None => resolved(unit, fallback.clone().unwrap_or_default()),
        },
    }
}

fn resolved(unit: Option<&str>, bands: Bands) -> ResolvedBandSpec {
    ResolvedBandSpec {
        unit: unit.unwrap_or_default().to_string(),
        bands,
    }
}

/// Narrowest containing branch; ties go to the lower lower bound, then to
/// declaration order.
pub fn select_age_branch(branches: &[AgeBranch], age: u32) -> Option<&AgeBranch> {
    branches
        .iter()
        .filter(|branch| branch.band.contains(age))
        .min_by_key(|branch| (branch.band.span(), branch.band.bounds().0))
}

#[cfg(test)]
mod tests {
    use labband_model::{AgeBand, NumericBands, RangePredicate};

    use super::*;

    fn optimal(min: f64, max: f64) -> Bands {
        Bands::Numeric(NumericBands {
            optimal: vec![RangePredicate::between(min, max)],
            ..NumericBands::default()
        })
    }

    fn flat(unit: Option<&str>, bands: Bands) -> BandSpec {
        BandSpec::Flat {
            unit: unit.map(str::to_string),
            bands,
        }
    }

    fn branch(band: AgeBand, spec: BandSpec) -> AgeBranch {
        AgeBranch { band, spec }
    }

    #[test]
    fn flat_spec_resolves_to_itself() {
        let spec = flat(Some("mmol/L"), optimal(4.2, 5.0));
        let resolved = resolve(&spec, Some(Sex::Female), Some(40));
        assert_eq!(resolved.unit, "mmol/L");
        assert_eq!(resolved.bands, optimal(4.2, 5.0));
    }

    #[test]
    fn sex_branch_inherits_parent_unit() {
        let spec = BandSpec::SexBranched {
            unit: Some("ng/mL".to_string()),
            male: Some(Box::new(flat(None, optimal(50.0, 150.0)))),
            female: Some(Box::new(flat(Some("µg/L"), optimal(30.0, 100.0)))),
            fallback: None,
        };

        let male = resolve(&spec, Some(Sex::Male), None);
        assert_eq!(male.unit, "ng/mL");
        assert_eq!(male.bands, optimal(50.0, 150.0));

        let female = resolve(&spec, Some(Sex::Female), None);
        assert_eq!(female.unit, "µg/L");
    }

    #[test]
    fn unknown_sex_uses_fallback_or_nothing() {
        let spec = BandSpec::SexBranched {
            unit: Some("ng/mL".to_string()),
            male: Some(Box::new(flat(None, optimal(50.0, 150.0)))),
            female: None,
            fallback: None,
        };
        let resolved = resolve(&spec, None, None);
        assert_eq!(resolved.unit, "ng/mL");
        assert!(resolved.bands.is_empty());

        let missing_branch = resolve(&spec, Some(Sex::Female), None);
        assert!(missing_branch.bands.is_empty());
    }

    #[test]
    fn narrowest_age_branch_wins() {
        let spec = BandSpec::AgeBranched {
            unit: Some("ng/mL".to_string()),
            branches: vec![
                branch(AgeBand::AtLeast(40), flat(None, optimal(0.0, 4.0))),
                branch(AgeBand::Between(40, 49), flat(None, optimal(0.0, 2.5))),
                branch(AgeBand::Below(40), flat(None, optimal(0.0, 2.0))),
            ],
            fallback: Some(optimal(0.0, 10.0)),
        };

        assert_eq!(resolve(&spec, None, Some(45)).bands, optimal(0.0, 2.5));
        assert_eq!(resolve(&spec, None, Some(70)).bands, optimal(0.0, 4.0));
        assert_eq!(resolve(&spec, None, Some(39)).bands, optimal(0.0, 2.0));
        assert_eq!(resolve(&spec, None, None).bands, optimal(0.0, 10.0));
        assert_eq!(resolve(&spec, None, Some(45)).unit, "ng/mL");
    }

    #[test]
    fn equal_spans_prefer_lower_bound() {
        let branches = vec![
            branch(AgeBand::Between(50, 59), flat(None, optimal(0.0, 3.5))),
            branch(AgeBand::Between(45, 54), flat(None, optimal(0.0, 3.0))),
        ];
        let chosen = select_age_branch(&branches, 52).expect("a branch contains 52");
        assert_eq!(chosen.band, AgeBand::Between(45, 54));
        assert!(select_age_branch(&branches, 30).is_none());
    }

    #[test]
    fn age_branch_inside_sex_branch() {
        let spec = BandSpec::SexBranched {
            unit: Some("pg/mL".to_string()),
            male: Some(Box::new(BandSpec::AgeBranched {
                unit: None,
                branches: vec![
                    branch(AgeBand::Below(50), flat(None, optimal(1.0, 2.0))),
                    branch(AgeBand::AtLeast(50), flat(None, optimal(3.0, 4.0))),
                ],
                fallback: None,
            })),
            female: None,
            fallback: None,
        };
        let resolved = resolve(&spec, Some(Sex::Male), Some(61));
        assert_eq!(resolved.unit, "pg/mL");
        assert_eq!(resolved.bands, optimal(3.0, 4.0));
    }
}
