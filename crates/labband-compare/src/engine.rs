//! Band comparison of two classified reports.

use std::collections::{BTreeMap, BTreeSet};

use labband_model::{
    BandTransition, BiomarkerKey, Bucket, CategoryAggregate, CategoryIndex, ClassifiedReport,
    ComparisonDates, ComparisonResult, Diff, Flags, Highlight, Highlights, Overall, Sex, Trend,
    UNMAPPED_CATEGORY,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::dates::{Chronology, chronology};

/// Number of categories listed per highlight direction.
pub const HIGHLIGHT_LIMIT: usize = 3;

/// Options of [`compare`]. Loadable from a settings file; absent fields
/// take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    /// Reserved for sex-specific weighting; currently unused.
    pub sex: Option<Sex>,
    /// Score only biomarkers present in the older report.
    pub consider_only_old_present: bool,
    /// Per-biomarker weight applied to `weighted_net`; missing keys weigh 1.0.
    pub weights: BTreeMap<BiomarkerKey, f64>,
    /// Biomarkers whose upward moves are flagged as Positive.
    pub risk_markers_positive: Vec<BiomarkerKey>,
    /// Biomarkers whose downward moves are flagged as Caution.
    pub risk_markers_caution: Vec<BiomarkerKey>,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            sex: None,
            consider_only_old_present: true,
            weights: BTreeMap::new(),
            risk_markers_positive: Vec::new(),
            risk_markers_caution: Vec::new(),
        }
    }
}

/// Score of a band move: +1 per step up, -1 per step down.
pub fn transition_score(from: Bucket, to: Bucket) -> i32 {
    to.rank() - from.rank()
}

fn is_positive_move(from: Bucket, to: Bucket) -> bool {
    transition_score(from, to) > 0
}

fn is_caution_move(from: Bucket, to: Bucket) -> bool {
    transition_score(from, to) < 0
}

/// Compare two reports taken at different dates.
///
/// The reports are put in chronological order first; when either date is
/// indeterminate the given order is kept. Biomarkers on only one side are
/// scored 0 with trend `same`, and with `consider_only_old_present` those
/// only in the newer report are not scored at all. Every category of
/// `index` is listed in index order, followed by `unmapped` when some
/// scored biomarker belongs to no category.
pub fn compare(
    index: &CategoryIndex,
    report_a: &ClassifiedReport,
    report_b: &ClassifiedReport,
    date_a: &str,
    date_b: &str,
    options: &CompareOptions,
) -> ComparisonResult {
    let span = info_span!(
        "compare_reports",
        only_old = options.consider_only_old_present,
        categories = index.len()
    );
    let _guard = span.enter();

    let order = chronology(date_a, date_b);
    if order == Chronology::Indeterminate {
        warn!(date_a, date_b, "report date not parseable; keeping input order");
    }
    let ((old_date, old), (new_date, new)) = if order.is_swapped() {
        ((date_b, report_b), (date_a, report_a))
    } else {
        ((date_a, report_a), (date_b, report_b))
    };

    let old_keys: BTreeSet<&BiomarkerKey> = old.classified_keys().collect();
    let new_keys: BTreeSet<&BiomarkerKey> = new.classified_keys().collect();
    let domain: BTreeSet<&BiomarkerKey> = if options.consider_only_old_present {
        old_keys.clone()
    } else {
        old_keys.union(&new_keys).copied().collect()
    };

    let mut per_category: BTreeMap<String, CategoryAggregate> = BTreeMap::new();
    let mut transitions = Vec::with_capacity(domain.len());

    for biomarker in domain {
        let from = old.bucket_of(biomarker.as_str());
        let to = new.bucket_of(biomarker.as_str());

        let (category_key, title) = match index.category_of(biomarker.as_str()) {
            Some(category) => (category.key.clone(), category.title.clone()),
            None => (UNMAPPED_CATEGORY.to_string(), UNMAPPED_CATEGORY.to_string()),
        };
        let weight = options.weights.get(biomarker).copied().unwrap_or(1.0);

        let (score, step) = match (from, to) {
            (Some(from), Some(to)) => {
                let score = transition_score(from, to);
                (score, score.unsigned_abs())
            }
            _ => (0, 0),
        };
        let trend = Trend::from_score(score);

        let aggregate = per_category
            .entry(category_key.clone())
            .or_insert_with(|| CategoryAggregate::empty(category_key, title.clone()));
        match trend {
            Trend::Better => aggregate.improved += 1,
            Trend::Worse => aggregate.worsened += 1,
            Trend::Same => aggregate.same += 1,
        }
        aggregate.net_score += score;
        aggregate.weighted_net += f64::from(score) * weight;

        debug!(biomarker = %biomarker, trend = trend.as_str(), score, "scored transition");
        transitions.push(BandTransition {
            biomarker: biomarker.clone(),
            category: title,
            from_band: from,
            to_band: to,
            trend,
            step,
            score,
            weight,
            old_value: old.record_of(biomarker.as_str()).and_then(|r| r.value.as_f64()),
            new_value: new.record_of(biomarker.as_str()).and_then(|r| r.value.as_f64()),
        });
    }

    let categories = ordered_categories(index, per_category);
    let highlights = highlights(&categories);
    let flags = flags(&transitions, options);

    let overall = Overall {
        date_old: old_date.to_string(),
        date_new: new_date.to_string(),
        better_categories: count_trend(&categories, Trend::Better),
        same_categories: count_trend(&categories, Trend::Same),
        worse_categories: count_trend(&categories, Trend::Worse),
        net_score: categories.iter().map(|c| c.net_score).sum(),
        weighted_net_score: categories.iter().map(|c| c.weighted_net).sum(),
    };

    let diff = Diff {
        appeared: new_keys.difference(&old_keys).map(|k| (*k).clone()).collect(),
        disappeared: old_keys.difference(&new_keys).map(|k| (*k).clone()).collect(),
    };

    info!(
        transitions = transitions.len(),
        net_score = overall.net_score,
        better = overall.better_categories,
        worse = overall.worse_categories,
        "comparison complete"
    );

    ComparisonResult {
        dates: ComparisonDates {
            old: old_date.to_string(),
            new: new_date.to_string(),
        },
        overall,
        categories,
        transitions,
        highlights,
        flags,
        diff,
    }
}

fn ordered_categories(
    index: &CategoryIndex,
    mut per_category: BTreeMap<String, CategoryAggregate>,
) -> Vec<CategoryAggregate> {
    let mut categories: Vec<CategoryAggregate> = index
        .categories()
        .iter()
        .map(|category| {
            per_category
                .remove(&category.key)
                .unwrap_or_else(|| CategoryAggregate::empty(&category.key, &category.title))
        })
        .collect();
    if let Some(unmapped) = per_category.remove(UNMAPPED_CATEGORY) {
        categories.push(unmapped);
    }
    for aggregate in &mut categories {
        aggregate.trend = Trend::from_score(aggregate.net_score);
    }
    categories
}

fn count_trend(categories: &[CategoryAggregate], trend: Trend) -> usize {
    categories.iter().filter(|c| c.trend == trend).count()
}

fn highlights(categories: &[CategoryAggregate]) -> Highlights {
    let mut up: Vec<&CategoryAggregate> = categories.iter().filter(|c| c.net_score > 0).collect();
    up.sort_by(|a, b| b.net_score.cmp(&a.net_score).then_with(|| a.title.cmp(&b.title)));

    let mut down: Vec<&CategoryAggregate> =
        categories.iter().filter(|c| c.net_score < 0).collect();
    down.sort_by(|a, b| a.net_score.cmp(&b.net_score).then_with(|| a.title.cmp(&b.title)));

    let to_highlight = |c: &&CategoryAggregate| Highlight {
        key: c.key.clone(),
        category: c.title.clone(),
        delta: c.net_score,
    };
    Highlights {
        improvements: up.iter().take(HIGHLIGHT_LIMIT).map(to_highlight).collect(),
        regressions: down.iter().take(HIGHLIGHT_LIMIT).map(to_highlight).collect(),
    }
}

fn flags(transitions: &[BandTransition], options: &CompareOptions) -> Flags {
    let positive: BTreeSet<&BiomarkerKey> = options.risk_markers_positive.iter().collect();
    let caution: BTreeSet<&BiomarkerKey> = options.risk_markers_caution.iter().collect();

    let mut flags = Flags::default();
    for transition in transitions {
        let (Some(from), Some(to)) = (transition.from_band, transition.to_band) else {
            continue;
        };
        let label = format!("{} {}→{}", transition.biomarker, from, to);
        if positive.contains(&transition.biomarker) && is_positive_move(from, to) {
            flags.positive.push(label.clone());
        }
        if caution.contains(&transition.biomarker) && is_caution_move(from, to) {
            flags.caution.push(label);
        }
    }
    flags
}
