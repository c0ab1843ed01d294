use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use labband_classify::{ClassificationContext, SectionOptions, classify_report, group_by_section};
use labband_compare::{CompareOptions, compare};
use labband_ingest::{
    ExtractedDocument, age_from_fields, chronological_age, merge_documents, sex_from_fields,
};
use labband_model::{ClassifiedReport, ComparisonResult, Sex};
use labband_standards::{ReferenceRegistry, ReferenceSummary, reference_root};
use tracing::{info, info_span, trace};

use labband_cli::logging::redact_value;
use labband_cli::settings::{canonicalize_keys, load_compare_settings};

use crate::cli::{ClassifyArgs, CompareArgs};
use crate::types::ClassifyResult;

pub fn load_registry(reference_dir: Option<&Path>) -> Result<(ReferenceRegistry, ReferenceSummary)> {
    let dir = reference_dir.map_or_else(reference_root, Path::to_path_buf);
    ReferenceRegistry::verify_and_load(&dir)
        .with_context(|| format!("load reference data from {}", dir.display()))
}

pub fn run_classify(args: &ClassifyArgs, registry: &ReferenceRegistry) -> Result<ClassifyResult> {
    let span = info_span!("classify", documents = args.documents.len());
    let _guard = span.enter();

    let documents = args
        .documents
        .iter()
        .map(|path| ExtractedDocument::load(path))
        .collect::<Result<Vec<_>, _>>()
        .context("load extracted documents")?;
    let merged = merge_documents(documents);

    let today = match &args.today {
        Some(value) => NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .with_context(|| format!("parse --today {value}"))?,
        None => chrono::Local::now().date_naive(),
    };
    let sex = match &args.sex {
        Some(value) => Some(
            value
                .parse::<Sex>()
                .with_context(|| format!("parse --sex {value}"))?,
        ),
        None => sex_from_fields(&merged.fields),
    };
    let age = match (args.age, &args.dob) {
        (Some(age), _) => Some(age),
        (None, Some(dob)) => Some(chronological_age(dob, today).context("parse --dob")?),
        (None, None) => age_from_fields(&merged.fields, today),
    };

    let raw = merged.raw_results();
    for result in &raw {
        trace!(
            biomarker = %result.biomarker_name,
            value = redact_value(&result.result),
            units = %result.units,
            "extracted result"
        );
    }
    info!(results = raw.len(), sex = ?sex, age = ?age, "merged upload");

    let ctx = ClassificationContext::from_registry(registry);
    let report = classify_report(&ctx, &raw, sex, age);
    let sections = match &report {
        Some(report) => group_by_section(
            &registry.categories,
            report,
            SectionOptions {
                include_invalid: !args.no_invalid,
                include_missing: args.include_missing,
            },
        ),
        None => Vec::new(),
    };

    if let (Some(path), Some(report)) = (&args.output, &report) {
        let json = serde_json::to_string_pretty(report).context("serialize report")?;
        fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    }

    Ok(ClassifyResult {
        documents: merged.document_count,
        report_date: merged.report_date,
        sex,
        age,
        report,
        sections,
    })
}

pub fn run_compare(args: &CompareArgs, registry: &ReferenceRegistry) -> Result<ComparisonResult> {
    let report_a = read_report(&args.report_a)?;
    let report_b = read_report(&args.report_b)?;

    let mut options = match &args.settings {
        Some(path) => load_compare_settings(path)?,
        None => CompareOptions::default(),
    };
    if args.include_new {
        options.consider_only_old_present = false;
    }
    canonicalize_keys(&mut options, |name| registry.names.canonical_key(name));

    Ok(compare(
        &registry.categories,
        &report_a,
        &report_b,
        &args.date_a,
        &args.date_b,
        &options,
    ))
}

fn read_report(path: &Path) -> Result<ClassifiedReport> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read report {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse report {}", path.display()))
}
