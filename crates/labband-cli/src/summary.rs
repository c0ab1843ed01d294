use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use labband_classify::SectionBuckets;
use labband_model::{BiomarkerKey, ClassifiedReport, ComparisonResult, Trend};
use labband_standards::ReferenceSummary;

use crate::types::ClassifyResult;

pub fn print_reference_summary(summary: &ReferenceSummary) {
    println!("Reference: {}", summary.reference_dir.display());
    let mut table = Table::new();
    table.set_header(vec![header_cell("Item"), header_cell("Value")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (label, value) in reference_rows(summary) {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    println!("{table}");
}

fn reference_rows(summary: &ReferenceSummary) -> Vec<(String, String)> {
    let mut rows = vec![
        ("ranges pin".to_string(), summary.manifest_pins.ranges.clone()),
        ("units pin".to_string(), summary.manifest_pins.units.clone()),
        ("sections pin".to_string(), summary.manifest_pins.sections.clone()),
        ("files".to_string(), summary.file_count.to_string()),
        ("biomarkers".to_string(), summary.biomarker_count.to_string()),
    ];
    for (shape, count) in &summary.shapes {
        rows.push((format!("  {shape}"), count.to_string()));
    }
    rows.extend([
        ("ratio overrides".to_string(), summary.ratio_override_count.to_string()),
        ("categories".to_string(), summary.category_count.to_string()),
        (
            "categorized biomarkers".to_string(),
            summary.categorized_biomarker_count.to_string(),
        ),
        ("name aliases".to_string(), summary.name_alias_count.to_string()),
        ("unit aliases".to_string(), summary.unit_alias_count.to_string()),
        ("unit conversions".to_string(), summary.conversion_count.to_string()),
        ("analyte overrides".to_string(), summary.analyte_override_count.to_string()),
    ]);
    rows
}

pub fn print_classification(result: &ClassifyResult) {
    println!("Documents: {}", result.documents);
    println!(
        "Report date: {}",
        result.report_date.as_deref().unwrap_or("-")
    );
    println!(
        "Sex: {}  Age: {}",
        result.sex.map_or("-".to_string(), |sex| sex.to_string()),
        result.age.map_or("-".to_string(), |age| age.to_string())
    );
    let Some(report) = &result.report else {
        eprintln!("No classifiable results.");
        return;
    };

    let counts = &report.counts;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Optimal"),
        header_cell("Average"),
        header_cell("Poor"),
        header_cell("Invalid"),
        header_cell("Duplicates"),
    ]);
    apply_summary_table_style(&mut table);
    table.add_row(vec![
        count_cell(counts.optimal, Color::Green),
        count_cell(counts.normal, Color::Yellow),
        count_cell(counts.poor, Color::Red),
        count_cell(counts.invalid, Color::DarkYellow),
        count_cell(counts.duplicates, Color::DarkGrey),
    ]);
    println!("{table}");

    print_sections(&result.sections);
    print_invalid(report);
}

fn print_sections(sections: &[SectionBuckets]) {
    let populated: Vec<&SectionBuckets> = sections
        .iter()
        .filter(|s| {
            !(s.optimal.is_empty()
                && s.normal.is_empty()
                && s.poor.is_empty()
                && s.invalid.as_ref().is_none_or(Vec::is_empty)
                && s.missing.as_ref().is_none_or(Vec::is_empty))
        })
        .collect();
    if populated.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Section"),
        header_cell("Optimal"),
        header_cell("Average"),
        header_cell("Poor"),
        header_cell("Invalid"),
        header_cell("Missing"),
    ]);
    apply_summary_table_style(&mut table);
    for section in populated {
        table.add_row(vec![
            Cell::new(&section.title).add_attribute(Attribute::Bold),
            keys_cell(&section.optimal, Color::Green),
            keys_cell(&section.normal, Color::Yellow),
            keys_cell(&section.poor, Color::Red),
            optional_keys_cell(section.invalid.as_deref()),
            optional_keys_cell(section.missing.as_deref()),
        ]);
    }
    println!();
    println!("Sections:");
    println!("{table}");
}

fn print_invalid(report: &ClassifiedReport) {
    if report.invalid.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Biomarker"),
        header_cell("Reason"),
        header_cell("Unit"),
        header_cell("Expected"),
        header_cell("Detail"),
    ]);
    apply_table_style(&mut table);
    for (key, record) in &report.invalid {
        table.add_row(vec![
            Cell::new(key),
            Cell::new(&record.reason).fg(Color::DarkYellow),
            optional_cell(record.unit.as_deref()),
            optional_cell(record.expected_unit.as_deref()),
            optional_cell(record.detail.as_deref()),
        ]);
    }
    println!();
    println!("Invalid:");
    println!("{table}");
}

pub fn print_comparison(result: &ComparisonResult) {
    for line in comparison_headline(result) {
        println!("{line}");
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Category"),
        header_cell("Improved"),
        header_cell("Worsened"),
        header_cell("Same"),
        header_cell("Net"),
        header_cell("Weighted"),
        header_cell("Trend"),
    ]);
    apply_summary_table_style(&mut table);
    for column in 1..=5 {
        align_column(&mut table, column, CellAlignment::Right);
    }
    align_column(&mut table, 6, CellAlignment::Center);
    for category in &result.categories {
        table.add_row(vec![
            Cell::new(&category.title).add_attribute(Attribute::Bold),
            count_cell(category.improved, Color::Green),
            count_cell(category.worsened, Color::Red),
            dim_cell(category.same),
            Cell::new(format!("{:+}", category.net_score)).fg(trend_color(category.trend)),
            Cell::new(format!("{:+.2}", category.weighted_net)),
            trend_cell(category.trend),
        ]);
    }
    println!("{table}");
    for line in comparison_notes(result) {
        println!("{line}");
    }
}

/// Dates and overall totals, one line each.
pub fn comparison_headline(result: &ComparisonResult) -> Vec<String> {
    let overall = &result.overall;
    vec![
        format!("Compared: {} -> {}", overall.date_old, overall.date_new),
        format!(
            "Categories: {} better, {} same, {} worse",
            overall.better_categories, overall.same_categories, overall.worse_categories
        ),
        format!(
            "Net score: {:+} (weighted {:+.2})",
            overall.net_score, overall.weighted_net_score
        ),
    ]
}

/// Highlights, flags and presence changes; empty groups are omitted.
pub fn comparison_notes(result: &ComparisonResult) -> Vec<String> {
    let mut lines = Vec::new();
    for highlight in &result.highlights.improvements {
        lines.push(format!("Improving: {} ({:+})", highlight.category, highlight.delta));
    }
    for highlight in &result.highlights.regressions {
        lines.push(format!("Regressing: {} ({:+})", highlight.category, highlight.delta));
    }
    for flag in &result.flags.positive {
        lines.push(format!("Positive: {flag}"));
    }
    for flag in &result.flags.caution {
        lines.push(format!("Caution: {flag}"));
    }
    if !result.diff.appeared.is_empty() {
        lines.push(format!("Appeared: {}", join_keys(&result.diff.appeared)));
    }
    if !result.diff.disappeared.is_empty() {
        lines.push(format!("Disappeared: {}", join_keys(&result.diff.disappeared)));
    }
    lines
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn join_keys(keys: &[BiomarkerKey]) -> String {
    keys.iter()
        .map(BiomarkerKey::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn keys_cell(keys: &[BiomarkerKey], color: Color) -> Cell {
    if keys.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(join_keys(keys)).fg(color)
    }
}

fn optional_keys_cell(keys: Option<&[BiomarkerKey]>) -> Cell {
    match keys {
        Some(keys) => keys_cell(keys, Color::DarkYellow),
        None => dim_cell("-"),
    }
}

fn optional_cell(value: Option<&str>) -> Cell {
    match value {
        Some(value) if !value.is_empty() => Cell::new(value),
        _ => dim_cell("-"),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn trend_color(trend: Trend) -> Color {
    match trend {
        Trend::Better => Color::Green,
        Trend::Worse => Color::Red,
        Trend::Same => Color::DarkGrey,
    }
}

fn trend_cell(trend: Trend) -> Cell {
    Cell::new(trend).fg(trend_color(trend))
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
