use std::collections::BTreeMap;

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::models::{ClassificationResult, LicenseType, Provenance, Report};

/// Render a colored terminal report.
///
/// Packages whose type is in `disallowed` are always listed; the rest only
/// with `verbose`. `quiet` prints the summary line alone.
pub fn render(report: &Report, disallowed: &[LicenseType], verbose: bool, quiet: bool) {
    let total = report.results.len();
    let violations = report.matching(disallowed).count();

    if quiet {
        println!(
            "Total: {}  Severity: {}  Disallowed: {}",
            total,
            colorize(report.severity, &report.severity.to_string()),
            if violations == 0 {
                violations.to_string().green()
            } else {
                violations.to_string().red()
            },
        );
        return;
    }

    println!(
        "\n {} v{}\n",
        "license-walk".bold(),
        env!("CARGO_PKG_VERSION")
    );

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<49} │", "SUMMARY".bold());
    println!(" │  {:<49} │", format!("Total packages   : {}", total));
    println!(
        " │  {:<49} │",
        format!("Overall severity : {}", colorize(report.severity, &report.severity.to_string()))
    );
    for (license_type, count) in count_by_type(&report.results).iter().rev() {
        println!(
            " │  {:<49} │",
            format!("  {:<14} : {:>4}", license_type.to_string(), count)
        );
    }
    if report.partial {
        println!(" │  {:<49} │", "Deadline reached: report is partial".yellow());
    }
    println!(" └────────────────────────────────────────────────────┘\n");

    if violations > 0 {
        println!(" {} Disallowed licenses:\n", "[ERROR]".red().bold());
        render_table(report.matching(disallowed));
        println!();
    }

    let unresolved: Vec<&ClassificationResult> = report
        .results
        .iter()
        .filter(|r| r.provenance == Provenance::Unresolved)
        .collect();
    if !unresolved.is_empty() {
        println!(" {} Packages that could not be resolved:\n", "[WARN]".yellow().bold());
        render_table(unresolved.into_iter());
        println!();
    }

    if verbose {
        println!(" {} All packages:\n", "[INFO]".cyan().bold());
        render_table(report.results.iter());
        println!();
    }
}

fn render_table<'a>(results: impl Iterator<Item = &'a ClassificationResult>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("License").add_attribute(Attribute::Bold),
            Cell::new("Type").add_attribute(Attribute::Bold),
            Cell::new("Confidence").add_attribute(Attribute::Bold),
            Cell::new("Source").add_attribute(Attribute::Bold),
        ]);

    for result in results {
        let license = match (&result.template, &result.error) {
            (Some(name), _) => name.clone(),
            (None, Some(error)) => error.clone(),
            (None, None) => "unknown".to_string(),
        };
        let confidence = match result.provenance {
            Provenance::Classified => format!("{:.2}", result.confidence),
            Provenance::Override | Provenance::Unresolved => "-".to_string(),
        };

        table.add_row(vec![
            Cell::new(&result.package),
            Cell::new(license),
            Cell::new(result.license_type.to_string()).fg(type_color(result.license_type)),
            Cell::new(confidence).set_alignment(CellAlignment::Right),
            Cell::new(result.provenance.to_string()),
        ]);
    }

    println!("{}", table);
}

fn type_color(license_type: LicenseType) -> Color {
    match license_type {
        LicenseType::Forbidden => Color::Red,
        LicenseType::Restricted => Color::Magenta,
        LicenseType::Reciprocal => Color::Yellow,
        LicenseType::Notice | LicenseType::Permissive | LicenseType::Unencumbered => Color::Green,
        LicenseType::Unknown => Color::DarkGrey,
    }
}

fn colorize(license_type: LicenseType, text: &str) -> ColoredString {
    match license_type {
        LicenseType::Forbidden => text.red().bold(),
        LicenseType::Restricted => text.magenta(),
        LicenseType::Reciprocal => text.yellow(),
        LicenseType::Notice | LicenseType::Permissive | LicenseType::Unencumbered => text.green(),
        LicenseType::Unknown => text.dimmed(),
    }
}

/// Result count per license type, ordered by severity.
fn count_by_type(results: &[ClassificationResult]) -> BTreeMap<LicenseType, usize> {
    let mut counts = BTreeMap::new();
    for result in results {
        *counts.entry(result.license_type).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(license_type: LicenseType) -> ClassificationResult {
        ClassificationResult {
            package: "p".to_string(),
            license_file: None,
            template: None,
            license_type,
            confidence: 0.0,
            provenance: Provenance::Classified,
            error: None,
        }
    }

    #[test]
    fn test_count_by_type_is_severity_ordered() {
        let counts = count_by_type(&[
            result(LicenseType::Forbidden),
            result(LicenseType::Notice),
            result(LicenseType::Notice),
            result(LicenseType::Unknown),
        ]);
        let ordered: Vec<(LicenseType, usize)> = counts.into_iter().collect();
        assert_eq!(
            ordered,
            vec![
                (LicenseType::Unknown, 1),
                (LicenseType::Notice, 2),
                (LicenseType::Forbidden, 1),
            ]
        );
    }
}
