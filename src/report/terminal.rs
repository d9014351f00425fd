use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use pkgsec::analysis::{AnalysisRequest, Request, Type, TypeComponents};
use pkgsec::error::RequestError;
use pkgsec::{Severity, Verdict, Verdicts};

fn header(cells: &[&str]) -> Vec<Cell> {
    cells
        .iter()
        .map(|c| Cell::new(c).add_attribute(Attribute::Bold))
        .collect()
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn banner(subject: &str) {
    println!("\n {} v{}", "pkgsec".bold(), env!("CARGO_PKG_VERSION"));
    println!(" {}\n", subject);
}

/// Render a verdict list with a severity summary.
pub fn render_verdicts(verdicts: &Verdicts, source: &Path, verbose: bool, quiet: bool) -> Result<()> {
    let total = verdicts.len();
    let high = verdicts.count(Severity::High);
    let medium = verdicts.count(Severity::Medium);
    let low = verdicts.count(Severity::Low);

    if quiet {
        println!(
            "Total: {}  High: {}  Medium: {}  Low: {}",
            total,
            high.to_string().red(),
            medium.to_string().yellow(),
            low.to_string().green(),
        );
        return Ok(());
    }

    banner(&format!("Verdicts: {}", source.display()));

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Total verdicts : {}", total));
    println!(
        " │  {:<48} │",
        format!("{}  High        : {:>4}  {}", "✗".red(), high, summarize_categories(verdicts, Severity::High))
    );
    println!(
        " │  {:<48} │",
        format!("{}  Medium      : {:>4}  {}", "⚠".yellow(), medium, summarize_categories(verdicts, Severity::Medium))
    );
    println!(
        " │  {:<48} │",
        format!("{}  Low         : {:>4}  {}", "✓".green(), low, summarize_categories(verdicts, Severity::Low))
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    if high > 0 {
        println!(" {} Verdicts requiring attention:\n", "[HIGH]".red().bold());
        render_verdict_table(verdicts, Severity::High);
        println!();
    }

    if medium > 0 {
        println!(" {} Suspicious behaviour:\n", "[MEDIUM]".yellow().bold());
        render_verdict_table(verdicts, Severity::Medium);
        println!();
    }

    if verbose && low > 0 {
        println!(" {} Informational:\n", "[LOW]".green().bold());
        render_verdict_table(verdicts, Severity::Low);
        println!();
    }

    Ok(())
}

fn render_verdict_table(verdicts: &Verdicts, severity: Severity) {
    let now = Utc::now();
    let mut table = new_table();
    table.set_header(header(&["Package", "Code", "Categories", "File", "Message", "Severity"]));

    for verdict in verdicts.iter().filter(|v| v.severity == severity) {
        let mut severity_cell = Cell::new(severity_label(verdict.severity))
            .fg(severity_color(verdict.severity))
            .set_alignment(CellAlignment::Center);
        if verdict.is_expired(now) {
            severity_cell = Cell::new(format!("{} (expired)", severity_label(verdict.severity))).fg(Color::DarkGrey);
        }

        table.add_row(vec![
            Cell::new(package_label(verdict)),
            Cell::new(&verdict.code),
            Cell::new(
                verdict
                    .categories
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Cell::new(&verdict.file),
            Cell::new(&verdict.message),
            severity_cell,
        ]);
    }

    println!("{}", table);
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "✗ high",
        Severity::Medium => "⚠ medium",
        Severity::Low => "✓ low",
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::High => Color::Red,
        Severity::Medium => Color::Yellow,
        Severity::Low => Color::Green,
    }
}

fn package_label(verdict: &Verdict) -> String {
    if verdict.version.is_empty() {
        format!("{}:{}", verdict.ecosystem, verdict.pkg)
    } else {
        format!("{}:{}@{}", verdict.ecosystem, verdict.pkg, verdict.version)
    }
}

/// Up to three most frequent categories at `severity`, e.g. `[network (2), malware (1)]`.
fn summarize_categories(verdicts: &Verdicts, severity: Severity) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for verdict in verdicts.iter().filter(|v| v.severity == severity) {
        for category in &verdict.categories {
            *counts.entry(category.as_str()).or_insert(0) += 1;
        }
    }

    let mut pairs: Vec<(&str, usize)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let summary: Vec<String> = pairs
        .iter()
        .take(3)
        .map(|(category, count)| format!("{} ({})", category, count))
        .collect();

    if summary.is_empty() {
        String::new()
    } else {
        format!("[{}]", summary.join(", "))
    }
}

/// Render the registered type table.
pub fn render_types(types: &[Type]) -> Result<()> {
    let mut table = new_table();
    table.set_header(header(&["Name", "URN", "Ecosystem", "Result file", "Enricher"]));

    for kind in types {
        let components = kind.components()?;
        let ecosystem = components
            .ecosystem
            .map(|e| e.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(kind.name()).add_attribute(Attribute::Bold),
            Cell::new(kind.to_urn()?.to_string()),
            Cell::new(ecosystem),
            Cell::new(components.filename()),
            Cell::new(if components.is_enricher() { "yes" } else { "" }).set_alignment(CellAlignment::Center),
        ]);
    }

    println!("{}", table);
    Ok(())
}

/// Render the parsed form of a type name.
pub fn render_components(input: &str, components: &TypeComponents, registered: Option<Type>) -> Result<()> {
    let mut table = new_table();
    table.set_header(header(&["Field", "Value"]));

    let mut level = Some(components);
    let mut depth = 0;
    while let Some(current) = level {
        let prefix = "parent.".repeat(depth);
        table.add_row(vec![Cell::new(format!("{}framework", prefix)), Cell::new(&current.framework)]);
        table.add_row(vec![Cell::new(format!("{}collector", prefix)), Cell::new(&current.collector)]);
        table.add_row(vec![
            Cell::new(format!("{}actions", prefix)),
            Cell::new(current.actions().collect::<Vec<_>>().join(", ")),
        ]);
        table.add_row(vec![
            Cell::new(format!("{}ecosystem", prefix)),
            Cell::new(current.ecosystem.map(|e| e.to_string()).unwrap_or_default()),
        ]);
        table.add_row(vec![
            Cell::new(format!("{}format", prefix)),
            Cell::new(current.format.as_deref().unwrap_or("")),
        ]);
        table.add_row(vec![Cell::new(format!("{}result file", prefix)), Cell::new(current.filename())]);
        level = current.parent.as_deref();
        depth += 1;
    }

    let urn = components.to_urn()?;
    println!("\n {} {}\n", "URN".bold(), urn);
    if input != urn.to_string() {
        println!(" {} {}\n", "input".dimmed(), input);
    }
    println!("{}", table);
    match registered {
        Some(kind) => println!(" {} registered as {}", "✓".green(), kind.name().bold()),
        None => println!(" {} not a registered analysis type", "⚠".yellow()),
    }
    Ok(())
}

/// Render the outcome of building a batch of requests.
pub fn render_requests(results: &[Result<Request, RequestError>], quiet: bool) -> Result<()> {
    let built = results.iter().filter(|r| r.is_ok()).count();
    let failed = results.len() - built;

    if quiet {
        println!(
            "Total: {}  Built: {}  Failed: {}",
            results.len(),
            built.to_string().green(),
            failed.to_string().red(),
        );
        return Ok(());
    }

    let mut table = new_table();
    table.set_header(header(&["#", "Request", "Result path", "Status"]));

    for (index, result) in results.iter().enumerate() {
        let row = match result {
            Ok(request) => {
                let path = request
                    .results_path()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|e| e.to_string());
                vec![
                    Cell::new(index + 1),
                    Cell::new(request.to_string()),
                    Cell::new(path),
                    Cell::new("✓ ok").fg(Color::Green).set_alignment(CellAlignment::Center),
                ]
            }
            Err(e) => vec![
                Cell::new(index + 1),
                Cell::new(e.to_string()).fg(Color::Red),
                Cell::new(""),
                Cell::new("✗ error").fg(Color::Red).set_alignment(CellAlignment::Center),
            ],
        };
        table.add_row(row);
    }

    println!("{}", table);
    println!(
        "\n {} built, {} failed",
        built.to_string().green().bold(),
        failed.to_string().red().bold()
    );
    Ok(())
}
