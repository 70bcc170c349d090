//! Output formatting utilities for plctl

use crate::cli::OutputFormat;
use colored::*;
use promptloom_core::errors::CoreError;
use promptloom_core::eval::{CaseOutcome, EvaluationReport};
use promptloom_core::types::{Template, TemplatePage, TemplateStatistics};
use tabled::{Table, Tabled};

/// Display one page of a template listing
pub fn display_template_page(page: &TemplatePage, format: &OutputFormat) -> Result<(), CoreError> {
    match format {
        OutputFormat::Table => {
            if page.templates.is_empty() {
                println!("No templates found");
                return Ok(());
            }

            let table_data: Vec<TemplateTableRow> = page
                .templates
                .iter()
                .map(|t| TemplateTableRow {
                    id: t.id.clone(),
                    name: t.name.clone(),
                    language: t.language.clone(),
                    version: t.version.clone(),
                    default: if t.is_default() { "yes" } else { "-" }.to_string(),
                    tags: t.tags.join(","),
                    updated: t.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                })
                .collect();

            let table = Table::new(table_data);
            println!("{}", table);
            println!(
                "Page {} (page size {}), {} total match(es)",
                page.page, page.page_size, page.total
            );
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(page)?;
            println!("{}", json);
        }
        OutputFormat::Csv => {
            println!("id,name,language,version,default,tags,updated");
            for t in &page.templates {
                println!(
                    "{},{},{},{},{},{},{}",
                    t.id,
                    escape_csv(&t.name),
                    t.language,
                    t.version,
                    t.is_default(),
                    escape_csv(&t.tags.join(";")),
                    t.updated_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
    }
    Ok(())
}

/// Display detailed information about a single template
pub fn display_template_details(template: &Template, format: &OutputFormat) -> Result<(), CoreError> {
    match format {
        OutputFormat::Table => {
            println!("{}", "Template Details".bold().blue());
            println!("{:<15} {}", "ID:".bold(), template.id);
            println!("{:<15} {}", "Name:".bold(), template.name);
            println!("{:<15} {}", "Description:".bold(), template.description);
            println!("{:<15} {}", "Language:".bold(), template.language);
            println!("{:<15} {}", "Version:".bold(), template.version);
            println!(
                "{:<15} {}",
                "Default:".bold(),
                if template.is_default() { "yes".green().to_string() } else { "no".to_string() }
            );
            println!("{:<15} {}", "Tags:".bold(), template.tags.join(", "));
            println!(
                "{:<15} {}",
                "Created:".bold(),
                template.created_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!(
                "{:<15} {}",
                "Updated:".bold(),
                template.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
            );

            if !template.metadata.is_empty() {
                println!(
                    "{:<15} {}",
                    "Metadata:".bold(),
                    serde_json::to_string_pretty(&template.metadata)
                        .unwrap_or_else(|_| "{}".to_string())
                );
            }

            println!("{}", "Content:".bold());
            println!("{}", template.content);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(template)?;
            println!("{}", json);
        }
        OutputFormat::Csv => {
            println!("field,value");
            println!("id,{}", template.id);
            println!("name,{}", escape_csv(&template.name));
            println!("description,{}", escape_csv(&template.description));
            println!("language,{}", template.language);
            println!("version,{}", template.version);
            println!("default,{}", template.is_default());
            println!("tags,{}", escape_csv(&template.tags.join(";")));
            println!("created,{}", template.created_at.format("%Y-%m-%d %H:%M:%S"));
            println!("updated,{}", template.updated_at.format("%Y-%m-%d %H:%M:%S"));
        }
    }
    Ok(())
}

/// Display store statistics
pub fn display_statistics(stats: &TemplateStatistics, format: &OutputFormat) -> Result<(), CoreError> {
    match format {
        OutputFormat::Table => {
            println!("{}", "Template Store Statistics".bold().blue());
            println!("{:<25} {}", "Total templates:".bold(), stats.total_templates);
            println!(
                "{:<25} {}",
                "Languages with default:".bold(),
                stats.default_templates
            );
            println!(
                "{:<25} {}",
                "Created last 7 days:".bold(),
                stats.recent_created
            );
            println!(
                "{:<25} {}",
                "Updated last 7 days:".bold(),
                stats.recent_updated
            );

            if !stats.languages.is_empty() {
                let rows: Vec<LanguageTableRow> = stats
                    .languages
                    .iter()
                    .map(|(language, counts)| LanguageTableRow {
                        language: language.clone(),
                        total: counts.total,
                        defaults: counts.defaults,
                    })
                    .collect();
                println!("{}", Table::new(rows));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(stats)?;
            println!("{}", json);
        }
        OutputFormat::Csv => {
            println!("language,total,defaults");
            for (language, counts) in &stats.languages {
                println!("{},{},{}", language, counts.total, counts.defaults);
            }
        }
    }
    Ok(())
}

/// Display an evaluation report
pub fn display_report(report: &EvaluationReport, format: &OutputFormat) -> Result<(), CoreError> {
    match format {
        OutputFormat::Table => {
            if !report.cases.is_empty() {
                println!("{}", "Test Cases:".bold().blue());
                let rows: Vec<CaseTableRow> = report
                    .cases
                    .iter()
                    .map(|case| {
                        let (status, detail) = match &case.outcome {
                            CaseOutcome::Extracted(result) => (
                                "ok".green().to_string(),
                                format!(
                                    "{} nodes, {} relationships",
                                    result.nodes.len(),
                                    result.relationships.len()
                                ),
                            ),
                            CaseOutcome::Failed { error } => {
                                ("failed".red().to_string(), error.clone())
                            }
                        };
                        CaseTableRow {
                            index: case.test_index,
                            text: case.text.clone(),
                            status,
                            detail,
                            scores: case
                                .scores
                                .iter()
                                .map(|(metric, score)| format!("{}={:.2}", metric, score))
                                .collect::<Vec<_>>()
                                .join(" "),
                        }
                    })
                    .collect();
                println!("{}", Table::new(rows));
                println!();
            }

            println!("{}", "Averages:".bold().blue());
            for (metric, average) in &report.averages {
                println!("{:<15} {}", format!("{}:", metric).bold(), format_score(*average));
            }
            println!();
            println!("{}", report.summary);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report)?;
            println!("{}", json);
        }
        OutputFormat::Csv => {
            println!("test_index,text,status,{}", metric_header(report));
            for case in &report.cases {
                let status = if case.is_success() { "ok" } else { "failed" };
                let scores = case
                    .scores
                    .values()
                    .map(|score| format!("{:.2}", score))
                    .collect::<Vec<_>>()
                    .join(",");
                println!(
                    "{},{},{},{}",
                    case.test_index,
                    escape_csv(&case.text),
                    status,
                    scores
                );
            }
        }
    }
    Ok(())
}

fn metric_header(report: &EvaluationReport) -> String {
    report
        .averages
        .keys()
        .map(|metric| metric.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Format a unit-interval score with color
fn format_score(score: f64) -> String {
    let text = format!("{:.2}", score);
    if score >= 0.8 {
        text.green().to_string()
    } else if score >= 0.6 {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}

/// Escape CSV values
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Table row for template listings
#[derive(Tabled)]
struct TemplateTableRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Language")]
    language: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Default")]
    default: String,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

/// Table row for per-language statistics
#[derive(Tabled)]
struct LanguageTableRow {
    #[tabled(rename = "Language")]
    language: String,
    #[tabled(rename = "Templates")]
    total: usize,
    #[tabled(rename = "Defaults")]
    defaults: usize,
}

/// Table row for evaluation cases
#[derive(Tabled)]
struct CaseTableRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Text")]
    text: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    detail: String,
    #[tabled(rename = "Scores")]
    scores: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("with\nnewline"), "\"with\nnewline\"");
    }

    #[test]
    fn test_format_score_precision() {
        // strip color codes by checking the contained digits
        assert!(format_score(0.5).contains("0.50"));
        assert!(format_score(0.0).contains("0.00"));
        assert!(format_score(1.0).contains("1.00"));
    }
}
