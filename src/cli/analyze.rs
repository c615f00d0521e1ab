//! Analyze command - one-shot compliance scan

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;

use crate::config;
use crate::engine::AnalysisEngine;
use crate::fetch::{normalize_target, HttpFetcher};
use crate::models::{Analysis, Category};

/// Run the analyze command
pub async fn run(
    url: &str,
    categories: &[Category],
    json: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load(config_path)?;
    let target = normalize_target(url)?;
    let selected = select_categories(categories);

    let fetcher = HttpFetcher::new(config.fetch.timeout(), &config.fetch.user_agent)?;
    let engine = AnalysisEngine::new(Arc::new(fetcher), config.rule_weights.clone());
    let analysis = engine
        .analyze(&target, &selected)
        .await
        .with_context(|| format!("analysis of {target} failed"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        render_text(&analysis);
    }
    Ok(())
}

/// Dedupe while keeping the requested order; empty means all
fn select_categories(requested: &[Category]) -> Vec<Category> {
    if requested.is_empty() {
        return Category::ALL.to_vec();
    }
    let mut selected = Vec::new();
    for &category in requested {
        if !selected.contains(&category) {
            selected.push(category);
        }
    }
    selected
}

fn render_text(analysis: &Analysis) {
    println!();
    println!(
        "Sitegrade Report for {}",
        style(&analysis.page.final_url).cyan()
    );
    println!(
        "  Overall: {} ({}) - {}",
        style(format!("{}/100", analysis.overall_score)).bold(),
        analysis.overall_grade,
        analysis.status
    );
    println!(
        "  Status {}, {}ms, {}, {}",
        analysis.page.status,
        analysis.page.load_time_ms,
        format_bytes(analysis.page.page_size_bytes),
        if analysis.page.https {
            style("https").green()
        } else {
            style("http").red()
        }
    );
    println!();

    for report in &analysis.categories {
        let score = match report.score {
            s if s >= 80 => style(format!("{s:>3}")).green(),
            s if s >= 50 => style(format!("{s:>3}")).yellow(),
            s => style(format!("{s:>3}")).red(),
        };
        println!(
            "  {:<14} {}/100  {}",
            report.category.to_string(),
            score,
            style(&report.grade).dim()
        );
        for issue in &report.issues {
            println!("      {} {}", style("!").red(), issue);
        }
    }

    if !analysis.priority_issues.is_empty() {
        println!();
        println!("  {}", style("Priority issues").bold());
        for issue in &analysis.priority_issues {
            println!("    {} {}", style(">").red(), issue);
        }
    }

    if !analysis.recommendations.is_empty() {
        println!();
        println!("  {}", style("Recommendations").bold());
        for recommendation in &analysis.recommendations {
            println!("    - {recommendation}");
        }
    }

    let fp = &analysis.fingerprint;
    if fp.hosting != "Unknown" || !fp.frameworks.is_empty() || !fp.cms.is_empty() {
        println!();
        println!("  {}", style("Detected stack").bold());
        println!("    Hosting: {}", fp.hosting);
        for group in [&fp.frameworks, &fp.cms, &fp.technologies] {
            for name in group {
                println!("    {name}");
            }
        }
    }
    println!();
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection_means_full_scan() {
        assert_eq!(select_categories(&[]), Category::ALL.to_vec());
    }

    #[test]
    fn selection_dedupes_in_order() {
        let picked = select_categories(&[Category::Seo, Category::Gdpr, Category::Seo]);
        assert_eq!(picked, vec![Category::Seo, Category::Gdpr]);
    }

    #[test]
    fn byte_formatting() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
