//! CLI presentation: text and json formatters per command.

use crate::error::PageTypeError;
use crate::hooks::SearchText;
use crate::page::Page;
use crate::page_type::PageType;
use crate::request::{DispatchOutcome, RequestContext};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;
use std::sync::Arc;

fn to_json(value: &serde_json::Value) -> Result<String, PageTypeError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| PageTypeError::Storage(crate::error::StorageError::Serialization(e)))
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

pub fn format_types(types: &[Arc<PageType>], format: &str) -> Result<String, PageTypeError> {
    if format == "json" {
        let arr: Vec<serde_json::Value> = types
            .iter()
            .map(|t| {
                json!({
                    "name": t.name(),
                    "label": t.label(),
                    "pluralLabel": t.plural_label(),
                    "action": t.action(),
                    "fields": t.schema().iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
                    "greedy": t.is_greedy(),
                    "orphan": t.is_orphan(),
                })
            })
            .collect();
        return to_json(&serde_json::Value::Array(arr));
    }

    if types.is_empty() {
        return Ok("No page types configured.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Name", "Label", "Action", "Fields", "Greedy"]);
    for t in types {
        table.add_row(vec![
            t.name().to_string(),
            t.label().to_string(),
            t.action().to_string(),
            t.schema().len().to_string(),
            if t.is_greedy() { "yes" } else { "no" }.to_string(),
        ]);
    }
    Ok(table.to_string())
}

pub fn format_pages(pages: &[Page], format: &str) -> Result<String, PageTypeError> {
    if format == "json" {
        let arr: Vec<serde_json::Value> = pages.iter().map(Page::to_document).collect();
        return to_json(&serde_json::Value::Array(arr));
    }

    if pages.is_empty() {
        return Ok("No pages.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Title", "Slug", "Level", "Rank", "Updated"]);
    for page in pages {
        table.add_row(vec![
            page.title.clone(),
            or_dash(page.slug.as_deref()),
            page.level.map(|l| l.to_string()).unwrap_or_else(|| "-".to_string()),
            page.rank.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string()),
            page.updated_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    Ok(table.to_string())
}

pub fn format_created(page: &Page) -> String {
    format!(
        "{} {} at {} (level {}, rank {})",
        "Created".green().bold(),
        page.title,
        or_dash(page.slug.as_deref()),
        page.level.unwrap_or(0),
        page.rank.unwrap_or(0)
    )
}

pub fn format_outcome(ctx: &RequestContext, format: &str) -> Result<String, PageTypeError> {
    if format == "json" {
        return to_json(&json!({
            "path": ctx.path,
            "page": ctx.page.as_ref().and_then(|p| p.slug.clone()),
            "bestPage": ctx.best_page.as_ref().and_then(|p| p.slug.clone()),
            "remainder": ctx.remainder,
            "outcome": ctx.outcome,
            "contextMenu": ctx.context_menu,
        }));
    }

    let outcome = match &ctx.outcome {
        Some(DispatchOutcome::Render { template }) => {
            format!("{} {}", "render".green().bold(), template)
        }
        Some(DispatchOutcome::Redirect { location }) => {
            format!("{} {}", "redirect".yellow().bold(), location)
        }
        Some(DispatchOutcome::NotFound) | None => format!("{}", "not found".red().bold()),
    };

    let mut lines = vec![
        format!("{}: {}", "Path".bold(), ctx.path),
        format!("{}: {}", "Outcome".bold(), outcome),
    ];
    if let Some(best) = &ctx.best_page {
        lines.push(format!(
            "{}: {} ({})",
            "Page".bold(),
            or_dash(best.slug.as_deref()),
            best.page_type
        ));
    }
    if !ctx.remainder.is_empty() {
        lines.push(format!("{}: {}", "Remainder".bold(), ctx.remainder));
    }
    if let Some(menu) = &ctx.context_menu {
        let labels: Vec<&str> = menu.iter().map(|m| m.label.as_str()).collect();
        lines.push(format!("{}: {}", "Menu".bold(), labels.join(", ")));
    }
    Ok(lines.join("\n"))
}

pub fn format_search_texts(texts: &[SearchText]) -> String {
    if texts.is_empty() {
        return "No search texts.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Weight", "Strong", "Silent", "Text"]);
    for text in texts {
        table.add_row(vec![
            text.weight.to_string(),
            if text.is_strong() { "yes" } else { "no" }.to_string(),
            if text.silent { "yes" } else { "no" }.to_string(),
            text.text.clone(),
        ]);
    }
    table.to_string()
}

pub fn format_diff_lines(lines: &[String]) -> String {
    if lines.is_empty() {
        "No type-specific diff lines.".to_string()
    } else {
        lines.join("\n")
    }
}
