// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search commands and their argument parsing.

use std::str::FromStr;

use clap::Args;
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tsundoku_core::{
    AuthCredentials, FilterOption, FilterValue, SearchRequest, SearchResult, SortDirection,
    SortOption, SourceId, SystemError, TsundokuError,
};
use tsundoku_registry::SourceRegistry;
use tsundoku_search::SearchExecutor;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Source to search.
    pub source_id: i64,

    /// Search text. May be empty.
    #[arg(default_value = "")]
    pub query: String,

    /// Page to fetch, starting at 1.
    #[arg(long)]
    pub page: Option<u32>,

    /// Results per page.
    #[arg(long)]
    pub limit: Option<u32>,

    /// Sort key, e.g. `relevance`, `latest`, `updatedAt`.
    #[arg(long)]
    pub sort: Option<SortOption>,

    /// `asc` or `desc`.
    #[arg(long)]
    pub direction: Option<SortDirection>,

    /// Filter as `key=value`. Repeatable. Comma-separated values become a list.
    #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
    pub filters: Vec<(FilterOption, FilterValue)>,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl SearchArgs {
    fn request(&self) -> SearchRequest {
        let mut request = SearchRequest::new(self.query.clone());
        if let Some(page) = self.page {
            request.page = page;
        }
        if let Some(limit) = self.limit {
            request.limit = limit;
        }
        if let Some(sort) = self.sort {
            request.sort = sort;
        }
        if let Some(direction) = self.direction {
            request.direction = direction;
        }
        request.filters = self.filters.iter().cloned().collect();
        request
    }
}

#[derive(Args, Debug)]
pub struct PresetArgs {
    /// Preset to run, as shown by `tsundoku show`.
    pub preset_id: i64,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Credentials as JSON, e.g. `{"type":"bearer","token":"..."}`.
    #[arg(long, value_name = "JSON", value_parser = parse_credentials)]
    pub credentials: Option<AuthCredentials>,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Parse a `key=value` filter argument.
///
/// `true`/`false` become flags, integers become numbers, values containing a
/// comma become lists, anything else is text.
pub fn parse_filter(arg: &str) -> Result<(FilterOption, FilterValue), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{arg}`"))?;
    let filter = FilterOption::from_str(key.trim()).map_err(|_| format!("unknown filter `{key}`"))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("filter `{key}` has no value"));
    }
    Ok((filter, parse_filter_value(value)))
}

fn parse_filter_value(value: &str) -> FilterValue {
    match value {
        "true" => FilterValue::Flag(true),
        "false" => FilterValue::Flag(false),
        _ => {
            if let Ok(number) = value.parse::<i64>() {
                FilterValue::Number(number)
            } else if value.contains(',') {
                FilterValue::List(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|item| !item.is_empty())
                        .map(String::from)
                        .collect(),
                )
            } else {
                FilterValue::Text(value.to_string())
            }
        }
    }
}

fn parse_credentials(arg: &str) -> Result<AuthCredentials, String> {
    serde_json::from_str(arg).map_err(|e| format!("invalid credentials: {e}"))
}

pub async fn search(
    registry: &SourceRegistry,
    args: SearchArgs,
    cancel: &CancellationToken,
) -> Result<(), TsundokuError> {
    let executor = SearchExecutor::from_registry(registry);
    let request = args.request();
    let result = executor
        .search(
            SourceId(args.source_id),
            &request,
            args.output.credentials.as_ref(),
            cancel,
        )
        .await?;
    print_result(&result, args.output.json)
}

pub async fn run_preset(
    registry: &SourceRegistry,
    args: PresetArgs,
    cancel: &CancellationToken,
) -> Result<(), TsundokuError> {
    let executor = SearchExecutor::from_registry(registry);
    let result = executor
        .run_preset(args.preset_id, args.output.credentials.as_ref(), cancel)
        .await?;
    print_result(&result, args.output.json)
}

/// Print a source's details, capabilities, and presets.
pub async fn show(registry: &SourceRegistry, id: SourceId) -> Result<(), TsundokuError> {
    let source = registry.source(id).await?;
    let capabilities = registry
        .capabilities()
        .capabilities_for(id)
        .await?
        .ok_or(SystemError::MissingCapability { source_id: id.0 })?;
    let presets = registry.presets_for(id).await?;

    println!("{} ({})", source.name.bold(), source.slug);
    println!("  url:       {}{}", source.url, source.search_path);
    println!("  languages: {}", source.languages.join(", "));
    println!("  auth:      {}{}", source.auth.kind, if source.auth.required { " (required)" } else { "" });

    let sorts: Vec<String> = capabilities.supported_sorts.iter().map(ToString::to_string).collect();
    let filters: Vec<String> = capabilities
        .supported_filters
        .iter()
        .map(ToString::to_string)
        .collect();
    println!(
        "  sorts:     {}",
        if sorts.is_empty() { "relevance".to_string() } else { sorts.join(", ") }
    );
    println!(
        "  filters:   {}",
        if filters.is_empty() { "none".to_string() } else { filters.join(", ") }
    );
    if !capabilities.tags.is_empty() {
        println!("  tags:      {}", capabilities.tags.len());
    }

    if presets.is_empty() {
        return Ok(());
    }
    println!("  presets:");
    for preset in &presets {
        let description = preset
            .description
            .as_deref()
            .map(|d| format!("  {}", d.dimmed()))
            .unwrap_or_default();
        println!("    {:>4}  {}{description}", preset.id, preset.name);
    }
    Ok(())
}

fn print_result(result: &SearchResult, json: bool) -> Result<(), TsundokuError> {
    if json {
        let rendered = serde_json::to_string_pretty(result).map_err(|e| SystemError::Invariant {
            message: format!("search result could not be serialized: {e}"),
        })?;
        println!("{rendered}");
        return Ok(());
    }
    if result.entries.is_empty() {
        println!("no results");
    }
    for entry in &result.entries {
        println!("  {}  {}", entry.title.bold(), entry.slug.dimmed());
    }
    let more = if result.has_more { ", more available" } else { "" };
    println!("{}", format!("page {}{more}", result.current_page).dimmed());
    Ok(())
}
