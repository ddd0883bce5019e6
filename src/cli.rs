//! Command-line entry points: serve the HTTP surface or query the catalog
//! directly from a terminal.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use crate::catalog::{self, Capability, Catalog};
use crate::compare::{self, CompareError, CompareSelection, Metric};
use crate::config::AppConfig;
use crate::derive::{self, SortKey, HOME_PAGE, SEARCH_PAGE};
use crate::i18n::Locale;
use crate::page_url::PageUrl;
use crate::state::AppState;
use crate::view_state::{ViewSettings, ViewState};
use crate::{logging, server};

#[derive(Parser, Debug)]
#[command(name = "agentstore", version)]
#[command(about = "AgentStore catalog engine: search, rank and compare AI agent plugins")]
#[command(
    after_help = "Environment:\n  AGENTSTORE_API_URL    User-data backend base URL\n  AGENTSTORE_DATA_PATH  Capability dataset file\n  AGENTSTORE_BIND       HTTP listen address\n  AGENTSTORE_LOCALE     zh or en\n  RUST_LOG              Log filter (default: info)"
)]
pub struct Cli {
    /// Config file (default: <config dir>/agentstore/config.json)
    #[arg(long, global = true, env = "AGENTSTORE_CONFIG")]
    pub config: Option<PathBuf>,
    /// Capability dataset, overriding config and environment
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,
    /// Label language
    #[arg(long, global = true)]
    pub lang: Option<Locale>,
    /// Print results as JSON
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,
    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    pub log_json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Listen address, e.g. 127.0.0.1:3000
        #[arg(long)]
        bind: Option<String>,
    },
    /// Search the catalog
    Search {
        /// Free-text query; may be empty with --home
        #[arg(default_value = "")]
        query: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = SortKey::Score)]
        sort: SortKey,
        #[arg(long)]
        limit: Option<usize>,
        /// Use the home page's browse scope (matches category too)
        #[arg(long, default_value_t = false)]
        home: bool,
    },
    /// Category, score and language distributions
    Stats,
    /// Compare up to four capabilities
    Compare {
        #[arg(required = true)]
        slugs: Vec<String>,
    },
    /// Capabilities similar to one slug
    Similar {
        slug: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Show the effective configuration
    Config {
        /// Write it back to the config file
        #[arg(long, default_value_t = false)]
        write: bool,
    },
}

/// Effective configuration: file, then environment, then flags.
fn resolve_config(cli: &Cli) -> AppConfig {
    let mut config = AppConfig::load(cli.config.as_deref());
    if let Some(data) = &cli.data {
        config.data_path = Some(data.clone());
    }
    if let Some(lang) = cli.lang {
        config.locale = lang;
    }
    if cli.log_json {
        config.log_json = true;
    }
    if let Command::Serve { bind: Some(bind) } = &cli.command {
        config.bind = bind.clone();
    }
    config
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli);
    logging::init(config.log_json);

    if let Command::Config { write } = &cli.command {
        if *write {
            let path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
            config.save(&path).map_err(anyhow::Error::msg)?;
            tracing::info!(path = %path.display(), "config written");
        }
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let (catalog, _) = catalog::load(config.data_path.as_deref())
        .map_err(anyhow::Error::msg)
        .context("Failed to load capability dataset")?;
    let catalog = Arc::new(catalog);
    let locale = config.locale;

    match cli.command {
        Command::Serve { .. } => {
            let state = AppState::new(catalog, config).map_err(anyhow::Error::msg)?;
            server::serve(Arc::new(state)).await.map_err(anyhow::Error::msg)?;
        }
        Command::Search { query, category, sort, limit, home } => {
            let settings = ViewSettings {
                page_size: limit.unwrap_or(config.page_size).max(1),
                ..config.view_settings()
            };
            let view = search_view(&query, category.as_deref(), sort, home, settings)?;
            let scope = if home { HOME_PAGE } else { SEARCH_PAGE };
            let page = view.results(&catalog, scope);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&page.items)?);
            } else {
                print!("{}", render_list(&page.items, locale));
                println!("{} of {}", page.items.len(), page.total);
            }
        }
        Command::Stats => {
            let all = catalog.refs();
            if cli.json {
                let stats = serde_json::json!({
                    "summary": derive::catalog_summary(&all, derive::STATS_TOP_N),
                    "categories": derive::distribution_by_category(&all, locale),
                    "score_buckets": derive::distribution_by_score_bucket(&all),
                    "languages": derive::distribution_by_language(&all, 10),
                });
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print!("{}", render_stats(&all, locale));
            }
        }
        Command::Compare { slugs } => {
            let (selection, rejected) = compare_selection(&slugs);
            if !rejected.is_empty() {
                eprintln!("{} ({})", locale.compare_full_notice(compare::MAX_COMPARE), rejected.join(", "));
            }
            let items = compare::resolve(&catalog, &selection);
            if items.is_empty() {
                bail!("None of the given slugs exist in the catalog");
            }
            if cli.json {
                let body = serde_json::json!({
                    "items": items,
                    "winners": compare::winners(&items),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                print!("{}", render_compare(&items, locale));
            }
        }
        Command::Similar { slug, limit } => {
            let record = catalog
                .get(&slug)
                .with_context(|| format!("Capability \"{slug}\" not found"))?;
            let all = catalog.refs();
            let items = derive::similar_to(record, &all, limit);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                print!("{}", render_list(&items, locale));
            }
        }
        Command::Config { .. } => {}
    }
    Ok(())
}

/// The search as a page URL would carry it, so the CLI shares the view
/// pipeline with the pages.
fn search_view(
    query: &str,
    category: Option<&str>,
    sort: SortKey,
    home: bool,
    settings: ViewSettings,
) -> anyhow::Result<ViewState> {
    let mut url = PageUrl::parse(if home { "/" } else { "/search" }).map_err(anyhow::Error::msg)?;
    url.set_query(query);
    url.set_category(category);
    url.set_sort(sort);
    Ok(ViewState::new(url, settings))
}

/// Build a selection from command-line order. Slugs past the cap are
/// returned separately.
fn compare_selection(slugs: &[String]) -> (CompareSelection, Vec<String>) {
    let mut selection = CompareSelection::new();
    let mut rejected = Vec::new();
    for slug in slugs {
        if let Err(CompareError::Full { .. }) = selection.add(slug) {
            rejected.push(slug.clone());
        }
    }
    (selection, rejected)
}

fn render_list(items: &[&Capability], locale: Locale) -> String {
    let mut out = String::new();
    for c in items {
        let _ = writeln!(
            out,
            "{:>4.1}  {:<40} {} [{}]",
            c.overall_score,
            c.slug,
            c.name,
            locale.category_label(&c.category)
        );
    }
    out
}

fn render_stats(all: &[&Capability], locale: Locale) -> String {
    let mut out = String::new();
    let summary = derive::catalog_summary(all, derive::STATS_TOP_N);
    let _ = writeln!(out, "Total: {}", summary.total);
    let _ = writeln!(out, "Average score: {:.1}", summary.avg_score);
    let _ = writeln!(out, "Categories: {}", summary.category_count);
    let _ = writeln!(out, "With tests: {} ({}%)", summary.has_tests, summary.has_tests_percentage);
    let _ = writeln!(out, "\nCategories:");
    for share in derive::distribution_by_category(all, locale) {
        let _ = writeln!(out, "  {:<24} {:>5} {:>4}%", share.label, share.count, share.percentage);
    }
    let _ = writeln!(out, "\nScores:");
    for bucket in derive::distribution_by_score_bucket(all) {
        let _ = writeln!(out, "  {:<24} {:>5}", bucket.label, bucket.count);
    }
    let _ = writeln!(out, "\nLanguages:");
    for lang in derive::distribution_by_language(all, 10) {
        let _ = writeln!(out, "  {:<24} {:>5}", lang.language, lang.count);
    }
    let _ = writeln!(out, "\nTop scored:");
    for r in &summary.top_scored {
        let _ = writeln!(out, "  {:>4.1}  {}", r.score, r.slug);
    }
    let _ = writeln!(out, "\nRecently updated:");
    for r in &summary.recently_updated {
        let _ = writeln!(out, "  {:<24} {}", r.last_updated, r.slug);
    }
    out
}

fn metric_label(metric: Metric, locale: Locale) -> &'static str {
    match metric.dimension() {
        Some(dim) => locale.dimension_label(dim),
        None => locale.overall_label(),
    }
}

/// One row per metric, one column per item; row winners are starred.
fn render_compare(items: &[&Capability], locale: Locale) -> String {
    let mut out = String::new();
    let _ = write!(out, "{:<16}", "");
    for c in items {
        let _ = write!(out, "{:>24}", c.slug);
    }
    out.push('\n');
    for row in compare::winners(items) {
        let _ = write!(out, "{:<16}", metric_label(row.metric, locale));
        for (value, won) in row.values.iter().zip(&row.winners) {
            let cell = format!("{value:.1}{}", if *won { " *" } else { "  " });
            let _ = write!(out, "{cell:>24}");
        }
        out.push('\n');
    }
    out
}
