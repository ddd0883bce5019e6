use serde::{Deserialize, Serialize};

use crate::catalog::Capability;
use crate::compare::{RadarChart, WinnerRow};
use crate::derive::{CatalogSummary, CategoryShare, LanguageCount, ScoreBucket, SortKey};
use crate::i18n::Locale;

// --- Request/Response types ---

#[derive(Deserialize)]
pub(super) struct LangQuery {
    pub lang: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct SearchQuery {
    pub lang: Option<String>,
    /// Records to show; the page size of the underlying view.
    pub limit: Option<usize>,
    /// `search` (default) or `home`.
    pub page: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct LimitQuery {
    pub lang: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub(super) struct PickerQuery {
    pub lang: Option<String>,
    pub q: Option<String>,
}

#[derive(Serialize)]
pub(super) struct HealthResponse {
    pub ok: bool,
    pub capabilities: usize,
}

/// A record plus its localized category label.
#[derive(Serialize)]
pub(super) struct CapabilityView<'a> {
    #[serde(flatten)]
    pub record: &'a Capability,
    pub category_label: &'a str,
}

impl<'a> CapabilityView<'a> {
    pub fn new(record: &'a Capability, locale: Locale) -> Self {
        Self { record, category_label: locale.category_label(&record.category) }
    }

    pub fn many(records: &[&'a Capability], locale: Locale) -> Vec<Self> {
        records.iter().map(|r| Self::new(r, locale)).collect()
    }
}

#[derive(Serialize)]
pub(super) struct ResultsResponse<'a> {
    pub total: usize,
    pub has_more: bool,
    pub query: &'a str,
    pub category: Option<&'a str>,
    pub sort: SortKey,
    pub items: Vec<CapabilityView<'a>>,
}

#[derive(Serialize)]
pub(super) struct StatsResponse {
    #[serde(flatten)]
    pub summary: CatalogSummary,
    pub categories: Vec<CategoryShare>,
    pub score_buckets: Vec<ScoreBucket>,
    pub languages: Vec<LanguageCount>,
}

#[derive(Serialize)]
pub(super) struct TrendingResponse<'a> {
    pub top_starred: Vec<CapabilityView<'a>>,
    pub recently_updated: Vec<CapabilityView<'a>>,
}

#[derive(Serialize)]
pub(super) struct CompareResponse<'a> {
    pub slugs: Vec<String>,
    /// Selected slugs no longer present in the catalog.
    pub missing: Vec<String>,
    pub items: Vec<CapabilityView<'a>>,
    pub winners: Vec<WinnerRow>,
    pub radar: RadarChart,
}
