//! Derivation engine: pure transformations over the capability dataset.
//!
//! Every function here is total. Empty input or an empty result is a valid
//! output, never an error. Inputs are slices of record references so the
//! pipeline (filter -> category -> sort -> paginate) never clones records.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::catalog::Capability;
use crate::i18n::{self, Locale};

// ---------------------------------------------------------------------------
// Text search
// ---------------------------------------------------------------------------

/// A record field the free-text query can match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Name,
    Slug,
    Description,
    OneLiner,
    Provider,
    Category,
}

impl SearchField {
    fn text(self, record: &Capability) -> &str {
        match self {
            SearchField::Name => &record.name,
            SearchField::Slug => &record.slug,
            SearchField::Description => &record.description,
            SearchField::OneLiner => &record.one_liner,
            SearchField::Provider => &record.provider,
            SearchField::Category => &record.category,
        }
    }
}

/// What a blank (empty or whitespace-only) query selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyQuery {
    MatchNone,
    MatchAll,
}

/// The field set and blank-query policy of one call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchScope {
    pub fields: &'static [SearchField],
    pub on_empty: EmptyQuery,
}

/// Search page: name, description, one-liner, provider. A blank query shows
/// the "enter a keyword" state, so it matches nothing.
pub const SEARCH_PAGE: SearchScope = SearchScope {
    fields: &[
        SearchField::Name,
        SearchField::Description,
        SearchField::OneLiner,
        SearchField::Provider,
    ],
    on_empty: EmptyQuery::MatchNone,
};

/// Home page browse box: name, one-liner, description, category. A blank
/// query browses the whole catalog.
pub const HOME_PAGE: SearchScope = SearchScope {
    fields: &[
        SearchField::Name,
        SearchField::OneLiner,
        SearchField::Description,
        SearchField::Category,
    ],
    on_empty: EmptyQuery::MatchAll,
};

/// Compare page "add item" picker: name, slug, one-liner.
pub const COMPARE_PICKER: SearchScope = SearchScope {
    fields: &[SearchField::Name, SearchField::Slug, SearchField::OneLiner],
    on_empty: EmptyQuery::MatchNone,
};

/// Case-insensitive substring match of `query` against the scope's fields.
pub fn text_match(record: &Capability, query: &str, scope: SearchScope) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return scope.on_empty == EmptyQuery::MatchAll;
    }
    let needle = query.to_lowercase();
    scope
        .fields
        .iter()
        .any(|field| field.text(record).to_lowercase().contains(&needle))
}

/// Keep the records matching `query`, preserving order.
pub fn search<'a>(records: &[&'a Capability], query: &str, scope: SearchScope) -> Vec<&'a Capability> {
    records
        .iter()
        .copied()
        .filter(|record| text_match(record, query, scope))
        .collect()
}

// ---------------------------------------------------------------------------
// Filter / sort / paginate
// ---------------------------------------------------------------------------

/// Keep the records of one category. `None` means "all" and returns the
/// input unchanged.
pub fn filter_by_category<'a>(records: &[&'a Capability], category: Option<&str>) -> Vec<&'a Capability> {
    match category {
        None => records.to_vec(),
        Some(key) => records.iter().copied().filter(|r| r.category == key).collect(),
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Overall score, highest first.
    #[default]
    Score,
    /// GitHub stars, most first.
    Stars,
    /// `last_updated`, most recent first.
    Updated,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Score => "score",
            SortKey::Stars => "stars",
            SortKey::Updated => "updated",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "score" => Ok(SortKey::Score),
            "stars" => Ok(SortKey::Stars),
            "updated" => Ok(SortKey::Updated),
            other => Err(format!("Unknown sort key \"{other}\"; expected score, stars or updated")),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse `last_updated`. Accepts RFC 3339, naive ISO date-times (read as
/// UTC) and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Stable sort. Equal keys keep their input order. For `Updated`, records
/// whose timestamp does not parse go after every dated record.
pub fn sort_by<'a>(records: &[&'a Capability], key: SortKey) -> Vec<&'a Capability> {
    let mut sorted = records.to_vec();
    match key {
        SortKey::Score => sorted.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score)),
        SortKey::Stars => sorted.sort_by(|a, b| b.stars.cmp(&a.stars)),
        SortKey::Updated => {
            let mut keyed: Vec<(Option<DateTime<Utc>>, &'a Capability)> = sorted
                .iter()
                .map(|r| (parse_timestamp(&r.last_updated), *r))
                .collect();
            keyed.sort_by(|(a, _), (b, _)| match (a, b) {
                (Some(a), Some(b)) => b.cmp(a),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            });
            sorted = keyed.into_iter().map(|(_, r)| r).collect();
        }
    }
    sorted
}

/// Prefix of at most `visible_count` records.
pub fn paginate<'a>(records: &[&'a Capability], visible_count: usize) -> Vec<&'a Capability> {
    records[..visible_count.min(records.len())].to_vec()
}

// ---------------------------------------------------------------------------
// Distributions (stats page)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub label: String,
    pub count: usize,
    /// `round(count / total * 100)`; not re-normalised, so the column may
    /// not sum to exactly 100.
    pub percentage: u32,
}

/// Count per category present in `records`, most populous first (ties keep
/// first-appearance order). Unknown categories appear under their raw key.
pub fn distribution_by_category(records: &[&Capability], locale: Locale) -> Vec<CategoryShare> {
    let total = records.len();
    let counts = count_in_order(records.iter().map(|r| r.category.as_str()));
    let mut shares: Vec<CategoryShare> = counts
        .into_iter()
        .map(|(category, count)| CategoryShare {
            category: category.to_string(),
            label: locale.category_label(category).to_string(),
            count,
            percentage: percentage(count, total),
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}

fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (count as f64 / total as f64 * 100.0).round() as u32
}

/// Tally keys, keeping the order in which each key first appeared.
fn count_in_order<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut counts: Vec<(&'a str, usize)> = Vec::new();
    for key in keys {
        match index.get(key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(key, counts.len());
                counts.push((key, 1));
            }
        }
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBucket {
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

const SCORE_BUCKETS: [(&str, f64, f64); 5] = [
    ("0-2", 0.0, 2.0),
    ("2-4", 2.0, 4.0),
    ("4-6", 4.0, 6.0),
    ("6-8", 6.0, 8.0),
    ("8-10", 8.0, 10.0),
];

/// Index of the bucket holding `score`: `[0,2)`, `[2,4)`, `[4,6)`, `[6,8)`,
/// `[8,10]`. Out-of-range values land in the nearest end bucket.
pub fn score_bucket_index(score: f64) -> usize {
    if score.is_nan() || score < SCORE_BUCKETS[1].1 {
        return 0;
    }
    SCORE_BUCKETS
        .iter()
        .rposition(|(_, min, _)| score >= *min)
        .unwrap_or(0)
}

/// Histogram of overall scores over the five fixed buckets. Every record is
/// counted exactly once.
pub fn distribution_by_score_bucket(records: &[&Capability]) -> Vec<ScoreBucket> {
    let mut buckets: Vec<ScoreBucket> = SCORE_BUCKETS
        .iter()
        .map(|&(label, min, max)| ScoreBucket { label, min, max, count: 0 })
        .collect();
    for record in records {
        buckets[score_bucket_index(record.overall_score)].count += 1;
    }
    buckets
}

pub const UNKNOWN_LANGUAGE: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageCount {
    pub language: String,
    pub count: usize,
}

/// Top `top_n` implementation languages by record count. Records without a
/// language are grouped under `"Unknown"`.
pub fn distribution_by_language(records: &[&Capability], top_n: usize) -> Vec<LanguageCount> {
    let counts = count_in_order(
        records
            .iter()
            .map(|r| r.language.as_deref().unwrap_or(UNKNOWN_LANGUAGE)),
    );
    let mut langs: Vec<LanguageCount> = counts
        .into_iter()
        .map(|(language, count)| LanguageCount { language: language.to_string(), count })
        .collect();
    langs.sort_by(|a, b| b.count.cmp(&a.count));
    langs.truncate(top_n);
    langs
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

/// Records in the same category as `record`, closest overall score first.
/// Ties keep dataset order.
pub fn similar_to<'a>(record: &Capability, all: &[&'a Capability], limit: usize) -> Vec<&'a Capability> {
    let mut candidates: Vec<(f64, &'a Capability)> = all
        .iter()
        .filter(|c| c.slug != record.slug && c.category == record.category)
        .map(|c| ((c.overall_score - record.overall_score).abs(), *c))
        .collect();
    candidates.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    candidates.into_iter().take(limit).map(|(_, c)| c).collect()
}

/// "Hot this week": most starred records.
pub fn top_by_stars<'a>(records: &[&'a Capability], n: usize) -> Vec<&'a Capability> {
    paginate(&sort_by(records, SortKey::Stars), n)
}

/// Most recently updated records.
pub fn recently_updated<'a>(records: &[&'a Capability], n: usize) -> Vec<&'a Capability> {
    paginate(&sort_by(records, SortKey::Updated), n)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveCategory {
    pub category: &'static str,
    pub label: String,
    pub count: usize,
}

/// Label-table categories with at least one record, in table order (the
/// home page's category chips).
pub fn active_categories(records: &[&Capability], locale: Locale) -> Vec<ActiveCategory> {
    i18n::known_categories()
        .filter_map(|key| {
            let count = records.iter().filter(|r| r.category == key).count();
            (count > 0).then(|| ActiveCategory {
                category: key,
                label: locale.category_label(key).to_string(),
                count,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Stats page summary
// ---------------------------------------------------------------------------

/// Length of the stats page's "top scored" and "recently updated" lists.
pub const STATS_TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSummary {
    pub total: usize,
    pub avg_score: f64,
    /// Distinct category keys, known or not.
    pub category_count: usize,
    pub has_tests: usize,
    pub has_tests_percentage: u32,
    pub top_scored: Vec<RecordRef>,
    pub recently_updated: Vec<RecordRef>,
}

/// Headline numbers of the stats page.
pub fn catalog_summary(records: &[&Capability], top_n: usize) -> CatalogSummary {
    let mut keys: Vec<&str> = records.iter().map(|r| r.category.as_str()).collect();
    keys.sort_unstable();
    keys.dedup();
    let has_tests = records.iter().filter(|r| r.has_tests).count();

    CatalogSummary {
        total: records.len(),
        avg_score: average_score(records),
        category_count: keys.len(),
        has_tests,
        has_tests_percentage: percentage(has_tests, records.len()),
        top_scored: paginate(&sort_by(records, SortKey::Score), top_n)
            .into_iter()
            .map(RecordRef::from)
            .collect(),
        recently_updated: recently_updated(records, top_n)
            .into_iter()
            .map(RecordRef::from)
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Catalog health (admin overview)
// ---------------------------------------------------------------------------

/// Overall score below which a scored record is flagged.
pub const LOW_SCORE_THRESHOLD: f64 = 3.0;

const HEALTH_RECENT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordRef {
    pub slug: String,
    pub name: String,
    pub category: String,
    pub score: f64,
    pub last_updated: String,
}

impl From<&Capability> for RecordRef {
    fn from(c: &Capability) -> Self {
        Self {
            slug: c.slug.clone(),
            name: c.name.clone(),
            category: c.category.clone(),
            score: c.overall_score,
            last_updated: c.last_updated.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryHealth {
    pub category: String,
    pub label: String,
    pub count: usize,
    pub avg_score: f64,
    pub top: Option<RecordRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogHealth {
    pub total: usize,
    pub avg_score: f64,
    /// Newest parseable `last_updated`, empty when none parses.
    pub last_updated: String,
    pub missing_ai_summary: usize,
    pub missing_repo_url: usize,
    pub zero_score: usize,
    pub categories: Vec<CategoryHealth>,
    pub recent: Vec<RecordRef>,
    /// Scored records under [`LOW_SCORE_THRESHOLD`], lowest first.
    pub low_score: Vec<RecordRef>,
}

fn average_score(records: &[&Capability]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(|r| r.overall_score).sum::<f64>() / records.len() as f64
}

pub fn catalog_health(records: &[&Capability], locale: Locale) -> CatalogHealth {
    let recent = recently_updated(records, HEALTH_RECENT_LIMIT);
    let last_updated = recent
        .first()
        .filter(|r| parse_timestamp(&r.last_updated).is_some())
        .map(|r| r.last_updated.clone())
        .unwrap_or_default();

    let mut keys: Vec<&str> = records.iter().map(|r| r.category.as_str()).collect();
    keys.sort_unstable();
    keys.dedup();
    let categories = keys
        .into_iter()
        .map(|key| {
            let items = filter_by_category(records, Some(key));
            // First record wins among equal top scores.
            let top = items
                .iter()
                .copied()
                .reduce(|best, c| if c.overall_score > best.overall_score { c } else { best })
                .map(RecordRef::from);
            CategoryHealth {
                category: key.to_string(),
                label: locale.category_label(key).to_string(),
                count: items.len(),
                avg_score: average_score(&items),
                top,
            }
        })
        .collect();

    let mut low: Vec<&Capability> = records
        .iter()
        .copied()
        .filter(|r| r.rated_overall().is_some_and(|s| s < LOW_SCORE_THRESHOLD))
        .collect();
    low.sort_by(|a, b| a.overall_score.total_cmp(&b.overall_score));

    CatalogHealth {
        total: records.len(),
        avg_score: average_score(records),
        last_updated,
        missing_ai_summary: records.iter().filter(|r| r.ai_summary.trim().is_empty()).count(),
        missing_repo_url: records.iter().filter(|r| r.repo_url.is_none()).count(),
        zero_score: records.iter().filter(|r| r.rated_overall().is_none()).count(),
        categories,
        recent: recent.into_iter().map(RecordRef::from).collect(),
        low_score: low.into_iter().map(RecordRef::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::cap;

    fn names(records: &[&Capability]) -> Vec<String> {
        records.iter().map(|r| r.name.clone()).collect()
    }

    fn sample() -> Vec<Capability> {
        let mut git_mcp = cap("git-mcp", "GitMCP", "development", 8.2);
        git_mcp.description = "Git repository tools".into();
        git_mcp.stars = 40;
        git_mcp.last_updated = "2025-02-01T00:00:00Z".into();
        git_mcp.language = Some("Rust".into());

        let mut git_browse = cap("git-browse", "GitBrowse", "web", 6.0);
        git_browse.stars = 900;
        git_browse.last_updated = "2025-03-01".into();
        git_browse.language = Some("TypeScript".into());

        let mut notes = cap("notes", "Notes", "productivity", 7.5);
        notes.provider = "acme".into();
        notes.one_liner = "Markdown note taking".into();
        notes.stars = 10;
        notes.last_updated = "not a date".into();

        let mut pg = cap("pg", "Postgres", "data", 8.2);
        pg.stars = 900;
        pg.last_updated = "2024-12-31T23:59:59".into();
        pg.language = Some("Rust".into());

        vec![git_mcp, git_browse, notes, pg]
    }

    #[test]
    fn search_git_sorted_by_score() {
        let data = sample();
        let refs: Vec<&Capability> = data.iter().collect();
        let hits = search(&refs, "git", SEARCH_PAGE);
        let sorted = sort_by(&hits, SortKey::Score);
        assert_eq!(names(&sorted), vec!["GitMCP", "GitBrowse"]);
    }

    #[test]
    fn text_match_is_case_insensitive() {
        let data = sample();
        assert!(text_match(&data[0], "GITmcp", SEARCH_PAGE));
        assert!(text_match(&data[2], "ACME", SEARCH_PAGE));
        assert!(text_match(&data[2], "markdown", SEARCH_PAGE));
    }

    #[test]
    fn blank_query_policy_differs_per_scope() {
        let data = sample();
        assert!(!text_match(&data[0], "   ", SEARCH_PAGE));
        assert!(text_match(&data[0], "", HOME_PAGE));
        assert!(!text_match(&data[0], "", COMPARE_PICKER));
    }

    #[test]
    fn scopes_use_their_own_fields() {
        let data = sample();
        // Category is searched on the home page only.
        assert!(text_match(&data[3], "data", HOME_PAGE));
        assert!(!text_match(&data[3], "data", SEARCH_PAGE));
        // Slug is searched by the compare picker only.
        assert!(text_match(&data[3], "pg", COMPARE_PICKER));
        assert!(!text_match(&data[3], "pg", SEARCH_PAGE));
    }

    #[test]
    fn category_filter_is_idempotent() {
        let data = sample();
        let refs: Vec<&Capability> = data.iter().collect();
        for category in [Some("web"), Some("development"), Some("missing"), None] {
            let once = filter_by_category(&refs, category);
            let twice = filter_by_category(&once, category);
            assert_eq!(once, twice, "category {category:?}");
        }
        assert_eq!(filter_by_category(&refs, None).len(), refs.len());
    }

    #[test]
    fn score_sort_is_stable_for_ties() {
        let data = sample();
        let refs: Vec<&Capability> = data.iter().collect();
        let sorted = sort_by(&refs, SortKey::Score);
        // GitMCP and Postgres both score 8.2; GitMCP comes first in the input.
        assert_eq!(names(&sorted), vec!["GitMCP", "Postgres", "Notes", "GitBrowse"]);

        let reversed: Vec<&Capability> = refs.iter().rev().copied().collect();
        let sorted = sort_by(&reversed, SortKey::Score);
        assert_eq!(names(&sorted), vec!["Postgres", "GitMCP", "Notes", "GitBrowse"]);
    }

    #[test]
    fn stars_sort_descending_and_stable() {
        let data = sample();
        let refs: Vec<&Capability> = data.iter().collect();
        let sorted = sort_by(&refs, SortKey::Stars);
        assert_eq!(names(&sorted), vec!["GitBrowse", "Postgres", "GitMCP", "Notes"]);
    }

    #[test]
    fn updated_sort_parses_mixed_formats_and_sinks_unparseable() {
        let data = sample();
        let refs: Vec<&Capability> = data.iter().collect();
        let sorted = sort_by(&refs, SortKey::Updated);
        assert_eq!(names(&sorted), vec!["GitBrowse", "GitMCP", "Postgres", "Notes"]);
    }

    #[test]
    fn parse_timestamp_formats() {
        assert!(parse_timestamp("2025-01-10T08:00:00Z").is_some());
        assert!(parse_timestamp("2025-01-10T08:00:00+08:00").is_some());
        assert!(parse_timestamp("2025-01-10T08:00:00.123456").is_some());
        assert!(parse_timestamp("2025-01-10").is_some());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn pagination_is_monotonic_and_idempotent() {
        let data = sample();
        let refs: Vec<&Capability> = data.iter().collect();
        for n1 in 0..=5 {
            let once = paginate(&refs, n1);
            assert_eq!(paginate(&once, n1), once);
            assert_eq!(once.len(), n1.min(refs.len()));
            for n2 in n1..=6 {
                let longer = paginate(&refs, n2);
                assert_eq!(&longer[..once.len()], &once[..]);
            }
        }
    }

    #[test]
    fn category_distribution_counts_every_record() {
        let mut data = sample();
        data.push(cap("odd", "Odd", "unknown-cat", 1.0));
        data.push(cap("web2", "Web2", "web", 1.0));
        let refs: Vec<&Capability> = data.iter().collect();
        let dist = distribution_by_category(&refs, Locale::En);
        assert_eq!(dist.iter().map(|d| d.count).sum::<usize>(), refs.len());
        assert_eq!(dist[0].category, "web");
        assert_eq!(dist[0].count, 2);
        assert_eq!(dist[0].percentage, 33);

        let odd = dist.iter().find(|d| d.category == "unknown-cat").unwrap();
        assert_eq!(odd.label, "unknown-cat");
        assert_eq!(odd.count, 1);
    }

    #[test]
    fn category_percentages_are_not_renormalised() {
        let data: Vec<Capability> = ["a", "b", "c"]
            .iter()
            .map(|k| cap(k, k, k, 5.0))
            .collect();
        let refs: Vec<&Capability> = data.iter().collect();
        let dist = distribution_by_category(&refs, Locale::En);
        assert!(dist.iter().all(|d| d.percentage == 33));
        assert_eq!(dist.iter().map(|d| d.percentage).sum::<u32>(), 99);
    }

    #[test]
    fn empty_input_gives_empty_distributions() {
        let refs: Vec<&Capability> = Vec::new();
        assert!(distribution_by_category(&refs, Locale::Zh).is_empty());
        assert!(distribution_by_language(&refs, 10).is_empty());
        assert!(distribution_by_score_bucket(&refs).iter().all(|b| b.count == 0));
        assert!(similar_to(&cap("x", "X", "ai", 1.0), &refs, 5).is_empty());
    }

    #[test]
    fn score_buckets_partition_records() {
        let scores = [0.0, 1.99, 2.0, 3.5, 4.0, 5.99, 6.0, 7.999, 8.0, 9.5, 10.0];
        let data: Vec<Capability> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| cap(&format!("s{i}"), "S", "ai", *s))
            .collect();
        let refs: Vec<&Capability> = data.iter().collect();
        let buckets = distribution_by_score_bucket(&refs);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), refs.len());
        let counts: Vec<usize> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 2, 2, 2, 3]);
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(score_bucket_index(0.0), 0);
        assert_eq!(score_bucket_index(2.0), 1);
        assert_eq!(score_bucket_index(7.99), 3);
        assert_eq!(score_bucket_index(8.0), 4);
        assert_eq!(score_bucket_index(10.0), 4);
        assert_eq!(score_bucket_index(f64::NAN), 0);
    }

    #[test]
    fn language_distribution_groups_unknown_and_truncates() {
        let mut data = sample();
        data.push(cap("u2", "U2", "ai", 1.0));
        let refs: Vec<&Capability> = data.iter().collect();
        let langs = distribution_by_language(&refs, 10);
        assert_eq!(langs[0], LanguageCount { language: "Rust".into(), count: 2 });
        assert_eq!(langs[1], LanguageCount { language: UNKNOWN_LANGUAGE.into(), count: 2 });
        assert_eq!(langs[2], LanguageCount { language: "TypeScript".into(), count: 1 });
        assert_eq!(langs.iter().map(|l| l.count).sum::<usize>(), refs.len());
        assert_eq!(distribution_by_language(&refs, 1).len(), 1);
    }

    #[test]
    fn similar_ranks_by_score_distance() {
        let data = vec![
            cap("me", "Me", "development", 8.0),
            cap("far", "Far", "development", 5.0),
            cap("near", "Near", "development", 8.1),
            cap("other", "Other", "web", 8.0),
        ];
        let refs: Vec<&Capability> = data.iter().collect();
        let similar = similar_to(&data[0], &refs, 5);
        assert_eq!(names(&similar), vec!["Near", "Far"]);
        assert_eq!(similar_to(&data[0], &refs, 1).len(), 1);
    }

    #[test]
    fn trending_lists() {
        let data = sample();
        let refs: Vec<&Capability> = data.iter().collect();
        assert_eq!(names(&top_by_stars(&refs, 2)), vec!["GitBrowse", "Postgres"]);
        assert_eq!(names(&recently_updated(&refs, 1)), vec!["GitBrowse"]);
    }

    #[test]
    fn active_categories_follow_table_order() {
        let mut data = sample();
        data.push(cap("odd", "Odd", "unknown-cat", 1.0));
        let refs: Vec<&Capability> = data.iter().collect();
        let active: Vec<&str> = active_categories(&refs, Locale::En)
            .iter()
            .map(|a| a.category)
            .collect();
        assert_eq!(active, vec!["development", "data", "web", "productivity"]);
    }

    #[test]
    fn catalog_health_overview() {
        let mut data = sample();
        data.push(cap("zero", "Zero", "ai", 0.0));
        data.push(cap("low", "Low", "ai", 2.5));
        data.push(cap("lower", "Lower", "ai", 1.0));
        data[0].ai_summary = "has one".into();
        data[0].repo_url = Some("https://github.com/x/y".into());
        let refs: Vec<&Capability> = data.iter().collect();

        let health = catalog_health(&refs, Locale::En);
        assert_eq!(health.total, 7);
        assert_eq!(health.missing_ai_summary, 6);
        assert_eq!(health.missing_repo_url, 6);
        assert_eq!(health.zero_score, 1);
        assert_eq!(health.last_updated, "2025-03-01");
        let recent: Vec<&str> = health.recent.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(recent[..3], ["git-browse", "git-mcp", "pg"]);
        let low: Vec<&str> = health.low_score.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(low, vec!["lower", "low"]);

        let ai = health.categories.iter().find(|c| c.category == "ai").unwrap();
        assert_eq!(ai.count, 3);
        assert_eq!(ai.top.as_ref().unwrap().slug, "low");
        assert!((ai.avg_score - 3.5 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn health_recency_compares_instants_not_strings() {
        let mut east = cap("east", "East", "web", 5.0);
        // 2025-05-01T01:00Z, lexically after but earlier in time.
        east.last_updated = "2025-05-01T09:00:00+08:00".into();
        let mut utc = cap("utc", "Utc", "web", 5.0);
        utc.last_updated = "2025-05-01T02:00:00Z".into();
        let health = catalog_health(&[&east, &utc], Locale::En);
        let recent: Vec<&str> = health.recent.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(recent, vec!["utc", "east"]);
        assert_eq!(health.last_updated, "2025-05-01T02:00:00Z");
    }

    #[test]
    fn summary_headline_numbers() {
        let mut data = sample();
        data[0].has_tests = true;
        data[3].has_tests = true;
        data.push(cap("odd", "Odd", "weird", 1.0));
        let refs: Vec<&Capability> = data.iter().collect();

        let summary = catalog_summary(&refs, 3);
        assert_eq!(summary.total, 5);
        assert!((summary.avg_score - (8.2 + 6.0 + 7.5 + 8.2 + 1.0) / 5.0).abs() < 1e-9);
        assert_eq!(summary.category_count, 5);
        assert_eq!(summary.has_tests, 2);
        assert_eq!(summary.has_tests_percentage, 40);
        let top: Vec<&str> = summary.top_scored.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(top, vec!["git-mcp", "pg", "notes"]);
        let recent: Vec<&str> = summary.recently_updated.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(recent, vec!["git-browse", "git-mcp", "pg"]);
    }

    #[test]
    fn summary_of_empty_catalog() {
        let summary = catalog_summary(&[], STATS_TOP_N);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.avg_score, 0.0);
        assert_eq!(summary.has_tests_percentage, 0);
        assert!(summary.top_scored.is_empty() && summary.recently_updated.is_empty());
    }

    #[test]
    fn catalog_health_of_empty_catalog() {
        let health = catalog_health(&[], Locale::Zh);
        assert_eq!(health.total, 0);
        assert_eq!(health.avg_score, 0.0);
        assert_eq!(health.last_updated, "");
        assert!(health.categories.is_empty());
    }

    #[test]
    fn sort_key_parses_and_displays() {
        assert_eq!("Stars".parse::<SortKey>().unwrap(), SortKey::Stars);
        assert_eq!(SortKey::Updated.to_string(), "updated");
        assert!("name".parse::<SortKey>().is_err());
    }
}
