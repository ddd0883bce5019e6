//! Capability dataset: the immutable catalog loaded once at startup.
//!
//! The catalog is read from a single JSON array of capability records. It is
//! built once, wrapped in an `Arc`, and handed to every consumer (HTTP
//! handlers, CLI commands, view-state derivations). Nothing mutates a record
//! after load.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Conventional dataset locations, relative to the working directory.
const DATA_CANDIDATES: &[&str] = &["data/capabilities.json", "../data/capabilities.json"];

/// Upper bound of every score (five dimensions and overall).
pub const MAX_SCORE: f64 = 10.0;

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// Where a capability was discovered.
///
/// Discovery jobs write finer tags (`mcp-official`, `mcp-github`,
/// `mcp-npm`, ...). Every `mcp*` tag reads as [`Source::Mcp`], and so does
/// any tag this crate does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Openclaw,
    #[default]
    Mcp,
}

impl Source {
    pub fn from_tag(tag: &str) -> Self {
        if tag.trim().to_ascii_lowercase().starts_with("openclaw") {
            Source::Openclaw
        } else {
            Source::Mcp
        }
    }
}

impl<'de> Deserialize<'de> for Source {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Source::from_tag(&tag))
    }
}

/// One of the five AI-scored quality dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Reliability,
    Safety,
    Capability,
    Reputation,
    Usability,
}

impl Dimension {
    /// Fixed display order, also the radar chart's clockwise axis order.
    pub const ALL: [Dimension; 5] = [
        Dimension::Reliability,
        Dimension::Safety,
        Dimension::Capability,
        Dimension::Reputation,
        Dimension::Usability,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Dimension::Reliability => "reliability",
            Dimension::Safety => "safety",
            Dimension::Capability => "capability",
            Dimension::Reputation => "reputation",
            Dimension::Usability => "usability",
        }
    }
}

/// Five-dimension score block. Missing dimensions arrive as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scores {
    #[serde(deserialize_with = "null_as_default")]
    pub reliability: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub safety: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub capability: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub reputation: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub usability: f64,
}

impl Scores {
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Reliability => self.reliability,
            Dimension::Safety => self.safety,
            Dimension::Capability => self.capability,
            Dimension::Reputation => self.reputation,
            Dimension::Usability => self.usability,
        }
    }

    fn clamped(self) -> Self {
        Self {
            reliability: clamp_score(self.reliability),
            safety: clamp_score(self.safety),
            capability: clamp_score(self.capability),
            reputation: clamp_score(self.reputation),
            usability: clamp_score(self.usability),
        }
    }
}

/// A single cataloged plugin / integration.
///
/// Wire names follow the snake_case layout of `capabilities.json`. Nullable
/// strings collapse to empty, nullable numbers to 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capability {
    pub slug: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub source: Source,
    #[serde(deserialize_with = "null_as_default")]
    pub source_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub provider: String,
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub stars: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub forks: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub contributors: u64,
    /// ISO-8601 timestamp; parsed on demand when sorting by recency.
    #[serde(deserialize_with = "null_as_default")]
    pub last_updated: String,
    #[serde(deserialize_with = "null_as_default")]
    pub scores: Scores,
    #[serde(deserialize_with = "null_as_default")]
    pub overall_score: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub one_liner: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ai_summary: String,
    #[serde(deserialize_with = "null_as_default")]
    pub install_guide: String,
    #[serde(deserialize_with = "null_as_default")]
    pub usage_guide: String,
    pub safety_notes: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub has_tests: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub has_typescript: bool,
    pub language: Option<String>,
    pub repo_url: Option<String>,
    pub endpoint: Option<String>,
    pub protocol: Option<String>,
    pub latest_version: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub dependencies: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub supported_clients: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub readme_length: u64,
}

impl Capability {
    /// Score for one dimension, `None` when the dimension was never scored.
    ///
    /// The dataset encodes "not scored" as 0, which is indistinguishable from
    /// a legitimate zero; this accessor reads 0 as "not scored".
    pub fn rated(&self, dimension: Dimension) -> Option<f64> {
        non_zero(self.scores.get(dimension))
    }

    /// Overall score, `None` when unscored (see [`Capability::rated`]).
    pub fn rated_overall(&self) -> Option<f64> {
        non_zero(self.overall_score)
    }

    fn normalized(mut self) -> Self {
        self.scores = self.scores.clamped();
        self.overall_score = clamp_score(self.overall_score);
        self.language = self.language.filter(|l| !l.trim().is_empty());
        self.repo_url = self.repo_url.filter(|u| !u.trim().is_empty());
        self
    }
}

fn clamp_score(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, MAX_SCORE) }
}

fn non_zero(value: f64) -> Option<f64> {
    if value == 0.0 { None } else { Some(value) }
}

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The loaded dataset. Records keep their file order, which is the tie-break
/// order for every stable sort downstream.
#[derive(Debug, Default)]
pub struct Catalog {
    records: Vec<Capability>,
    by_slug: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, clamping scores and dropping duplicate slugs
    /// (first occurrence wins).
    pub fn new(records: Vec<Capability>) -> Self {
        let mut kept = Vec::with_capacity(records.len());
        let mut by_slug = HashMap::with_capacity(records.len());
        for record in records {
            if record.slug.is_empty() {
                tracing::warn!(name = %record.name, "dropping capability without slug");
                continue;
            }
            if by_slug.contains_key(&record.slug) {
                tracing::warn!(slug = %record.slug, "dropping duplicate capability slug");
                continue;
            }
            by_slug.insert(record.slug.clone(), kept.len());
            kept.push(record.normalized());
        }
        Self { records: kept, by_slug }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a JSON array of capability records. The array itself must be
    /// well formed; a record that does not fit the schema is skipped with a
    /// warning and the rest still load.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let values: Vec<serde_json::Value> =
            serde_json::from_str(json).map_err(|e| format!("Failed to parse capabilities: {e}"))?;
        let mut records = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            let slug = value.get("slug").and_then(|s| s.as_str()).unwrap_or_default().to_string();
            match serde_json::from_value::<Capability>(value) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(index, %slug, error = %e, "skipping malformed capability record"),
            }
        }
        Ok(Self::new(records))
    }

    pub fn all(&self) -> &[Capability] {
        &self.records
    }

    /// All records as references, in file order. The derivation functions
    /// operate on reference slices so subsets never clone records.
    pub fn refs(&self) -> Vec<&Capability> {
        self.records.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, slug: &str) -> Option<&Capability> {
        self.by_slug.get(slug).map(|&i| &self.records[i])
    }

    /// Distinct category keys present in the data, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = self
            .records
            .iter()
            .map(|c| c.category.as_str())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        seen.sort_unstable();
        seen
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// How the dataset was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(PathBuf),
    /// No dataset file found; the catalog is empty.
    Absent,
}

/// Pick the dataset file: the explicit path if given, else the first
/// conventional location that exists.
pub fn resolve_data_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => DATA_CANDIDATES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists()),
    }
}

/// Load the catalog once at startup.
///
/// A missing file yields an empty catalog (not an error). A file that exists
/// but cannot be read or parsed is an error.
pub fn load(explicit: Option<&Path>) -> Result<(Catalog, LoadOutcome), String> {
    let Some(path) = resolve_data_path(explicit) else {
        tracing::warn!(
            path = ?explicit,
            "capability dataset not found, serving an empty catalog"
        );
        return Ok((Catalog::empty(), LoadOutcome::Absent));
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let catalog = Catalog::from_json(&content)
        .map_err(|e| format!("{}: {e}", path.display()))?;
    tracing::info!(path = %path.display(), count = catalog.len(), "capability dataset loaded");
    Ok((catalog, LoadOutcome::Loaded(path)))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Minimal record for tests; everything else defaulted.
    pub(crate) fn cap(slug: &str, name: &str, category: &str, overall: f64) -> Capability {
        Capability {
            slug: slug.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            overall_score: overall,
            ..Capability::default()
        }
    }
}
