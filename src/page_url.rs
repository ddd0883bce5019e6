//! Shareable page URL with typed accessors for the parameters the views own.

use std::fmt;

use url::Url;

use crate::compare::CompareSelection;
use crate::derive::SortKey;

/// Origin used to resolve relative hrefs. Only path and query are exposed.
const BASE: &str = "http://agentstore.local/";

pub const PARAM_QUERY: &str = "q";
pub const PARAM_CATEGORY: &str = "category";
pub const PARAM_SORT: &str = "sort";
pub const PARAM_SLUGS: &str = "slugs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUrl {
    url: Url,
}

impl PageUrl {
    /// Parse an href such as `/search?q=git` or a full URL.
    pub fn parse(href: &str) -> Result<Self, String> {
        let base = Url::parse(BASE).map_err(|e| format!("Invalid base URL: {e}"))?;
        let url = base
            .join(href)
            .map_err(|e| format!("Invalid page URL \"{href}\": {e}"))?;
        Ok(Self { url })
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// First value of `name`. Empty values read as absent.
    pub fn param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())
    }

    /// Set or remove (`None` / empty) one parameter. Other parameters keep
    /// their order; an existing key keeps its position.
    pub fn set_param(&mut self, name: &str, value: Option<&str>) {
        let value = value.filter(|v| !v.is_empty());
        let mut pairs: Vec<(String, String)> = Vec::new();
        let mut placed = false;
        for (k, v) in self.url.query_pairs() {
            if k != name {
                pairs.push((k.into_owned(), v.into_owned()));
            } else if !placed {
                placed = true;
                if let Some(value) = value {
                    pairs.push((k.into_owned(), value.to_string()));
                }
            }
        }
        if !placed && let Some(value) = value {
            pairs.push((name.to_string(), value.to_string()));
        }

        if pairs.is_empty() {
            self.url.set_query(None);
        } else {
            self.url.query_pairs_mut().clear().extend_pairs(pairs);
        }
    }

    pub fn query(&self) -> String {
        self.param(PARAM_QUERY).unwrap_or_default()
    }

    pub fn set_query(&mut self, query: &str) {
        let trimmed = query.trim();
        self.set_param(PARAM_QUERY, Some(trimmed));
    }

    pub fn category(&self) -> Option<String> {
        self.param(PARAM_CATEGORY)
    }

    pub fn set_category(&mut self, category: Option<&str>) {
        self.set_param(PARAM_CATEGORY, category);
    }

    /// Sort key; a missing or unrecognised value reads as the default.
    pub fn sort(&self) -> SortKey {
        self.param(PARAM_SORT)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    /// The default sort is left out of the URL.
    pub fn set_sort(&mut self, sort: SortKey) {
        let value = (sort != SortKey::default()).then(|| sort.as_str());
        self.set_param(PARAM_SORT, value);
    }

    pub fn compare_slugs(&self) -> CompareSelection {
        self.param(PARAM_SLUGS)
            .map(|raw| CompareSelection::from_param(&raw))
            .unwrap_or_default()
    }

    pub fn set_compare_slugs(&mut self, selection: &CompareSelection) {
        let joined = selection.to_param();
        self.set_param(PARAM_SLUGS, Some(&joined));
    }

    /// Path plus query, as written into links and history entries.
    pub fn href(&self) -> String {
        match self.url.query() {
            Some(q) => format!("{}?{q}", self.url.path()),
            None => self.url.path().to_string(),
        }
    }
}

impl fmt::Display for PageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href())
    }
}
