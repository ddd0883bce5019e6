//! Per-page view state: the reducer that owns a page's transient state and
//! keeps the shareable part of it in the page URL.
//!
//! One `ViewState` exists per open page and it is the only writer of that
//! page's URL. Time is injected through `apply(.., now)` so the debounced
//! query is deterministic under test.

use std::time::{Duration, Instant};

use crate::catalog::{Capability, Catalog};
use crate::compare::{CompareError, CompareSelection, Toggle};
use crate::debounce::{self, Debounce};
use crate::derive::{self, SearchScope, SortKey};
use crate::page_url::PageUrl;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSettings {
    /// Records revealed initially and per "load more".
    pub page_size: usize,
    pub debounce: Duration,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            debounce: debounce::DEFAULT_WINDOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    /// Text typed into the search box.
    Keystroke(String),
    /// Clock tick; settles the debounced query once it has been quiet.
    Tick,
    /// Search submitted (enter / button).
    Submit,
    SetSort(SortKey),
    SetCategory(Option<String>),
    LoadMore,
    ToggleCompare(String),
    /// The URL changed underneath the page (back / forward, link).
    Navigate(PageUrl),
}

/// User-facing notice raised by an action that was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    CompareFull { limit: usize },
}

/// What an action changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub results_changed: bool,
    pub url_changed: bool,
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultsPage<'a> {
    /// Matches before pagination.
    pub total: usize,
    pub items: Vec<&'a Capability>,
    pub has_more: bool,
}

#[derive(Debug, Clone)]
pub struct ViewState {
    url: PageUrl,
    settings: ViewSettings,
    raw_query: String,
    query: Debounce<String>,
    sort: SortKey,
    category: Option<String>,
    visible_count: usize,
}

impl ViewState {
    /// Initialise from the page URL: query, category and sort are read from
    /// it so a shared link restores the same view.
    pub fn new(url: PageUrl, settings: ViewSettings) -> Self {
        let query = url.query();
        Self {
            raw_query: query.clone(),
            query: Debounce::new(query, settings.debounce),
            sort: url.sort(),
            category: url.category(),
            visible_count: settings.page_size,
            url,
            settings,
        }
    }

    pub fn url(&self) -> &PageUrl {
        &self.url
    }

    /// Text as typed, updated on every keystroke.
    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    /// Query the results are computed from.
    pub fn query(&self) -> &str {
        self.query.value()
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    pub fn compare_selection(&self) -> CompareSelection {
        self.url.compare_slugs()
    }

    /// Earliest instant a `Tick` can settle the pending query.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.query.deadline()
    }

    pub fn apply(&mut self, action: ViewAction, now: Instant) -> Transition {
        let mut t = Transition::default();
        match action {
            ViewAction::Keystroke(text) => {
                self.raw_query = text.clone();
                self.query.push(text, now);
            }
            ViewAction::Tick => {
                if self.query.poll(now) {
                    self.reset_visible();
                    t.results_changed = true;
                }
            }
            ViewAction::Submit => {
                let before = self.url.href();
                self.url.set_query(&self.raw_query);
                t.url_changed = self.url.href() != before;
                self.query.push(self.raw_query.clone(), now);
                if self.query.flush() {
                    self.reset_visible();
                    t.results_changed = true;
                }
            }
            ViewAction::SetSort(sort) => {
                if sort != self.sort {
                    self.sort = sort;
                    self.url.set_sort(sort);
                    self.reset_visible();
                    t.results_changed = true;
                    t.url_changed = true;
                }
            }
            ViewAction::SetCategory(category) => {
                let category = category.filter(|c| !c.is_empty());
                if category != self.category {
                    self.url.set_category(category.as_deref());
                    self.category = category;
                    self.reset_visible();
                    t.results_changed = true;
                    t.url_changed = true;
                }
            }
            ViewAction::LoadMore => {
                self.visible_count += self.settings.page_size;
                t.results_changed = true;
            }
            ViewAction::ToggleCompare(slug) => {
                let mut selection = self.url.compare_slugs();
                match selection.toggle(&slug) {
                    Ok(Toggle::Ignored) => {}
                    Ok(_) => {
                        self.url.set_compare_slugs(&selection);
                        t.url_changed = true;
                    }
                    Err(CompareError::Full { limit }) => {
                        t.notice = Some(Notice::CompareFull { limit });
                    }
                }
            }
            ViewAction::Navigate(url) => {
                let query = url.query();
                let sort = url.sort();
                let category = url.category();
                let changed =
                    query != *self.query.value() || sort != self.sort || category != self.category;
                self.raw_query = query.clone();
                self.query.reset(query);
                self.sort = sort;
                self.category = category;
                t.url_changed = url != self.url;
                self.url = url;
                if changed {
                    self.reset_visible();
                    t.results_changed = true;
                }
            }
        }
        t
    }

    /// Text filter, then category, then sort, then paginate.
    pub fn results<'a>(&self, catalog: &'a Catalog, scope: SearchScope) -> ResultsPage<'a> {
        let all = catalog.refs();
        let matched = derive::search(&all, self.query(), scope);
        let filtered = derive::filter_by_category(&matched, self.category());
        let sorted = derive::sort_by(&filtered, self.sort);
        let items = derive::paginate(&sorted, self.visible_count);
        ResultsPage {
            total: sorted.len(),
            has_more: items.len() < sorted.len(),
            items,
        }
    }

    fn reset_visible(&mut self) {
        self.visible_count = self.settings.page_size;
    }
}
