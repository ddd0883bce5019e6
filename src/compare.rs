//! Comparison engine: the ordered compare selection, per-metric winner
//! flags, and overlay radar chart geometry.

use serde::Serialize;
use std::f64::consts::PI;
use std::fmt;

use crate::catalog::{Capability, Catalog, Dimension, MAX_SCORE};
use crate::derive::{self, COMPARE_PICKER};

/// Maximum number of capabilities compared side by side.
pub const MAX_COMPARE: usize = 4;

/// Maximum entries in the compare page's add-item dropdown.
pub const PICKER_LIMIT: usize = 8;

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    /// Adding another slug would exceed [`MAX_COMPARE`].
    Full { limit: usize },
}

impl fmt::Display for CompareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareError::Full { limit } => write!(f, "Compare selection is full ({limit} items)"),
        }
    }
}

impl std::error::Error for CompareError {}

/// Result of toggling one slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
    /// Blank slug; the selection is untouched.
    Ignored,
}

/// Ordered, duplicate-free list of at most [`MAX_COMPARE`] slugs.
/// Selection order decides display order and chart color.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompareSelection {
    slugs: Vec<String>,
}

impl CompareSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the comma-separated `slugs` URL parameter. Empty entries and
    /// duplicates are dropped, and anything past the cap is ignored.
    pub fn from_param(raw: &str) -> Self {
        let mut selection = Self::new();
        for slug in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if selection.is_full() {
                break;
            }
            if !selection.contains(slug) {
                selection.slugs.push(slug.to_string());
            }
        }
        selection
    }

    pub fn to_param(&self) -> String {
        self.slugs.join(",")
    }

    pub fn slugs(&self) -> &[String] {
        &self.slugs
    }

    pub fn len(&self) -> usize {
        self.slugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slugs.len() >= MAX_COMPARE
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.slugs.iter().any(|s| s == slug)
    }

    /// Append `slug`. Blank and already-selected slugs are a no-op
    /// (`Ok(false)`); a new slug on a full selection is rejected and leaves
    /// it unchanged.
    pub fn add(&mut self, slug: &str) -> Result<bool, CompareError> {
        let slug = slug.trim();
        if slug.is_empty() || self.contains(slug) {
            return Ok(false);
        }
        if self.is_full() {
            return Err(CompareError::Full { limit: MAX_COMPARE });
        }
        self.slugs.push(slug.to_string());
        Ok(true)
    }

    pub fn remove(&mut self, slug: &str) -> bool {
        let before = self.slugs.len();
        self.slugs.retain(|s| s != slug);
        self.slugs.len() != before
    }

    /// Remove `slug` if selected, otherwise add it.
    pub fn toggle(&mut self, slug: &str) -> Result<Toggle, CompareError> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Ok(Toggle::Ignored);
        }
        if self.remove(slug) {
            return Ok(Toggle::Removed);
        }
        self.add(slug).map(|_| Toggle::Added)
    }
}

/// Look the selected slugs up in the catalog, keeping selection order.
/// Slugs that no longer exist are skipped.
pub fn resolve<'a>(catalog: &'a Catalog, selection: &CompareSelection) -> Vec<&'a Capability> {
    selection.slugs().iter().filter_map(|slug| catalog.get(slug)).collect()
}

/// Add-item dropdown: picker-scope matches not already selected.
pub fn picker_candidates<'a>(
    catalog: &'a Catalog,
    selection: &CompareSelection,
    query: &str,
) -> Vec<&'a Capability> {
    let unselected: Vec<&Capability> = catalog
        .all()
        .iter()
        .filter(|c| !selection.contains(&c.slug))
        .collect();
    let mut hits = derive::search(&unselected, query, COMPARE_PICKER);
    hits.truncate(PICKER_LIMIT);
    hits
}

// ---------------------------------------------------------------------------
// Winner flags
// ---------------------------------------------------------------------------

/// A compared quantity: one of the five dimensions or the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Reliability,
    Safety,
    Capability,
    Reputation,
    Usability,
    Overall,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Reliability,
        Metric::Safety,
        Metric::Capability,
        Metric::Reputation,
        Metric::Usability,
        Metric::Overall,
    ];

    pub fn dimension(self) -> Option<Dimension> {
        match self {
            Metric::Reliability => Some(Dimension::Reliability),
            Metric::Safety => Some(Dimension::Safety),
            Metric::Capability => Some(Dimension::Capability),
            Metric::Reputation => Some(Dimension::Reputation),
            Metric::Usability => Some(Dimension::Usability),
            Metric::Overall => None,
        }
    }

    pub fn value(self, record: &Capability) -> f64 {
        match self.dimension() {
            Some(dim) => record.scores.get(dim),
            None => record.overall_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinnerRow {
    pub metric: Metric,
    /// One value per compared item, in selection order.
    pub values: Vec<f64>,
    /// `true` for every item holding the row maximum (ties all win).
    pub winners: Vec<bool>,
}

/// Highlight table for the compare page. Empty when nothing is selected; a
/// single item wins every row.
pub fn winners(items: &[&Capability]) -> Vec<WinnerRow> {
    if items.is_empty() {
        return Vec::new();
    }
    Metric::ALL
        .iter()
        .map(|&metric| {
            let values: Vec<f64> = items.iter().map(|c| metric.value(c)).collect();
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let winners = values.iter().map(|v| *v == max).collect();
            WinnerRow { metric, values, winners }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Radar geometry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotColor {
    pub fill: &'static str,
    pub stroke: &'static str,
    pub dot: &'static str,
}

/// Colors by selection slot (1st..4th), not by capability. Removing an item
/// shifts later items into earlier slots and so recolors them.
pub const SLOT_COLORS: [SlotColor; MAX_COMPARE] = [
    SlotColor { fill: "rgba(59,130,246,0.2)", stroke: "#3B82F6", dot: "#3B82F6" },
    SlotColor { fill: "rgba(16,185,129,0.2)", stroke: "#10B981", dot: "#10B981" },
    SlotColor { fill: "rgba(245,158,11,0.2)", stroke: "#F59E0B", dot: "#F59E0B" },
    SlotColor { fill: "rgba(168,85,247,0.2)", stroke: "#A855F7", dot: "#A855F7" },
];

pub fn slot_color(slot: usize) -> SlotColor {
    SLOT_COLORS[slot % SLOT_COLORS.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Position of axis `index` of `total` at `radius`, with axis 0 at 12
/// o'clock and indices increasing clockwise (screen coordinates, y down).
pub fn polar_to_cartesian(center: Point, radius: f64, index: usize, total: usize) -> Point {
    let angle = 2.0 * PI * index as f64 / total as f64 - PI / 2.0;
    Point {
        x: center.x + radius * angle.cos(),
        y: center.y + radius * angle.sin(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarAxis {
    pub dimension: Dimension,
    pub end: Point,
    pub label_at: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarSeries {
    pub slug: String,
    pub slot: usize,
    pub color: SlotColor,
    /// One vertex per dimension, in [`Dimension::ALL`] order.
    pub vertices: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarChart {
    pub size: f64,
    pub center: Point,
    pub max_radius: f64,
    pub axes: Vec<RadarAxis>,
    /// Concentric grid polygons at 25/50/75/100% of `max_radius`.
    pub grid: Vec<Vec<Point>>,
    pub series: Vec<RadarSeries>,
}

const GRID_LEVELS: [f64; 4] = [0.25, 0.5, 0.75, 1.0];
const RADIUS_RATIO: f64 = 0.35;
const LABEL_OFFSET: f64 = 28.0;

/// Overlay radar chart for `items` in a `size` x `size` viewport.
pub fn radar(items: &[&Capability], size: f64) -> RadarChart {
    let center = Point { x: size / 2.0, y: size / 2.0 };
    let max_radius = size * RADIUS_RATIO;
    let total = Dimension::ALL.len();

    let axes = Dimension::ALL
        .iter()
        .enumerate()
        .map(|(i, &dimension)| RadarAxis {
            dimension,
            end: polar_to_cartesian(center, max_radius, i, total),
            label_at: polar_to_cartesian(center, max_radius + LABEL_OFFSET, i, total),
        })
        .collect();

    let grid = GRID_LEVELS
        .iter()
        .map(|level| {
            (0..total)
                .map(|i| polar_to_cartesian(center, max_radius * level, i, total))
                .collect()
        })
        .collect();

    let series = items
        .iter()
        .enumerate()
        .map(|(slot, item)| RadarSeries {
            slug: item.slug.clone(),
            slot,
            color: slot_color(slot),
            vertices: Dimension::ALL
                .iter()
                .enumerate()
                .map(|(i, &dim)| {
                    let ratio = item.scores.get(dim) / MAX_SCORE;
                    polar_to_cartesian(center, max_radius * ratio, i, total)
                })
                .collect(),
        })
        .collect();

    RadarChart { size, center, max_radius, axes, grid, series }
}
