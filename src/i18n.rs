//! Locale selection and the small label tables the engine needs.
//!
//! Full UI string tables live with the front-end; only labels that flow
//! through derived data (category names, score dimensions, notices) are here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::catalog::Dimension;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Zh,
    En,
}

impl FromStr for Locale {
    type Err = String;

    /// Accepts `zh`, `en` and region-tagged forms such as `zh-CN` or `en_US`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let lang = lower.split(['-', '_']).next().unwrap_or_default();
        match lang {
            "zh" => Ok(Locale::Zh),
            "en" => Ok(Locale::En),
            _ => Err(format!("Unsupported locale \"{s}\"; expected zh or en")),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Locale::Zh => "zh",
            Locale::En => "en",
        })
    }
}

/// Known categories, in display order: (key, English label, Chinese label).
const CATEGORIES: &[(&str, &str, &str)] = &[
    ("development", "Development", "开发工具"),
    ("data", "Data & Database", "数据与数据库"),
    ("web", "Web & Search", "网页与搜索"),
    ("productivity", "Productivity", "效率工具"),
    ("ai", "AI & LLM", "AI 与大模型"),
    ("media", "Design & Media", "设计与媒体"),
    ("trading", "Trading & Finance", "交易与金融"),
    ("communication", "Communication", "通讯协作"),
];

/// Category keys of the label table, in display order.
pub fn known_categories() -> impl Iterator<Item = &'static str> {
    CATEGORIES.iter().map(|(key, _, _)| *key)
}

impl Locale {
    /// Label for a category key. Keys missing from the table render as-is.
    pub fn category_label<'a>(self, key: &'a str) -> &'a str {
        match CATEGORIES.iter().find(|(k, _, _)| *k == key) {
            Some((_, en, zh)) => match self {
                Locale::En => *en,
                Locale::Zh => *zh,
            },
            None => key,
        }
    }

    pub fn dimension_label(self, dimension: Dimension) -> &'static str {
        match (self, dimension) {
            (Locale::Zh, Dimension::Reliability) => "可靠性",
            (Locale::Zh, Dimension::Safety) => "安全性",
            (Locale::Zh, Dimension::Capability) => "能力范围",
            (Locale::Zh, Dimension::Reputation) => "社区口碑",
            (Locale::Zh, Dimension::Usability) => "易用性",
            (Locale::En, Dimension::Reliability) => "Reliability",
            (Locale::En, Dimension::Safety) => "Safety",
            (Locale::En, Dimension::Capability) => "Capability",
            (Locale::En, Dimension::Reputation) => "Reputation",
            (Locale::En, Dimension::Usability) => "Usability",
        }
    }

    pub fn overall_label(self) -> &'static str {
        match self {
            Locale::Zh => "综合评分",
            Locale::En => "Overall",
        }
    }

    pub fn compare_full_notice(self, limit: usize) -> String {
        match self {
            Locale::Zh => format!("最多只能对比 {limit} 个插件"),
            Locale::En => format!("You can compare at most {limit} plugins"),
        }
    }

    pub fn user_not_found(self) -> &'static str {
        match self {
            Locale::Zh => "用户不存在",
            Locale::En => "User not found",
        }
    }
}
