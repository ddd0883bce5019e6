//! Wire types of the user-data backend.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActionResponse {
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub slug: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteList {
    #[serde(default)]
    pub favorites: Vec<FavoriteEntry>,
    #[serde(default)]
    pub total: usize,
}

impl FavoriteList {
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.favorites.iter().map(|f| f.slug.as_str())
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.slugs().any(|s| s == slug)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct NewComment<'a> {
    pub content: &'a str,
    pub rating: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub capability_slug: String,
    pub content: String,
    pub rating: u8,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub likes_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentList {
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub total: usize,
    /// Mean rating rounded to one decimal, 0 without comments.
    #[serde(default)]
    pub avg_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggle {
    pub action: String,
    pub likes_count: u64,
}

impl LikeToggle {
    pub fn liked(&self) -> bool {
        self.action == "liked"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileStats {
    pub favorites: u64,
    pub comments: u64,
    pub submissions: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileComment {
    pub slug: String,
    pub content: String,
    pub rating: u8,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileFavorite {
    pub slug: String,
    pub name: String,
    pub overall_score: f64,
    pub created_at: String,
}

/// Public profile, readable without logging in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub username: String,
    pub created_at: String,
    pub stats: ProfileStats,
    pub recent_comments: Vec<ProfileComment>,
    pub recent_favorites: Vec<ProfileFavorite>,
}
