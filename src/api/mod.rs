//! Remote data client for the user-data backend (auth, favorites, comments,
//! profiles).
//!
//! One `ApiClient` per process, sharing an injected [`Session`]. There is no
//! retry: every failure becomes an [`ApiError`] for the caller to surface.

pub mod session;
pub mod types;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::catalog::{Capability, Catalog};

pub use session::Session;
pub use types::{
    Comment, CommentList, FavoriteEntry, FavoriteList, LikeToggle, ProfileComment,
    ProfileFavorite, ProfileStats, User, UserProfile,
};
use types::{ActionResponse, Credentials, NewComment, TokenResponse};

/// Backend length limit for comment bodies, in characters.
pub const MAX_COMMENT_CHARS: usize = 1000;
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;
const USERNAME_CHARS: std::ops::RangeInclusive<usize> = 2..=32;
const PASSWORD_CHARS: std::ops::RangeInclusive<usize> = 6..=128;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Rejected before any request was sent.
    Validation(String),
    /// The call needs a logged-in session and there is none.
    LoginRequired,
    /// 401/403 on a call that carried no token (e.g. wrong password).
    Auth { detail: String },
    /// 401 on a call that carried a token; the session has been cleared.
    SessionExpired,
    NotFound { detail: String },
    /// Any other non-success status.
    Http { status: u16, detail: String },
    /// Connection, timeout or body read failure.
    Network(String),
    /// Success status but the body did not match the expected shape.
    Decode(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(msg) => write!(f, "Invalid input: {msg}"),
            ApiError::LoginRequired => write!(f, "Login required"),
            ApiError::Auth { detail } => write!(f, "Auth error: {detail}"),
            ApiError::SessionExpired => write!(f, "Session expired, please log in again"),
            ApiError::NotFound { detail } => write!(f, "Not found: {detail}"),
            ApiError::Http { status, detail } => write!(f, "HTTP {status}: {detail}"),
            ApiError::Network(msg) => write!(f, "Network error: {msg}"),
            ApiError::Decode(msg) => write!(f, "Unexpected response: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Extract the human-readable `detail` from an error body. Plain strings are
/// used as-is; validation error arrays yield their first `msg`.
fn error_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(|msg| msg.as_str())
            .map(str::to_string),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Arc<Session>, timeout: Duration) -> Result<Self, String> {
        let base = Url::parse(base_url).map_err(|e| format!("Invalid API URL \"{base_url}\": {e}"))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(format!("Invalid API URL \"{base_url}\": expected http or https"));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {e}"))?;
        Ok(Self { http, base, session })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// `<base>/api/v1/<segments..>`, each segment percent-encoded so slugs
    /// containing `/` stay a single segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // http(s) URLs always have a path, checked in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "v1"]).extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.http.request(method, self.endpoint(segments))
    }

    /// Send with the session token when one exists. A 401 on a request that
    /// carried a token clears that session.
    async fn send(&self, builder: RequestBuilder, fallback: &str) -> Result<Response, ApiError> {
        let token = self.session.token();
        let builder = match &token {
            Some(t) => builder.bearer_auth(t),
            None => builder,
        };
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("{fallback}: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED && let Some(t) = &token {
            if self.session.clear_if(t) {
                tracing::info!("backend rejected session token, logged out");
            }
            return Err(ApiError::SessionExpired);
        }

        let body = response.bytes().await.unwrap_or_default();
        let detail = error_detail(&body).unwrap_or_else(|| fallback.to_string());
        tracing::debug!(status = status.as_u16(), %detail, "backend call failed");
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Auth { detail },
            StatusCode::NOT_FOUND => ApiError::NotFound { detail },
            _ => ApiError::Http { status: status.as_u16(), detail },
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let response = self.send(builder, fallback).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read response body: {e}")))?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(format!("{fallback}: {e}")))
    }

    fn require_login(&self) -> Result<(), ApiError> {
        if self.session.is_logged_in() { Ok(()) } else { Err(ApiError::LoginRequired) }
    }

    // -- Auth --

    pub async fn login(&self, username: &str, password: &str) -> Result<User, ApiError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Validation("username and password are required".into()));
        }
        self.authenticate("login", username, password, "Login failed").await
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<User, ApiError> {
        if !USERNAME_CHARS.contains(&username.chars().count()) {
            return Err(ApiError::Validation(format!(
                "username must be {}-{} characters",
                USERNAME_CHARS.start(),
                USERNAME_CHARS.end()
            )));
        }
        if !PASSWORD_CHARS.contains(&password.chars().count()) {
            return Err(ApiError::Validation(format!(
                "password must be {}-{} characters",
                PASSWORD_CHARS.start(),
                PASSWORD_CHARS.end()
            )));
        }
        self.authenticate("register", username, password, "Registration failed").await
    }

    /// Exchange credentials for a token, store it, then populate the session
    /// user from `users/me`. If that lookup fails the session is dropped so
    /// it never holds a token without a user.
    async fn authenticate(
        &self,
        action: &str,
        username: &str,
        password: &str,
        fallback: &str,
    ) -> Result<User, ApiError> {
        // Credentials are exchanged without any stale token attached.
        self.session.clear();
        let body = Credentials { username, password };
        let token: TokenResponse = self
            .send_json(self.request(Method::POST, &["auth", action]).json(&body), fallback)
            .await?;
        self.session.set_token(token.access_token);

        match self.current_user().await {
            Ok(user) => {
                self.session.set_user(user.clone());
                tracing::info!(username = %user.username, "logged in");
                Ok(user)
            }
            Err(e) => {
                self.session.clear();
                Err(e)
            }
        }
    }

    pub fn logout(&self) {
        self.session.clear();
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.require_login()?;
        self.send_json(self.request(Method::GET, &["users", "me"]), "Failed to fetch user")
            .await
    }

    /// Public profile. Every failure, including network errors, is reported
    /// to the caller unchanged; mapping to "user not found" is a view policy.
    pub async fn user_profile(&self, username: &str) -> Result<UserProfile, ApiError> {
        self.send_json(
            self.request(Method::GET, &["users", username, "profile"]),
            "Failed to fetch user profile",
        )
        .await
    }

    // -- Favorites --

    /// Flip the favorite flag of `slug`; returns the new state.
    pub async fn toggle_favorite(&self, slug: &str) -> Result<bool, ApiError> {
        self.require_login()?;
        let resp: ActionResponse = self
            .send_json(self.request(Method::POST, &["favorites", slug]), "Favorite update failed")
            .await?;
        Ok(resp.action == "favorited")
    }

    pub async fn favorites(&self) -> Result<FavoriteList, ApiError> {
        self.require_login()?;
        self.send_json(self.request(Method::GET, &["favorites"]), "Failed to fetch favorites")
            .await
    }

    /// The favorites page: the user's favorite list joined to the catalog.
    pub async fn favorite_records<'a>(&self, catalog: &'a Catalog) -> Result<Vec<&'a Capability>, ApiError> {
        let list = self.favorites().await?;
        Ok(favorite_capabilities(catalog, &list))
    }

    /// Background probe for the favorite button's initial state. Logged out
    /// or failing calls read as "not favorited".
    pub async fn is_favorited(&self, slug: &str) -> bool {
        if !self.session.is_logged_in() {
            return false;
        }
        match self.favorites().await {
            Ok(list) => list.contains(slug),
            Err(e) => {
                tracing::debug!(%slug, error = %e, "favorite probe failed");
                false
            }
        }
    }

    /// Favorite button press: the new state on success, `current` unchanged
    /// on failure (logged, not surfaced).
    pub async fn press_favorite(&self, slug: &str, current: bool) -> bool {
        match self.toggle_favorite(slug).await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(%slug, error = %e, "favorite toggle failed");
                current
            }
        }
    }

    // -- Comments --

    pub async fn post_comment(&self, slug: &str, content: &str, rating: u8) -> Result<Comment, ApiError> {
        let content = validate_comment(content, rating)?;
        self.require_login()?;
        let body = NewComment { content, rating };
        self.send_json(
            self.request(Method::POST, &["comments", slug]).json(&body),
            "Failed to post comment",
        )
        .await
    }

    pub async fn comments(&self, slug: &str) -> Result<CommentList, ApiError> {
        self.send_json(self.request(Method::GET, &["comments", slug]), "Failed to fetch comments")
            .await
    }

    pub async fn toggle_comment_like(&self, comment_id: i64) -> Result<LikeToggle, ApiError> {
        self.require_login()?;
        let id = comment_id.to_string();
        self.send_json(
            self.request(Method::POST, &["comments", &id, "like"]),
            "Like update failed",
        )
        .await
    }
}

/// Catalog records whose slug is in `list`, in catalog order. Favorites of
/// slugs the catalog no longer carries are skipped.
pub fn favorite_capabilities<'a>(catalog: &'a Catalog, list: &FavoriteList) -> Vec<&'a Capability> {
    let wanted: HashSet<&str> = list.slugs().collect();
    catalog
        .all()
        .iter()
        .filter(|c| wanted.contains(c.slug.as_str()))
        .collect()
}

/// Trimmed comment body, or the reason it cannot be posted.
fn validate_comment(content: &str, rating: u8) -> Result<&str, ApiError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ApiError::Validation("comment must not be empty".into()));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(ApiError::Validation(format!(
            "comment must be at most {MAX_COMMENT_CHARS} characters"
        )));
    }
    if !RATING_RANGE.contains(&rating) {
        return Err(ApiError::Validation(format!(
            "rating must be between {} and {}",
            RATING_RANGE.start(),
            RATING_RANGE.end()
        )));
    }
    Ok(content)
}

// ---------------------------------------------------------------------------
// Comment draft
// ---------------------------------------------------------------------------

/// Comment form state. The text survives a failed submit and is cleared
/// only once the backend accepted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    pub text: String,
    pub rating: u8,
}

impl Default for CommentDraft {
    fn default() -> Self {
        Self { text: String::new(), rating: *RATING_RANGE.end() }
    }
}

impl CommentDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post the draft, then re-fetch the thread.
    pub async fn submit(&mut self, client: &ApiClient, slug: &str) -> Result<CommentList, ApiError> {
        client.post_comment(slug, &self.text, self.rating).await?;
        *self = Self::default();
        client.comments(slug).await
    }
}
