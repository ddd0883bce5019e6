//! Read-only HTTP surface over the catalog, plus public proxies to the
//! user-data backend.

mod catalog_routes;
mod social_routes;
mod types;

use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::i18n::Locale;
use crate::state::AppState;

/// `{"error": msg}` with the given status.
fn error_response(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({"error": msg.into()}))).into_response()
}

/// `lang` query parameter, falling back to the configured locale when absent
/// or unsupported.
fn resolve_locale(state: &AppState, lang: Option<&str>) -> Locale {
    lang.and_then(|l| l.parse().ok()).unwrap_or(state.config.locale)
}

/// Build the router (exposed for testing).
pub fn build_router(state: Arc<AppState>) -> Router {
    // Public read-only data: any origin may GET.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/health", get(catalog_routes::health))
        // Catalog
        .route("/api/capabilities", get(catalog_routes::list_capabilities))
        .route("/api/capabilities/{*slug}", get(catalog_routes::get_capability))
        .route("/api/similar/{*slug}", get(catalog_routes::similar))
        .route("/api/categories", get(catalog_routes::categories))
        .route("/api/stats", get(catalog_routes::stats))
        .route("/api/trending", get(catalog_routes::trending))
        .route("/api/compare", get(catalog_routes::compare_view))
        .route("/api/compare/candidates", get(catalog_routes::compare_candidates))
        .route("/api/admin/overview", get(catalog_routes::admin_overview))
        // Backend proxies
        .route("/api/users/{username}", get(social_routes::user_profile))
        .route("/api/comments/{*slug}", get(social_routes::comments))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind the configured address and serve until ctrl-c.
pub async fn serve(state: Arc<AppState>) -> Result<(), String> {
    let bind = state.config.bind.clone();
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| format!("Invalid bind address \"{bind}\": {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind {addr}: {e}"))?;
    let local = listener
        .local_addr()
        .map_err(|e| format!("Failed to get local address: {e}"))?;
    tracing::info!(addr = %local, capabilities = state.catalog.len(), "HTTP API listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("HTTP server error: {e}"))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::cap;
    use crate::catalog::Catalog;
    use crate::config::AppConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn sample_catalog() -> Catalog {
        let mut git = cap("git-mcp", "GitMCP", "development", 8.5);
        git.stars = 120;
        git.scores.reliability = 9.0;
        git.last_updated = "2025-03-01T00:00:00Z".into();
        git.language = Some("TypeScript".into());
        let mut browse = cap("owner/gitbrowse", "GitBrowse", "web", 7.0);
        browse.stars = 900;
        browse.scores.reliability = 9.0;
        browse.last_updated = "2025-04-01T00:00:00Z".into();
        let mut lab = cap("gitlab-tools", "Lab Tools", "development", 8.0);
        lab.description = "Manage issues".into();
        lab.stars = 40;
        let odd = cap("mystery", "Mystery", "unknown-cat", 2.5);
        Catalog::new(vec![git, browse, lab, odd])
    }

    fn test_state_with(api_url: &str) -> Arc<AppState> {
        let config = AppConfig { api_url: api_url.to_string(), ..AppConfig::default() };
        Arc::new(AppState::new(Arc::new(sample_catalog()), config).unwrap())
    }

    fn test_state() -> Arc<AppState> {
        test_state_with("http://127.0.0.1:9")
    }

    async fn get_json(state: Arc<AppState>, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = build_router(state)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn slugs(items: &serde_json::Value) -> Vec<String> {
        items
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["slug"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json) = get_json(test_state(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ok"], true);
        assert_eq!(json["capabilities"], 4);
    }

    #[tokio::test]
    async fn test_search_matches_name_in_dataset_order() {
        let (status, json) = get_json(test_state(), "/api/capabilities?q=git&sort=score").await;
        assert_eq!(status, StatusCode::OK);
        // "Lab Tools" has "git" only in its slug, which the search page ignores.
        assert_eq!(slugs(&json["items"]), vec!["git-mcp", "owner/gitbrowse"]);
        assert_eq!(json["total"], 2);
        assert_eq!(json["query"], "git");
    }

    #[tokio::test]
    async fn test_search_blank_query_is_empty_but_home_lists_all() {
        let (_, search) = get_json(test_state(), "/api/capabilities").await;
        assert_eq!(search["total"], 0);
        let (_, home) = get_json(test_state(), "/api/capabilities?page=home&sort=stars&limit=2").await;
        assert_eq!(home["total"], 4);
        assert_eq!(home["has_more"], true);
        assert_eq!(slugs(&home["items"]), vec!["owner/gitbrowse", "git-mcp"]);
    }

    #[tokio::test]
    async fn test_search_category_filter_and_labels() {
        let (_, json) = get_json(
            test_state(),
            "/api/capabilities?page=home&category=development&lang=en",
        )
        .await;
        assert_eq!(slugs(&json["items"]), vec!["git-mcp", "gitlab-tools"]);
        assert_eq!(json["items"][0]["category_label"], "Development");
        assert_eq!(json["category"], "development");
    }

    #[tokio::test]
    async fn test_search_unknown_page_is_bad_request() {
        let (status, json) = get_json(test_state(), "/api/capabilities?page=admin").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("admin"));
    }

    #[tokio::test]
    async fn test_capability_detail_with_slash_slug() {
        let (status, json) = get_json(test_state(), "/api/capabilities/owner/gitbrowse").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "GitBrowse");
        // Default locale is Chinese.
        assert_eq!(json["category_label"], "网页与搜索");

        let (status, json) = get_json(test_state(), "/api/capabilities/owner%2Fgitbrowse").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["slug"], "owner/gitbrowse");
    }

    #[tokio::test]
    async fn test_capability_not_found_404() {
        let (status, _) = get_json(test_state(), "/api/capabilities/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_category_label_falls_back() {
        let (_, json) = get_json(test_state(), "/api/capabilities/mystery?lang=en").await;
        assert_eq!(json["category_label"], "unknown-cat");
    }

    #[tokio::test]
    async fn test_similar_same_category_closest_first() {
        let (status, json) = get_json(test_state(), "/api/similar/git-mcp").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(slugs(&json), vec!["gitlab-tools"]);
    }

    #[tokio::test]
    async fn test_categories_only_active_known_ones() {
        let (_, json) = get_json(test_state(), "/api/categories?lang=en").await;
        let keys: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["category"].as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["development", "web"]);
        assert_eq!(json[0]["count"], 2);
    }

    #[tokio::test]
    async fn test_stats_distributions_cover_every_record() {
        let (_, json) = get_json(test_state(), "/api/stats").await;
        assert_eq!(json["total"], 4);
        let sum = |key: &str| -> u64 {
            json[key].as_array().unwrap().iter().map(|b| b["count"].as_u64().unwrap()).sum()
        };
        assert_eq!(sum("categories"), 4);
        assert_eq!(sum("score_buckets"), 4);
        assert_eq!(sum("languages"), 4);
        assert_eq!(json["categories"][0]["category"], "development");
    }

    #[tokio::test]
    async fn test_stats_headline_numbers() {
        let (_, json) = get_json(test_state(), "/api/stats").await;
        assert_eq!(json["category_count"], 3);
        assert_eq!(json["has_tests"], 0);
        assert_eq!(json["has_tests_percentage"], 0);
        assert!((json["avg_score"].as_f64().unwrap() - 26.0 / 4.0).abs() < 1e-9);
        assert_eq!(
            slugs(&json["top_scored"]),
            vec!["git-mcp", "gitlab-tools", "owner/gitbrowse", "mystery"]
        );
        assert_eq!(slugs(&json["recently_updated"])[..2], ["owner/gitbrowse", "git-mcp"]);
    }

    #[tokio::test]
    async fn test_trending() {
        let (_, json) = get_json(test_state(), "/api/trending?limit=2").await;
        assert_eq!(slugs(&json["top_starred"]), vec!["owner/gitbrowse", "git-mcp"]);
        assert_eq!(slugs(&json["recently_updated"]), vec!["owner/gitbrowse", "git-mcp"]);
    }

    #[tokio::test]
    async fn test_compare_winners_and_missing() {
        let (status, json) =
            get_json(test_state(), "/api/compare?slugs=git-mcp,owner%2Fgitbrowse,ghost").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["missing"], serde_json::json!(["ghost"]));
        assert_eq!(slugs(&json["items"]), vec!["git-mcp", "owner/gitbrowse"]);
        let reliability = json["winners"]
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["metric"] == "reliability")
            .unwrap();
        assert_eq!(reliability["winners"], serde_json::json!([true, true]));
        assert_eq!(json["radar"]["series"].as_array().unwrap().len(), 2);
        assert_eq!(json["radar"]["series"][1]["color"]["stroke"], "#10B981");
    }

    #[tokio::test]
    async fn test_compare_caps_at_four() {
        let (_, json) = get_json(test_state(), "/api/compare?slugs=a,b,c,d,e").await;
        assert_eq!(json["slugs"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_compare_candidates_exclude_selected() {
        let (_, json) =
            get_json(test_state(), "/api/compare/candidates?slugs=git-mcp&q=git").await;
        assert_eq!(slugs(&json), vec!["owner/gitbrowse", "gitlab-tools"]);
    }

    #[tokio::test]
    async fn test_admin_overview() {
        let (_, json) = get_json(test_state(), "/api/admin/overview").await;
        assert_eq!(json["total"], 4);
        assert_eq!(json["last_updated"], "2025-04-01T00:00:00Z");
        assert_eq!(json["low_score"][0]["slug"], "mystery");
        assert_eq!(json["missing_repo_url"], 4);
    }

    #[tokio::test]
    async fn test_empty_catalog_serves_empty_results() {
        let state = Arc::new(AppState::new(Arc::new(Catalog::empty()), AppConfig::default()).unwrap());
        let (_, stats) = get_json(state.clone(), "/api/stats").await;
        assert_eq!(stats["total"], 0);
        assert_eq!(stats["categories"], serde_json::json!([]));
        let (_, home) = get_json(state, "/api/capabilities?page=home").await;
        assert_eq!(home["items"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_profile_proxy_passes_through() {
        let mut backend = mockito::Server::new_async().await;
        backend
            .mock("GET", "/api/v1/users/alice/profile")
            .with_body(r#"{"username": "alice", "created_at": "2025-01-01", "stats": {"favorites": 2, "comments": 1, "submissions": 0}}"#)
            .create_async()
            .await;

        let (status, json) = get_json(test_state_with(&backend.url()), "/api/users/alice").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["stats"]["favorites"], 2);
    }

    #[tokio::test]
    async fn test_profile_any_failure_is_user_not_found() {
        let mut backend = mockito::Server::new_async().await;
        backend
            .mock("GET", "/api/v1/users/bob/profile")
            .with_status(500)
            .create_async()
            .await;

        let state = test_state_with(&backend.url());
        let (status, json) = get_json(state.clone(), "/api/users/bob?lang=en").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "User not found");

        // Unreachable backend reads the same way.
        let (status, _) = get_json(test_state(), "/api/users/bob").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_comments_proxy() {
        let mut backend = mockito::Server::new_async().await;
        backend
            .mock("GET", "/api/v1/comments/owner%2Fgitbrowse")
            .with_body(r#"{"comments": [], "total": 0, "avg_rating": 0}"#)
            .create_async()
            .await;

        let (status, json) =
            get_json(test_state_with(&backend.url()), "/api/comments/owner/gitbrowse").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 0);

        let (status, _) = get_json(test_state(), "/api/comments/x").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn locale_resolution_falls_back_to_config() {
        let state = test_state();
        assert_eq!(resolve_locale(&state, Some("en")), Locale::En);
        assert_eq!(resolve_locale(&state, Some("fr")), Locale::Zh);
        assert_eq!(resolve_locale(&state, None), Locale::Zh);
    }
}
