use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

use crate::compare::{self, MAX_COMPARE};
use crate::derive::{self, HOME_PAGE, SEARCH_PAGE};
use crate::page_url::PageUrl;
use crate::state::AppState;
use crate::view_state::{ViewSettings, ViewState};

use super::types::*;
use super::{error_response, resolve_locale};

/// Upper bound for any `limit` parameter.
const MAX_LIMIT: usize = 200;
const SIMILAR_LIMIT: usize = 5;
const TRENDING_LIMIT: usize = 5;
const LANGUAGE_TOP_N: usize = 10;
const RADAR_SIZE: f64 = 300.0;

fn clamp_limit(limit: Option<usize>, default: usize) -> usize {
    limit.unwrap_or(default).clamp(1, MAX_LIMIT)
}

pub(super) async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse { ok: true, capabilities: state.catalog.len() })
}

/// Search / browse. `q`, `category` and `sort` are read from the URL exactly
/// as the page view reads them.
pub(super) async fn list_capabilities(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    Query(params): Query<SearchQuery>,
) -> Response {
    let scope = match params.page.as_deref() {
        None | Some("search") => SEARCH_PAGE,
        Some("home") => HOME_PAGE,
        Some(other) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("unknown page \"{other}\"; expected search or home"),
            );
        }
    };
    let url = match PageUrl::parse(&uri.to_string()) {
        Ok(u) => u,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };
    let locale = resolve_locale(&state, params.lang.as_deref());
    let settings = ViewSettings {
        page_size: clamp_limit(params.limit, state.config.page_size),
        ..state.config.view_settings()
    };
    let view = ViewState::new(url, settings);
    let page = view.results(&state.catalog, scope);

    Json(ResultsResponse {
        total: page.total,
        has_more: page.has_more,
        query: view.query(),
        category: view.category(),
        sort: view.sort(),
        items: CapabilityView::many(&page.items, locale),
    })
    .into_response()
}

pub(super) async fn get_capability(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(params): Query<LangQuery>,
) -> Response {
    let locale = resolve_locale(&state, params.lang.as_deref());
    match state.catalog.get(&slug) {
        Some(record) => Json(CapabilityView::new(record, locale)).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("capability \"{slug}\" not found")),
    }
}

pub(super) async fn similar(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(params): Query<LimitQuery>,
) -> Response {
    let locale = resolve_locale(&state, params.lang.as_deref());
    let Some(record) = state.catalog.get(&slug) else {
        return error_response(StatusCode::NOT_FOUND, format!("capability \"{slug}\" not found"));
    };
    let all = state.catalog.refs();
    let items = derive::similar_to(record, &all, clamp_limit(params.limit, SIMILAR_LIMIT));
    Json(CapabilityView::many(&items, locale)).into_response()
}

pub(super) async fn categories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LangQuery>,
) -> impl IntoResponse {
    let locale = resolve_locale(&state, params.lang.as_deref());
    Json(derive::active_categories(&state.catalog.refs(), locale))
}

pub(super) async fn stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LangQuery>,
) -> impl IntoResponse {
    let locale = resolve_locale(&state, params.lang.as_deref());
    let all = state.catalog.refs();
    Json(StatsResponse {
        summary: derive::catalog_summary(&all, derive::STATS_TOP_N),
        categories: derive::distribution_by_category(&all, locale),
        score_buckets: derive::distribution_by_score_bucket(&all),
        languages: derive::distribution_by_language(&all, LANGUAGE_TOP_N),
    })
}

pub(super) async fn trending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitQuery>,
) -> impl IntoResponse {
    let locale = resolve_locale(&state, params.lang.as_deref());
    let n = clamp_limit(params.limit, TRENDING_LIMIT);
    let all = state.catalog.refs();
    let top = derive::top_by_stars(&all, n);
    let recent = derive::recently_updated(&all, n);
    Json(TrendingResponse {
        top_starred: CapabilityView::many(&top, locale),
        recently_updated: CapabilityView::many(&recent, locale),
    })
    .into_response()
}

/// Side-by-side comparison of the `slugs` parameter (at most four).
pub(super) async fn compare_view(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    Query(params): Query<LangQuery>,
) -> Response {
    let url = match PageUrl::parse(&uri.to_string()) {
        Ok(u) => u,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };
    let locale = resolve_locale(&state, params.lang.as_deref());
    let selection = url.compare_slugs();
    let items = compare::resolve(&state.catalog, &selection);
    let missing = selection
        .slugs()
        .iter()
        .filter(|s| state.catalog.get(s).is_none())
        .cloned()
        .collect();

    Json(CompareResponse {
        slugs: selection.slugs().to_vec(),
        missing,
        winners: compare::winners(&items),
        radar: compare::radar(&items, RADAR_SIZE),
        items: CapabilityView::many(&items, locale),
    })
    .into_response()
}

/// Add-item dropdown of the compare page.
pub(super) async fn compare_candidates(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    Query(params): Query<PickerQuery>,
) -> Response {
    let url = match PageUrl::parse(&uri.to_string()) {
        Ok(u) => u,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };
    let selection = url.compare_slugs();
    if selection.len() >= MAX_COMPARE {
        return Json(Vec::<CapabilityView>::new()).into_response();
    }
    let locale = resolve_locale(&state, params.lang.as_deref());
    let hits = compare::picker_candidates(&state.catalog, &selection, params.q.as_deref().unwrap_or_default());
    Json(CapabilityView::many(&hits, locale)).into_response()
}

pub(super) async fn admin_overview(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LangQuery>,
) -> impl IntoResponse {
    let locale = resolve_locale(&state, params.lang.as_deref());
    Json(derive::catalog_health(&state.catalog.refs(), locale))
}
