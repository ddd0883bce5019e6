use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

use crate::api::ApiError;
use crate::state::AppState;

use super::types::*;
use super::{error_response, resolve_locale};

/// Public profile. Any backend failure reads as "user not found", whether
/// the user is missing or the backend is unreachable.
pub(super) async fn user_profile(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Query(params): Query<LangQuery>,
) -> Response {
    let locale = resolve_locale(&state, params.lang.as_deref());
    match state.api.user_profile(&username).await {
        Ok(profile) => Json(profile).into_response(),
        Err(e) => {
            if !matches!(e, ApiError::NotFound { .. }) {
                tracing::warn!(%username, error = %e, "profile lookup failed");
            }
            error_response(StatusCode::NOT_FOUND, locale.user_not_found())
        }
    }
}

pub(super) async fn comments(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Response {
    match state.api.comments(&slug).await {
        Ok(list) => Json(list).into_response(),
        Err(ApiError::NotFound { detail }) => error_response(StatusCode::NOT_FOUND, detail),
        Err(e) => {
            tracing::warn!(%slug, error = %e, "comment fetch failed");
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}
