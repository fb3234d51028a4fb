use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tower_cookies::Cookies;

use super::types::SearchQuery;
use crate::api::ApiError;
use crate::auth::{get_user_context, Action, Decision};
use crate::i18n::{SEARCH_FAILED, SEARCH_FORBIDDEN, SEARCH_INVALID_QUERY};
use crate::search::{ScoredResult, SearchEndpoint, SearchError};
use crate::state::AppState;

/// GET /api/search?q= - ranked name + content search / 搜索笔记
pub async fn search(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<ScoredResult>>, ApiError> {
    let endpoint = SearchEndpoint::ranked(state.config.search.max_results);
    run_search(&state, &cookies, query, endpoint).await
}

/// GET /api/quick-search?q= - name results first, then content, small cap / 快速搜索
pub async fn quick_search(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<ScoredResult>>, ApiError> {
    let endpoint = SearchEndpoint::names_first(state.config.search.legacy_max_results);
    run_search(&state, &cookies, query, endpoint).await
}

async fn run_search(
    state: &AppState,
    cookies: &Cookies,
    query: Result<Query<SearchQuery>, QueryRejection>,
    endpoint: SearchEndpoint,
) -> Result<Json<Vec<ScoredResult>>, ApiError> {
    let user = get_user_context(cookies);
    if state.authorizer.authorize(&user, Action::Search).await == Decision::Deny {
        return Err(to_api_error(state, SearchError::Forbidden));
    }

    let q = match query {
        Ok(Query(params)) => params.q,
        Err(e) => {
            tracing::debug!("Rejected search query string: {}", e);
            None
        }
    };

    state
        .searcher
        .search(q.as_deref(), endpoint)
        .await
        .map(Json)
        .map_err(|e| to_api_error(state, e))
}

/// Map search failures to HTTP errors, diagnostics stay in the log / 错误映射
fn to_api_error(state: &AppState, error: SearchError) -> ApiError {
    let t = &state.translator;
    match error {
        SearchError::InvalidQuery(reason) => {
            tracing::debug!("Invalid search query: {}", reason);
            ApiError::new(StatusCode::BAD_REQUEST, t.translate(SEARCH_INVALID_QUERY, &[]))
        }
        SearchError::Forbidden => ApiError::new(StatusCode::FORBIDDEN, t.translate(SEARCH_FORBIDDEN, &[])),
        e @ (SearchError::Invocation { .. } | SearchError::Io(_)) => {
            tracing::error!("Search failed: {}", e);
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, t.translate(SEARCH_FAILED, &[]))
        }
    }
}
