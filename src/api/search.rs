use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_cookies::Cookies;

use category_search_backend::models::{SearchQuery, SearchResult};

use crate::api::ApiResponse;
use crate::auth::{current_uid, require_admin};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub paginate: Option<bool>,
    #[serde(default)]
    pub hard_cap: Option<usize>,
    #[serde(default)]
    pub results_per_page: Option<usize>,
    #[serde(default)]
    pub qs: Option<String>,
}

impl SearchParams {
    fn into_query(self, uid: i64) -> SearchQuery {
        let defaults = SearchQuery::default();
        SearchQuery {
            query: self.query.unwrap_or_default(),
            page: self.page.unwrap_or(defaults.page),
            uid,
            paginate: self.paginate.unwrap_or(defaults.paginate),
            hard_cap: self.hard_cap,
            results_per_page: self.results_per_page,
            qs: self.qs,
            extra: defaults.extra,
        }
    }
}

/// GET /api/categories/search - 分类搜索
pub async fn search_categories(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Query(params): Query<SearchParams>,
) -> (StatusCode, Json<ApiResponse<SearchResult>>) {
    let uid = match current_uid(&state.db, &cookies).await {
        Ok(uid) => uid,
        Err(e) => {
            tracing::error!("Session lookup failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failure(500, "验证session失败")),
            );
        }
    };

    match state.search.search(params.into_query(uid)).await {
        Ok(result) => (StatusCode::OK, Json(ApiResponse::success(result))),
        Err(e) => {
            tracing::error!("Category search failed for uid {}: {}", uid, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failure(500, &format!("搜索失败: {}", e))),
            )
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RebuildResponse {
    pub indexed: u64,
}

/// POST /api/admin/categories/index/rebuild - 重建分类名称索引
pub async fn rebuild_index(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> (StatusCode, Json<ApiResponse<RebuildResponse>>) {
    let uid = match require_admin(&state, &cookies).await {
        Ok(uid) => uid,
        Err((status, Json(body))) => {
            return (status, Json(ApiResponse::failure(body.code, &body.message)));
        }
    };

    match state.forum.rebuild_name_index().await {
        Ok(indexed) => {
            tracing::info!("Category name index rebuilt by uid {}", uid);
            (StatusCode::OK, Json(ApiResponse::success(RebuildResponse { indexed })))
        }
        Err(e) => {
            tracing::error!("Failed to rebuild category name index: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failure(500, &format!("重建索引失败: {}", e))),
            )
        }
    }
}
