//! Public product catalog endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::ok;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::products::{self, ProductFilter};
use crate::store::clamp_paging;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub category: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let (page, limit) = clamp_paging(params.page, params.limit);
    let category = params
        .category
        .as_deref()
        .map(str::parse)
        .transpose()
        .map_err(ApiError::Validation)?;
    let result = products::list(
        &state.db,
        &ProductFilter {
            search: params.search,
            category,
            page,
            limit,
        },
    )
    .await?;
    Ok(ok(result))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let product = products::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("product"))?;
    Ok(ok(product))
}
