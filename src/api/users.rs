//! Storefront user endpoints (lightweight account records; full auth
//! lives outside this service).

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::ok;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::users;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertUserRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
}

pub async fn upsert(
    State(state): State<AppState>,
    Json(req): Json<UpsertUserRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    req.validate()?;
    let user = users::upsert(&state.db, &req.name, &req.email, req.phone.as_deref()).await?;
    Ok(ok(user))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = users::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(ok(user))
}
