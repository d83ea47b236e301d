//! Admin endpoints: login, catalog CRUD, order management, and the
//! read-side reporting layer (listings, CSV export, dashboard).

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use super::auth::{self, AdminClaims};
use super::ok;
use crate::domain::Money;
use crate::error::{ApiError, ApiResult};
use crate::report;
use crate::state::AppState;
use crate::store::audit::{self, AuditAction};
use crate::store::orders::{self, OrderFilter, OrderStatus};
use crate::store::products::{self, NewProduct};
use crate::store::transactions::{self, TransactionFilter};
use crate::store::users::{self, UserFilter};
use crate::store::{admins, clamp_paging};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    req.validate()?;
    let admin = admins::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".to_string()))?;
    if !auth::verify_password(&req.password, &admin.password_hash)? {
        return Err(ApiError::Unauthorized("invalid credentials".to_string()));
    }
    let token = auth::issue_token(&admin, &state.config.jwt_secret)?;
    audit::record(
        &state.db,
        AuditAction::AdminLogin,
        &admin.email,
        "admin",
        json!({ "adminId": admin.id }),
    )
    .await;
    Ok(Json(json!({
        "success": true,
        "token": token,
        "admin": {
            "id": admin.id,
            "email": admin.email,
            "name": admin.name,
            "role": admin.role,
        },
    })))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: String,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl ProductRequest {
    fn to_new_product(&self) -> ApiResult<NewProduct> {
        let price = Money::new(self.price, "KES")
            .map_err(|_| ApiError::Validation("price must not be negative".to_string()))?;
        if self.stock < 0 {
            return Err(ApiError::Validation("stock must not be negative".to_string()));
        }
        Ok(NewProduct {
            name: self.name.clone(),
            brand: self.brand.clone(),
            description: self.description.clone(),
            price: price.amount(),
            category: self.category.parse().map_err(ApiError::Validation)?,
            stock: self.stock,
            sizes: self.sizes.clone(),
            colors: self.colors.clone(),
            images: self.images.clone(),
        })
    }
}

pub async fn create_product(
    claims: AdminClaims,
    State(state): State<AppState>,
    Json(req): Json<ProductRequest>,
) -> ApiResult<Json<Value>> {
    req.validate()?;
    let product = products::create(&state.db, &req.to_new_product()?).await?;
    audit::record(
        &state.db,
        AuditAction::ProductCreated,
        &claims.email,
        "admin",
        json!({ "productId": product.id, "name": product.name }),
    )
    .await;
    Ok(ok(product))
}

pub async fn update_product(
    claims: AdminClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProductRequest>,
) -> ApiResult<Json<Value>> {
    req.validate()?;
    let product = products::update(&state.db, id, &req.to_new_product()?)
        .await?
        .ok_or(ApiError::NotFound("product"))?;
    audit::record(
        &state.db,
        AuditAction::ProductUpdated,
        &claims.email,
        "admin",
        json!({ "productId": id }),
    )
    .await;
    Ok(ok(product))
}

pub async fn delete_product(
    claims: AdminClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    if !products::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("product"));
    }
    audit::record(
        &state.db,
        AuditAction::ProductDeleted,
        &claims.email,
        "admin",
        json!({ "productId": id }),
    )
    .await;
    Ok(ok(json!({ "deleted": true })))
}

/// Shared admin listing query params. Date bounds are calendar days,
/// inclusive on both ends.
#[derive(Debug, Deserialize)]
pub struct AdminListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub method: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl AdminListParams {
    fn transaction_filter(&self) -> TransactionFilter {
        let (page, limit) = clamp_paging(self.page, self.limit);
        TransactionFilter {
            search: self.search.clone(),
            status: self.status.clone(),
            method: self.method.clone(),
            from: self.from.map(report::day_start),
            to: self.to.map(report::day_after),
            page,
            limit,
        }
    }
}

pub async fn list_orders(
    _claims: AdminClaims,
    State(state): State<AppState>,
    Query(params): Query<AdminListParams>,
) -> ApiResult<Json<Value>> {
    let (page, limit) = clamp_paging(params.page, params.limit);
    let result = orders::list(
        &state.db,
        &OrderFilter {
            status: params.status,
            from: params.from.map(report::day_start),
            to: params.to.map(report::day_after),
            page,
            limit,
        },
    )
    .await?;
    Ok(ok(result))
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

pub async fn update_order_status(
    claims: AdminClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> ApiResult<Json<Value>> {
    let status: OrderStatus = req.status.parse().map_err(ApiError::Validation)?;
    let order = orders::update_status(&state.db, id, status)
        .await?
        .ok_or(ApiError::NotFound("order"))?;
    audit::record(
        &state.db,
        AuditAction::OrderStatusChanged,
        &claims.email,
        "admin",
        json!({ "orderId": id, "status": status.as_str() }),
    )
    .await;
    Ok(ok(order))
}

pub async fn list_users(
    _claims: AdminClaims,
    State(state): State<AppState>,
    Query(params): Query<AdminListParams>,
) -> ApiResult<Json<Value>> {
    let (page, limit) = clamp_paging(params.page, params.limit);
    let result = users::list(
        &state.db,
        &UserFilter {
            search: params.search,
            page,
            limit,
        },
    )
    .await?;
    Ok(ok(result))
}

pub async fn list_transactions(
    _claims: AdminClaims,
    State(state): State<AppState>,
    Query(params): Query<AdminListParams>,
) -> ApiResult<Json<Value>> {
    let result = transactions::list(&state.db, &params.transaction_filter()).await?;
    Ok(ok(result))
}

pub async fn export_transactions(
    _claims: AdminClaims,
    State(state): State<AppState>,
    Query(params): Query<AdminListParams>,
) -> ApiResult<impl IntoResponse> {
    let rows = transactions::export(&state.db, &params.transaction_filter()).await?;
    let csv = report::transactions_csv(&rows);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"transactions.csv\"",
            ),
        ],
        csv,
    ))
}

pub async fn dashboard(
    _claims: AdminClaims,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let product_count = products::count(&state.db).await?;
    let user_count = users::count(&state.db).await?;
    let order_count = orders::count(&state.db).await?;
    let transaction_count = transactions::count(&state.db).await?;
    let by_status = transactions::status_summary(&state.db).await?;
    let revenue = report::daily_revenue(&transactions::revenue_window(&state.db, 7).await?);

    Ok(ok(json!({
        "counts": {
            "products": product_count,
            "users": user_count,
            "orders": order_count,
            "transactions": transaction_count,
        },
        "transactionsByStatus": by_status,
        "revenueLast7Days": revenue,
    })))
}
