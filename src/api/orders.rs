//! Order endpoints. Line items are snapshotted at creation; the order
//! total is the sum of snapshot prices and is never recomputed.

use axum::extract::{Path, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::ok;
use crate::domain::Money;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::audit::{self, AuditAction};
use crate::store::orders::{self, NewOrderItem};
use crate::store::products;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1, message = "order must have at least one item"))]
    pub items: Vec<OrderItemRequest>,
    pub payment_method: String,
    pub payment_reference: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    /// Client-confirmed snapshot price, copied onto the order item.
    pub price: Decimal,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    req.validate()?;
    for item in &req.items {
        if item.quantity < 1 {
            return Err(ApiError::Validation("quantity must be positive".to_string()));
        }
        Money::new(item.price, "KES")
            .map_err(|_| ApiError::Validation("price must not be negative".to_string()))?;
    }

    let ids: Vec<Uuid> = req.items.iter().map(|i| i.product_id).collect();
    let known = products::get_many(&state.db, &ids).await?;
    let items: Vec<NewOrderItem> = req
        .items
        .iter()
        .map(|item| {
            let product = known
                .iter()
                .find(|p| p.id == item.product_id)
                .ok_or(ApiError::NotFound("product"))?;
            Ok(NewOrderItem {
                product_id: item.product_id,
                name: product.name.clone(),
                price: item.price,
                quantity: item.quantity,
                size: item.size.clone(),
                color: item.color.clone(),
            })
        })
        .collect::<ApiResult<_>>()?;

    let (order, item_rows) = orders::create(
        &state.db,
        req.user_id,
        &items,
        &req.payment_method,
        req.payment_reference.as_deref(),
    )
    .await?;

    audit::record(
        &state.db,
        AuditAction::OrderCreated,
        &req.user_id.to_string(),
        "customer",
        json!({ "orderId": order.id, "totalAmount": order.total_amount }),
    )
    .await;

    Ok(ok(json!({ "order": order, "items": item_rows })))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let (order, items) = orders::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("order"))?;
    Ok(ok(json!({ "order": order, "items": items })))
}

pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let orders = orders::list_for_user(&state.db, user_id).await?;
    Ok(ok(orders))
}
