//! Cart endpoints. Every mutation goes through the domain aggregate so
//! the line-identity rule is applied in exactly one place.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::ok;
use crate::domain::cart::{Cart, CartLine};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::{carts, products};

fn cart_view(cart: &Cart) -> serde_json::Value {
    json!({
        "userId": cart.user_id(),
        "items": cart.lines(),
        "totalItems": cart.total_items(),
        "totalPrice": cart.total_price(),
    })
}

pub async fn get_cart(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let cart = carts::load(&state.db, user_id).await?;
    Ok(ok(cart_view(&cart)))
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}

pub async fn add_item(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<AddItemRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let product = products::get(&state.db, req.product_id)
        .await?
        .ok_or(ApiError::NotFound("product"))?;
    // Product fields are copied onto the line now; later product edits
    // must not change lines already in a cart.
    let line = CartLine {
        product_id: product.id,
        name: product.name,
        brand: product.brand,
        price: product.price,
        image: product.images.first().cloned(),
        size: req.size,
        color: req.color,
        quantity: req.quantity,
    };
    let cart = carts::mutate(&state.db, user_id, move |cart| cart.add_line(line)).await?;
    Ok(ok(cart_view(&cart)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}

pub async fn update_quantity(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateQuantityRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let cart = carts::mutate(&state.db, user_id, |cart| {
        cart.update_quantity(
            req.product_id,
            req.size.as_deref(),
            req.color.as_deref(),
            req.quantity,
        )
    })
    .await?;
    Ok(ok(cart_view(&cart)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemRequest {
    pub product_id: Uuid,
    pub size: Option<String>,
    pub color: Option<String>,
}

pub async fn remove_item(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<RemoveItemRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let cart = carts::mutate(&state.db, user_id, |cart| {
        cart.remove_line(req.product_id, req.size.as_deref(), req.color.as_deref())
    })
    .await?;
    Ok(ok(cart_view(&cart)))
}

pub async fn clear(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let cart = carts::mutate(&state.db, user_id, |cart| {
        cart.clear();
        Ok(())
    })
    .await?;
    Ok(ok(cart_view(&cart)))
}
