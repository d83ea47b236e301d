//! Wishlist endpoints.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::ok;
use crate::domain::wishlist::{Wishlist, WishlistItem};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::{products, wishlists};

fn wishlist_view(wishlist: &Wishlist) -> serde_json::Value {
    json!({
        "userId": wishlist.user_id(),
        "items": wishlist.items(),
    })
}

pub async fn get_wishlist(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let wishlist = wishlists::load(&state.db, user_id).await?;
    Ok(ok(wishlist_view(&wishlist)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWishlistItemRequest {
    pub product_id: Uuid,
}

pub async fn add_item(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<AddWishlistItemRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let product = products::get(&state.db, req.product_id)
        .await?
        .ok_or(ApiError::NotFound("product"))?;
    let item = WishlistItem {
        product_id: product.id,
        name: product.name,
        brand: product.brand,
        price: product.price,
        image: product.images.first().cloned(),
        added_at: Utc::now(),
    };
    let (wishlist, added) =
        wishlists::mutate(&state.db, user_id, move |wishlist| Ok(wishlist.add_item(item)))
            .await?;
    Ok(ok(json!({
        "added": added,
        "wishlist": wishlist_view(&wishlist),
    })))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Path((user_id, product_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<serde_json::Value>> {
    let (wishlist, ()) =
        wishlists::mutate(&state.db, user_id, |wishlist| wishlist.remove_item(product_id))
            .await?;
    Ok(ok(wishlist_view(&wishlist)))
}
