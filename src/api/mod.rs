//! HTTP surface: route table and the success envelope.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;
pub mod wishlist;

use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Uniform success envelope: `{"success": true, "data": ...}`.
pub(crate) fn ok<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "data": data }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/products", get(products::list))
        .route("/api/products/:id", get(products::get))
        .route("/api/users", post(users::upsert))
        .route("/api/users/:id", get(users::get))
        .route("/api/cart/:user_id", get(cart::get_cart).delete(cart::clear))
        .route(
            "/api/cart/:user_id/items",
            post(cart::add_item)
                .patch(cart::update_quantity)
                .delete(cart::remove_item),
        )
        .route("/api/wishlist/:user_id", get(wishlist::get_wishlist))
        .route("/api/wishlist/:user_id/items", post(wishlist::add_item))
        .route(
            "/api/wishlist/:user_id/items/:product_id",
            delete(wishlist::remove_item),
        )
        .route("/api/orders", post(orders::create))
        .route("/api/orders/:id", get(orders::get))
        .route("/api/orders/user/:user_id", get(orders::list_for_user))
        .route("/api/payment/status/:id", get(payments::payment_status))
        .route("/api/payment/mpesa", post(payments::initiate_mpesa))
        .route("/api/payment/mpesa-callback", post(payments::mpesa_callback))
        .route("/api/payment/flutterwave", post(payments::initiate_flutterwave))
        .route(
            "/api/payment/flutterwave-callback",
            get(payments::flutterwave_callback),
        )
        .route("/api/admin/login", post(admin::login))
        .route("/api/admin/products", post(admin::create_product))
        .route(
            "/api/admin/products/:id",
            put(admin::update_product).delete(admin::delete_product),
        )
        .route("/api/admin/orders", get(admin::list_orders))
        .route(
            "/api/admin/orders/:id/status",
            axum::routing::patch(admin::update_order_status),
        )
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/transactions", get(admin::list_transactions))
        .route(
            "/api/admin/transactions/export",
            get(admin::export_transactions),
        )
        .route("/api/admin/dashboard", get(admin::dashboard))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": "seekon-apparel" }))
}
