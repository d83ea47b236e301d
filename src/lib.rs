//! Seekon Apparel - Storefront API
//!
//! REST backend for the Seekon Apparel storefront.
//!
//! ## Features
//! - Product catalog with category filtering and search
//! - Per-user cart and wishlist with line-item consolidation
//! - Order creation with denormalized line-item snapshots
//! - M-Pesa STK push and Flutterwave payment initiation with webhook
//!   driven settlement and a reconciliation sweep for stale payments
//! - Admin auth (JWT), CRUD, CSV export and dashboard reporting
//! - Append-only audit trail

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod payment;
pub mod report;
pub mod state;
pub mod store;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
