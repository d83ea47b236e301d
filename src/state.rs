//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    /// One outbound HTTP client for all provider calls.
    pub http: reqwest::Client,
    pub config: Arc<AppConfig>,
}
