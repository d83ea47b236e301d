//! Seekon Apparel API server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use seekon_apparel::store::audit::{self, AuditAction};
use seekon_apparel::{api, store, AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    if let Some(seed) = &config.seed_admin {
        let hash = api::auth::hash_password(&seed.password)
            .map_err(|e| anyhow::anyhow!("admin seed: {e}"))?;
        if store::admins::seed_if_empty(&db, &seed.email, &hash).await? {
            tracing::info!(email = %seed.email, "seeded bootstrap admin");
        }
    }

    if config.mpesa.is_none() {
        tracing::warn!("M-Pesa credentials absent, running in mock mode");
    }
    if config.flutterwave.is_none() {
        tracing::warn!("Flutterwave credentials absent, running in mock mode");
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    let state = AppState {
        db,
        http,
        config: Arc::new(config),
    };

    tokio::spawn(sweep_pending_transactions(state.clone()));

    let app = api::router(state.clone());
    let addr = format!("0.0.0.0:{}", state.config.port);
    tracing::info!("Seekon Apparel API listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}

/// Reconciliation sweep: periodically cancel pending transactions whose
/// provider callback never arrived.
async fn sweep_pending_transactions(state: AppState) {
    let mut ticker =
        tokio::time::interval(Duration::from_secs(state.config.sweep_interval_secs));
    loop {
        ticker.tick().await;
        match store::transactions::expire_stale(&state.db, state.config.pending_ttl_minutes).await
        {
            Ok(0) => {}
            Ok(expired) => {
                tracing::info!(expired, "cancelled stale pending transactions");
                audit::record(
                    &state.db,
                    AuditAction::PaymentExpired,
                    "sweeper",
                    "system",
                    serde_json::json!({ "expired": expired }),
                )
                .await;
            }
            Err(e) => tracing::error!(error = %e, "pending transaction sweep failed"),
        }
    }
}
