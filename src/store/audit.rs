//! Append-only audit trail (system_logs).
//!
//! Audit writes never fail the request they describe; failures are
//! logged and dropped.

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone, Copy, Debug)]
pub enum AuditAction {
    AdminLogin,
    ProductCreated,
    ProductUpdated,
    ProductDeleted,
    OrderCreated,
    OrderStatusChanged,
    PaymentInitiated,
    PaymentCompleted,
    PaymentFailed,
    PaymentExpired,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AdminLogin => "admin_login",
            Self::ProductCreated => "product_created",
            Self::ProductUpdated => "product_updated",
            Self::ProductDeleted => "product_deleted",
            Self::OrderCreated => "order_created",
            Self::OrderStatusChanged => "order_status_changed",
            Self::PaymentInitiated => "payment_initiated",
            Self::PaymentCompleted => "payment_completed",
            Self::PaymentFailed => "payment_failed",
            Self::PaymentExpired => "payment_expired",
        }
    }

    fn module(&self) -> &'static str {
        match self {
            Self::AdminLogin => "auth",
            Self::ProductCreated | Self::ProductUpdated | Self::ProductDeleted => "products",
            Self::OrderCreated | Self::OrderStatusChanged => "orders",
            Self::PaymentInitiated
            | Self::PaymentCompleted
            | Self::PaymentFailed
            | Self::PaymentExpired => "payments",
        }
    }
}

pub async fn record(db: &PgPool, action: AuditAction, actor: &str, actor_type: &str, details: Value) {
    let result = sqlx::query(
        "INSERT INTO system_logs (id, action, actor, actor_type, module, details, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, NOW())",
    )
    .bind(Uuid::new_v4())
    .bind(action.as_str())
    .bind(actor)
    .bind(actor_type)
    .bind(action.module())
    .bind(details)
    .execute(db)
    .await;

    if let Err(e) = result {
        tracing::warn!(error = %e, action = action.as_str(), "failed to write audit log");
    }
}
