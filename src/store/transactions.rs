//! Payment transaction repository.
//!
//! Status transitions out of `pending` go through the domain state
//! machine AND a `WHERE status = 'pending'` guard in the UPDATE, so a
//! duplicate webhook racing this code path still cannot overwrite a
//! terminal state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{page_count, Page};
use crate::domain::transaction::{transition, PaymentEvent, PaymentMethod, TransactionStatus};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRow {
    pub id: Uuid,
    pub user_email: String,
    pub phone_number: Option<String>,
    pub method: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub reference: String,
    pub correlation_id: Option<String>,
    pub provider_response: Option<Value>,
    pub callback_data: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewTransaction {
    pub user_email: String,
    pub phone_number: Option<String>,
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub currency: String,
    pub reference: String,
}

/// Insert the durable `pending` record. This happens BEFORE any provider
/// call so a record exists even when the outbound call fails.
pub async fn insert_pending(db: &PgPool, new: &NewTransaction) -> ApiResult<TransactionRow> {
    let row = sqlx::query_as::<_, TransactionRow>(
        "INSERT INTO transactions \
         (id, user_email, phone_number, method, amount, currency, status, reference, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&new.user_email)
    .bind(&new.phone_number)
    .bind(new.method.as_str())
    .bind(new.amount)
    .bind(&new.currency)
    .bind(&new.reference)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Store the raw provider response (success or rejection) and, when the
/// provider issued one, the correlation id the webhook will carry.
pub async fn set_provider_response(
    db: &PgPool,
    id: Uuid,
    correlation_id: Option<&str>,
    payload: &Value,
) -> ApiResult<()> {
    sqlx::query(
        "UPDATE transactions SET provider_response = $2, \
         correlation_id = COALESCE($3, correlation_id), updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(payload)
    .bind(correlation_id)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn get(db: &PgPool, id: Uuid) -> ApiResult<Option<TransactionRow>> {
    Ok(
        sqlx::query_as::<_, TransactionRow>("SELECT * FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?,
    )
}

/// Outcome of applying a provider callback.
#[derive(Debug, PartialEq, Eq)]
pub enum CallbackOutcome {
    Applied(TransactionStatus),
    /// The transaction was already terminal; duplicate or out-of-order
    /// delivery, deliberately a no-op.
    AlreadySettled(TransactionStatus),
    /// No transaction carries this correlation id; also a no-op.
    Unknown,
}

pub async fn apply_callback_by_correlation(
    db: &PgPool,
    correlation_id: &str,
    event: PaymentEvent,
    callback: &Value,
) -> ApiResult<CallbackOutcome> {
    apply_event(db, "correlation_id", correlation_id, event, callback).await
}

pub async fn apply_callback_by_reference(
    db: &PgPool,
    reference: &str,
    event: PaymentEvent,
    callback: &Value,
) -> ApiResult<CallbackOutcome> {
    apply_event(db, "reference", reference, event, callback).await
}

async fn apply_event(
    db: &PgPool,
    key_column: &'static str,
    key: &str,
    event: PaymentEvent,
    callback: &Value,
) -> ApiResult<CallbackOutcome> {
    let row: Option<(Uuid, String)> = sqlx::query_as(&format!(
        "SELECT id, status FROM transactions WHERE {key_column} = $1"
    ))
    .bind(key)
    .fetch_optional(db)
    .await?;

    let Some((id, status)) = row else {
        return Ok(CallbackOutcome::Unknown);
    };
    let current: TransactionStatus = status
        .parse()
        .map_err(|e: crate::domain::transaction::UnknownStatus| ApiError::Internal(e.to_string()))?;

    let next = match transition(current, event) {
        Ok(next) => next,
        Err(_) => return Ok(CallbackOutcome::AlreadySettled(current)),
    };

    let updated = sqlx::query(
        "UPDATE transactions SET status = $2, callback_data = $3, updated_at = NOW() \
         WHERE id = $1 AND status = 'pending'",
    )
    .bind(id)
    .bind(next.as_str())
    .bind(callback)
    .execute(db)
    .await?;

    if updated.rows_affected() == 0 {
        // Lost the race to a concurrent callback; treat as settled.
        return Ok(CallbackOutcome::AlreadySettled(current));
    }
    Ok(CallbackOutcome::Applied(next))
}

/// Reconciliation sweep: `pending` rows older than the TTL move to
/// `cancelled`. The WHERE clause is the same guard the state machine
/// enforces for [`PaymentEvent::Expired`].
pub async fn expire_stale(db: &PgPool, ttl_minutes: i32) -> ApiResult<u64> {
    let result = sqlx::query(
        "UPDATE transactions SET status = 'cancelled', updated_at = NOW() \
         WHERE status = 'pending' AND created_at < NOW() - make_interval(mins => $1)",
    )
    .bind(ttl_minutes)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

#[derive(Debug, Default)]
pub struct TransactionFilter {
    pub search: Option<String>,
    pub status: Option<String>,
    pub method: Option<String>,
    /// Inclusive lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound, typically [`crate::report::day_after`].
    pub to: Option<DateTime<Utc>>,
    pub page: u32,
    pub limit: u32,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &TransactionFilter) {
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        qb.push(" AND (user_email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR reference ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR phone_number ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(status) = &filter.status {
        qb.push(" AND status = ").push_bind(status.clone());
    }
    if let Some(method) = &filter.method {
        qb.push(" AND method = ").push_bind(method.clone());
    }
    if let Some(from) = filter.from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND created_at < ").push_bind(to);
    }
}

pub async fn list(db: &PgPool, filter: &TransactionFilter) -> ApiResult<Page<TransactionRow>> {
    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM transactions WHERE 1=1");
    push_filters(&mut count_qb, filter);
    let (total,): (i64,) = count_qb.build_query_as().fetch_one(db).await?;

    let mut qb = QueryBuilder::new("SELECT * FROM transactions WHERE 1=1");
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(i64::from(filter.limit))
        .push(" OFFSET ")
        .push_bind(i64::from((filter.page - 1) * filter.limit));
    let data = qb.build_query_as::<TransactionRow>().fetch_all(db).await?;

    Ok(Page {
        data,
        total,
        page: filter.page,
        pages: page_count(total, filter.limit),
    })
}

/// Unpaged variant for CSV export; same filters as [`list`].
pub async fn export(db: &PgPool, filter: &TransactionFilter) -> ApiResult<Vec<TransactionRow>> {
    let mut qb = QueryBuilder::new("SELECT * FROM transactions WHERE 1=1");
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC");
    Ok(qb.build_query_as::<TransactionRow>().fetch_all(db).await?)
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StatusSummary {
    pub status: String,
    pub count: i64,
    pub total: Decimal,
}

pub async fn status_summary(db: &PgPool) -> ApiResult<Vec<StatusSummary>> {
    Ok(sqlx::query_as::<_, StatusSummary>(
        "SELECT status, COUNT(*) AS count, COALESCE(SUM(amount), 0) AS total \
         FROM transactions GROUP BY status ORDER BY status",
    )
    .fetch_all(db)
    .await?)
}

#[derive(Debug, sqlx::FromRow)]
pub struct RevenueRow {
    pub status: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Raw transactions in the trailing window, every status. Grouping into
/// the per-day revenue series happens in [`crate::report::daily_revenue`].
pub async fn revenue_window(db: &PgPool, days: i32) -> ApiResult<Vec<RevenueRow>> {
    Ok(sqlx::query_as::<_, RevenueRow>(
        "SELECT status, amount, created_at FROM transactions \
         WHERE created_at >= NOW() - make_interval(days => $1)",
    )
    .bind(days)
    .fetch_all(db)
    .await?)
}

pub async fn count(db: &PgPool) -> ApiResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
        .fetch_one(db)
        .await?;
    Ok(count)
}
