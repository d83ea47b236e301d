//! Order repository.
//!
//! Orders own a denormalized snapshot of their line items; the total is
//! computed once at creation and never recomputed from live products.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{page_count, Page};
use crate::error::ApiResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_amount: Decimal,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}

pub async fn create(
    db: &PgPool,
    user_id: Uuid,
    items: &[NewOrderItem],
    payment_method: &str,
    payment_reference: Option<&str>,
) -> ApiResult<(OrderRow, Vec<OrderItemRow>)> {
    let total: Decimal = items
        .iter()
        .map(|i| i.price * Decimal::from(i.quantity))
        .sum();

    let mut tx = db.begin().await?;

    let order = sqlx::query_as::<_, OrderRow>(
        "INSERT INTO orders \
         (id, user_id, total_amount, payment_method, payment_reference, status, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, 'pending', NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(total)
    .bind(payment_method)
    .bind(payment_reference)
    .fetch_one(&mut *tx)
    .await?;

    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let row = sqlx::query_as::<_, OrderItemRow>(
            "INSERT INTO order_items (id, order_id, product_id, name, price, quantity, size, color) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(order.id)
        .bind(item.product_id)
        .bind(&item.name)
        .bind(item.price)
        .bind(item.quantity)
        .bind(&item.size)
        .bind(&item.color)
        .fetch_one(&mut *tx)
        .await?;
        rows.push(row);
    }

    tx.commit().await?;
    Ok((order, rows))
}

pub async fn get(db: &PgPool, id: Uuid) -> ApiResult<Option<(OrderRow, Vec<OrderItemRow>)>> {
    let order = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?;
    let Some(order) = order else { return Ok(None) };
    let items =
        sqlx::query_as::<_, OrderItemRow>("SELECT * FROM order_items WHERE order_id = $1")
            .bind(id)
            .fetch_all(db)
            .await?;
    Ok(Some((order, items)))
}

pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> ApiResult<Vec<OrderRow>> {
    Ok(sqlx::query_as::<_, OrderRow>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?)
}

#[derive(Debug, Default)]
pub struct OrderFilter {
    pub status: Option<String>,
    /// Inclusive lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound, typically [`crate::report::day_after`].
    pub to: Option<DateTime<Utc>>,
    pub page: u32,
    pub limit: u32,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
    if let Some(status) = &filter.status {
        qb.push(" AND status = ").push_bind(status.clone());
    }
    if let Some(from) = filter.from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND created_at < ").push_bind(to);
    }
}

pub async fn list(db: &PgPool, filter: &OrderFilter) -> ApiResult<Page<OrderRow>> {
    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM orders WHERE 1=1");
    push_filters(&mut count_qb, filter);
    let (total,): (i64,) = count_qb.build_query_as().fetch_one(db).await?;

    let mut qb = QueryBuilder::new("SELECT * FROM orders WHERE 1=1");
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(i64::from(filter.limit))
        .push(" OFFSET ")
        .push_bind(i64::from((filter.page - 1) * filter.limit));
    let data = qb.build_query_as::<OrderRow>().fetch_all(db).await?;

    Ok(Page {
        data,
        total,
        page: filter.page,
        pages: page_count(total, filter.limit),
    })
}

pub async fn update_status(
    db: &PgPool,
    id: Uuid,
    status: OrderStatus,
) -> ApiResult<Option<OrderRow>> {
    Ok(sqlx::query_as::<_, OrderRow>(
        "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(db)
    .await?)
}

pub async fn count(db: &PgPool) -> ApiResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
        .fetch_one(db)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_round_trips() {
        for s in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
        ] {
            assert_eq!(s.as_str().parse::<OrderStatus>(), Ok(s));
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }
}
