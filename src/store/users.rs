//! Storefront user repository.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{page_count, Page};
use crate::error::ApiResult;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Upsert by email: checkout needs a user record but account management
/// lives elsewhere, so registration is a lightweight idempotent create.
pub async fn upsert(
    db: &PgPool,
    name: &str,
    email: &str,
    phone: Option<&str>,
) -> ApiResult<UserRow> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (id, name, email, phone, created_at) \
         VALUES ($1, $2, $3, $4, NOW()) \
         ON CONFLICT (email) DO UPDATE SET name = $2, phone = COALESCE($4, users.phone) \
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(phone)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn get(db: &PgPool, id: Uuid) -> ApiResult<Option<UserRow>> {
    Ok(sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?)
}

#[derive(Debug, Default)]
pub struct UserFilter {
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
}

pub async fn list(db: &PgPool, filter: &UserFilter) -> ApiResult<Page<UserRow>> {
    let push_filters = |qb: &mut QueryBuilder<'_, Postgres>| {
        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    };

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1=1");
    push_filters(&mut count_qb);
    let (total,): (i64,) = count_qb.build_query_as().fetch_one(db).await?;

    let mut qb = QueryBuilder::new("SELECT * FROM users WHERE 1=1");
    push_filters(&mut qb);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(i64::from(filter.limit))
        .push(" OFFSET ")
        .push_bind(i64::from((filter.page - 1) * filter.limit));
    let data = qb.build_query_as::<UserRow>().fetch_all(db).await?;

    Ok(Page {
        data,
        total,
        page: filter.page,
        pages: page_count(total, filter.limit),
    })
}

pub async fn count(db: &PgPool) -> ApiResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(db)
        .await?;
    Ok(count)
}
