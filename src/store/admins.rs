//! Admin account repository.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiResult;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminRow {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

pub async fn find_by_email(db: &PgPool, email: &str) -> ApiResult<Option<AdminRow>> {
    Ok(sqlx::query_as::<_, AdminRow>("SELECT * FROM admins WHERE email = $1")
        .bind(email)
        .fetch_optional(db)
        .await?)
}

pub async fn count(db: &PgPool) -> ApiResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admins")
        .fetch_one(db)
        .await?;
    Ok(count)
}

/// Seed the bootstrap admin when the table is empty. `password_hash`
/// must already be an Argon2id PHC string.
pub async fn seed_if_empty(db: &PgPool, email: &str, password_hash: &str) -> ApiResult<bool> {
    if count(db).await? > 0 {
        return Ok(false);
    }
    sqlx::query(
        "INSERT INTO admins (id, email, password_hash, name, role, created_at) \
         VALUES ($1, $2, $3, 'Administrator', 'admin', NOW()) ON CONFLICT (email) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .execute(db)
    .await?;
    Ok(true)
}
