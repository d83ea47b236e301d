//! Wishlist repository. Same locking discipline as the cart store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::wishlist::{Wishlist, WishlistError, WishlistItem};
use crate::error::{ApiError, ApiResult};

impl From<WishlistError> for ApiError {
    fn from(e: WishlistError) -> Self {
        match e {
            WishlistError::ItemNotFound => ApiError::NotFound("wishlist item"),
        }
    }
}

#[derive(sqlx::FromRow)]
struct WishlistItemRow {
    product_id: Uuid,
    name: String,
    brand: String,
    price: Decimal,
    image: Option<String>,
    added_at: DateTime<Utc>,
}

impl From<WishlistItemRow> for WishlistItem {
    fn from(row: WishlistItemRow) -> Self {
        WishlistItem {
            product_id: row.product_id,
            name: row.name,
            brand: row.brand,
            price: row.price,
            image: row.image,
            added_at: row.added_at,
        }
    }
}

const SELECT_ITEMS: &str = "SELECT product_id, name, brand, price, image, added_at \
                            FROM wishlist_items WHERE user_id = $1 ORDER BY added_at";

pub async fn load(db: &PgPool, user_id: Uuid) -> ApiResult<Wishlist> {
    sqlx::query("INSERT INTO wishlists (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(db)
        .await?;
    let rows: Vec<WishlistItemRow> = sqlx::query_as(SELECT_ITEMS)
        .bind(user_id)
        .fetch_all(db)
        .await?;
    Ok(Wishlist::from_items(
        user_id,
        rows.into_iter().map(Into::into).collect(),
    ))
}

/// Run `op` against the loaded wishlist and persist the result. `op`'s
/// return value is passed back to the caller (e.g. whether an add was
/// new or a duplicate).
pub async fn mutate<R, F>(db: &PgPool, user_id: Uuid, op: F) -> ApiResult<(Wishlist, R)>
where
    F: FnOnce(&mut Wishlist) -> Result<R, WishlistError>,
{
    let mut tx = db.begin().await?;

    sqlx::query("INSERT INTO wishlists (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("SELECT user_id FROM wishlists WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

    let rows: Vec<WishlistItemRow> = sqlx::query_as(SELECT_ITEMS)
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;
    let mut wishlist = Wishlist::from_items(user_id, rows.into_iter().map(Into::into).collect());

    let outcome = op(&mut wishlist)?;

    sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    for item in wishlist.items() {
        sqlx::query(
            "INSERT INTO wishlist_items (user_id, product_id, name, brand, price, image, added_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(user_id)
        .bind(item.product_id)
        .bind(&item.name)
        .bind(&item.brand)
        .bind(item.price)
        .bind(&item.image)
        .bind(item.added_at)
        .execute(&mut *tx)
        .await?;
    }
    sqlx::query("UPDATE wishlists SET updated_at = NOW() WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok((wishlist, outcome))
}
