//! Cart repository.
//!
//! A missing cart is auto-created on first read. Mutations load the full
//! cart and write it back whole, inside a transaction holding a row lock
//! on the owner row, so concurrent mutations for the same user serialize
//! instead of losing updates. Each line's insertion position is written
//! on every rewrite so the view order survives mutations.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::cart::{Cart, CartError, CartLine};
use crate::error::{ApiError, ApiResult};

impl From<CartError> for ApiError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::LineNotFound => ApiError::NotFound("cart item"),
            CartError::NonPositiveQuantity => ApiError::Validation(e.to_string()),
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    product_id: Uuid,
    name: String,
    brand: String,
    price: Decimal,
    image: Option<String>,
    size: Option<String>,
    color: Option<String>,
    quantity: i32,
}

impl From<CartItemRow> for CartLine {
    fn from(row: CartItemRow) -> Self {
        CartLine {
            product_id: row.product_id,
            name: row.name,
            brand: row.brand,
            price: row.price,
            image: row.image,
            size: row.size,
            color: row.color,
            quantity: row.quantity,
        }
    }
}

const SELECT_ITEMS: &str = "SELECT product_id, name, brand, price, image, size, color, quantity \
                            FROM cart_items WHERE user_id = $1 ORDER BY position";

pub async fn load(db: &PgPool, user_id: Uuid) -> ApiResult<Cart> {
    sqlx::query("INSERT INTO carts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(db)
        .await?;
    let rows: Vec<CartItemRow> = sqlx::query_as(SELECT_ITEMS)
        .bind(user_id)
        .fetch_all(db)
        .await?;
    Ok(Cart::from_lines(
        user_id,
        rows.into_iter().map(Into::into).collect(),
    ))
}

pub async fn mutate<F>(db: &PgPool, user_id: Uuid, op: F) -> ApiResult<Cart>
where
    F: FnOnce(&mut Cart) -> Result<(), CartError>,
{
    let mut tx = db.begin().await?;

    sqlx::query("INSERT INTO carts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("SELECT user_id FROM carts WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

    let rows: Vec<CartItemRow> = sqlx::query_as(SELECT_ITEMS)
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;
    let mut cart = Cart::from_lines(user_id, rows.into_iter().map(Into::into).collect());

    op(&mut cart)?;

    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    for (position, line) in cart.lines().iter().enumerate() {
        sqlx::query(
            "INSERT INTO cart_items \
             (id, user_id, product_id, name, brand, price, image, size, color, quantity, position) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(line.product_id)
        .bind(&line.name)
        .bind(&line.brand)
        .bind(line.price)
        .bind(&line.image)
        .bind(&line.size)
        .bind(&line.color)
        .bind(line.quantity)
        .bind(position as i32)
        .execute(&mut *tx)
        .await?;
    }
    sqlx::query("UPDATE carts SET updated_at = NOW() WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(cart)
}
