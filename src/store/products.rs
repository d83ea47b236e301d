//! Product catalog repository.

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
pub enum Category {
    Sneakers,
    Apparel,
    Accessories,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sneakers => "sneakers",
            Self::Apparel => "apparel",
            Self::Accessories => "accessories",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sneakers" => Ok(Self::Sneakers),
            "apparel" => Ok(Self::Apparel),
            "accessories" => Ok(Self::Accessories),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: String,
    pub stock: i32,
    pub in_stock: bool,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewProduct {
    pub name: String,
    pub brand: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Category,
    pub stock: i32,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub images: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<Category>,
    pub page: u32,
    pub limit: u32,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR brand ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = filter.category {
        qb.push(" AND category = ").push_bind(category.as_str());
    }
}

pub async fn list(db: &PgPool, filter: &ProductFilter) -> ApiResult<Page<ProductRow>> {
    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM products WHERE 1=1");
    push_filters(&mut count_qb, filter);
    let (total,): (i64,) = count_qb.build_query_as().fetch_one(db).await?;

    let mut qb = QueryBuilder::new("SELECT * FROM products WHERE 1=1");
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(i64::from(filter.limit))
        .push(" OFFSET ")
        .push_bind(i64::from((filter.page - 1) * filter.limit));
    let data = qb.build_query_as::<ProductRow>().fetch_all(db).await?;

    Ok(Page {
        data,
        total,
        page: filter.page,
        pages: page_count(total, filter.limit),
    })
}

pub async fn get(db: &PgPool, id: Uuid) -> ApiResult<Option<ProductRow>> {
    Ok(sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?)
}

pub async fn get_many(db: &PgPool, ids: &[Uuid]) -> ApiResult<Vec<ProductRow>> {
    Ok(
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(db)
            .await?,
    )
}

pub async fn create(db: &PgPool, new: &NewProduct) -> ApiResult<ProductRow> {
    let row = sqlx::query_as::<_, ProductRow>(
        "INSERT INTO products \
         (id, name, brand, description, price, category, stock, in_stock, sizes, colors, images, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.brand)
    .bind(&new.description)
    .bind(new.price)
    .bind(new.category.as_str())
    .bind(new.stock)
    .bind(new.stock > 0)
    .bind(&new.sizes)
    .bind(&new.colors)
    .bind(&new.images)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update(db: &PgPool, id: Uuid, new: &NewProduct) -> ApiResult<Option<ProductRow>> {
    let row = sqlx::query_as::<_, ProductRow>(
        "UPDATE products SET name = $2, brand = $3, description = $4, price = $5, \
         category = $6, stock = $7, in_stock = $8, sizes = $9, colors = $10, images = $11, \
         updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&new.name)
    .bind(&new.brand)
    .bind(&new.description)
    .bind(new.price)
    .bind(new.category.as_str())
    .bind(new.stock)
    .bind(new.stock > 0)
    .bind(&new.sizes)
    .bind(&new.colors)
    .bind(&new.images)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> ApiResult<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count(db: &PgPool) -> ApiResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(db)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips() {
        for c in [Category::Sneakers, Category::Apparel, Category::Accessories] {
            assert_eq!(c.as_str().parse::<Category>(), Ok(c));
        }
        assert!("shoes".parse::<Category>().is_err());
    }
}
