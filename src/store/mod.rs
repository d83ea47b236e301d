//! Persistence layer: sqlx/PostgreSQL repositories.

pub mod admins;
pub mod audit;
pub mod carts;
pub mod orders;
pub mod products;
pub mod transactions;
pub mod users;
pub mod wishlists;

use serde::Serialize;

/// One page of an admin listing.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub pages: u32,
}

/// `pages = ceil(total / limit)`.
pub fn page_count(total: i64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    ((total + i64::from(limit) - 1) / i64::from(limit)).max(0) as u32
}

/// Clamp raw page/limit query params the same way everywhere.
pub fn clamp_paging(page: Option<u32>, limit: Option<u32>) -> (u32, u32) {
    (page.unwrap_or(1).max(1), limit.unwrap_or(20).clamp(1, 100))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 20), 0);
        assert_eq!(page_count(1, 20), 1);
        assert_eq!(page_count(20, 20), 1);
        assert_eq!(page_count(21, 20), 2);
    }

    #[test]
    fn paging_defaults_and_caps() {
        assert_eq!(clamp_paging(None, None), (1, 20));
        assert_eq!(clamp_paging(Some(0), Some(500)), (1, 100));
        assert_eq!(clamp_paging(Some(3), Some(50)), (3, 50));
    }
}
