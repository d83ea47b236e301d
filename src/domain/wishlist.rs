//! Wishlist aggregate. Item identity is the product id alone; adding a
//! product that is already present is an idempotent no-op, not an error.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub product_id: Uuid,
    pub name: String,
    pub brand: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WishlistError {
    #[error("wishlist item not found")]
    ItemNotFound,
}

#[derive(Clone, Debug)]
pub struct Wishlist {
    user_id: Uuid,
    items: Vec<WishlistItem>,
}

impl Wishlist {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id, items: vec![] }
    }

    pub fn from_items(user_id: Uuid, items: Vec<WishlistItem>) -> Self {
        Self { user_id, items }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    pub fn contains(&self, product_id: Uuid) -> bool {
        self.items.iter().any(|i| i.product_id == product_id)
    }

    /// Returns `true` when the item was newly added, `false` when it was
    /// already present.
    pub fn add_item(&mut self, item: WishlistItem) -> bool {
        if self.contains(item.product_id) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn remove_item(&mut self, product_id: Uuid) -> Result<(), WishlistError> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before {
            return Err(WishlistError::ItemNotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(product_id: Uuid) -> WishlistItem {
        WishlistItem {
            product_id,
            name: "Varsity Hoodie".into(),
            brand: "Seekon".into(),
            price: dec!(79.00),
            image: None,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn second_add_is_a_no_op() {
        let pid = Uuid::new_v4();
        let mut wishlist = Wishlist::new(Uuid::new_v4());
        assert!(wishlist.add_item(item(pid)));
        assert!(!wishlist.add_item(item(pid)));
        assert_eq!(wishlist.items().len(), 1);
    }

    #[test]
    fn remove_unknown_item_errors() {
        let mut wishlist = Wishlist::new(Uuid::new_v4());
        assert_eq!(
            wishlist.remove_item(Uuid::new_v4()),
            Err(WishlistError::ItemNotFound)
        );
    }

    #[test]
    fn remove_deletes_the_item() {
        let pid = Uuid::new_v4();
        let mut wishlist = Wishlist::new(Uuid::new_v4());
        wishlist.add_item(item(pid));
        wishlist.remove_item(pid).unwrap();
        assert!(!wishlist.contains(pid));
    }
}
