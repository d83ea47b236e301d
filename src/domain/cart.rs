//! Cart aggregate: a quantity-bearing set of distinct
//! (product, size, color) selections for one user.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// One distinct (product, size, color) selection with a quantity.
///
/// Product fields are denormalized copies taken at insertion time; a later
/// price change on the product does not retroactively change the line.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub brand: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: i32,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("cart item not found")]
    LineNotFound,
    #[error("quantity must be positive")]
    NonPositiveQuantity,
}

/// Absent and empty sizes mean "no size" and compare equal to each other,
/// but never to a concrete size string. Every mutation path goes through
/// this single normalization.
fn normalized(value: Option<&str>) -> Option<&str> {
    match value {
        None | Some("") => None,
        some => some,
    }
}

/// The line-identity rule: same product, same color, same size under
/// null-normalization.
pub fn same_selection(
    line: &CartLine,
    product_id: Uuid,
    size: Option<&str>,
    color: Option<&str>,
) -> bool {
    line.product_id == product_id
        && normalized(line.color.as_deref()) == normalized(color)
        && normalized(line.size.as_deref()) == normalized(size)
}

#[derive(Clone, Debug)]
pub struct Cart {
    user_id: Uuid,
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id, lines: vec![] }
    }

    pub fn from_lines(user_id: Uuid, lines: Vec<CartLine>) -> Self {
        Self { user_id, lines }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_items(&self) -> i64 {
        self.lines.iter().map(|l| i64::from(l.quantity)).sum()
    }

    pub fn total_price(&self) -> Decimal {
        self.lines
            .iter()
            .fold(Decimal::ZERO, |acc, l| acc + l.line_total())
    }

    /// Merge a selection into the cart: an existing matching line has its
    /// quantity incremented, otherwise the line is appended as-is.
    pub fn add_line(&mut self, line: CartLine) -> Result<(), CartError> {
        if line.quantity < 1 {
            return Err(CartError::NonPositiveQuantity);
        }
        match self.lines.iter_mut().find(|existing| {
            same_selection(
                existing,
                line.product_id,
                line.size.as_deref(),
                line.color.as_deref(),
            )
        }) {
            Some(existing) => existing.quantity += line.quantity,
            None => self.lines.push(line),
        }
        Ok(())
    }

    /// Set a line's quantity. A non-positive quantity removes the line
    /// rather than erroring.
    pub fn update_quantity(
        &mut self,
        product_id: Uuid,
        size: Option<&str>,
        color: Option<&str>,
        quantity: i32,
    ) -> Result<(), CartError> {
        if quantity <= 0 {
            return self.remove_line(product_id, size, color);
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| same_selection(l, product_id, size, color))
            .ok_or(CartError::LineNotFound)?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn remove_line(
        &mut self,
        product_id: Uuid,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Result<(), CartError> {
        let before = self.lines.len();
        self.lines
            .retain(|l| !same_selection(l, product_id, size, color));
        if self.lines.len() == before {
            return Err(CartError::LineNotFound);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(product_id: Uuid, size: Option<&str>, color: Option<&str>, qty: i32) -> CartLine {
        CartLine {
            product_id,
            name: "Court Classic".into(),
            brand: "Seekon".into(),
            price: dec!(49.99),
            image: None,
            size: size.map(Into::into),
            color: color.map(Into::into),
            quantity: qty,
        }
    }

    #[test]
    fn same_triple_merges_into_one_line() {
        let pid = Uuid::new_v4();
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_line(line(pid, Some("42"), Some("black"), 2)).unwrap();
        cart.add_line(line(pid, Some("42"), Some("black"), 3)).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
        assert_eq!(cart.total_items(), 5);
        assert_eq!(cart.total_price(), dec!(249.95));
    }

    #[test]
    fn different_size_is_a_different_line() {
        let pid = Uuid::new_v4();
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_line(line(pid, Some("42"), Some("black"), 1)).unwrap();
        cart.add_line(line(pid, Some("43"), Some("black"), 1)).unwrap();
        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn missing_and_empty_size_are_the_same_line() {
        let pid = Uuid::new_v4();
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_line(line(pid, None, Some("black"), 1)).unwrap();
        cart.add_line(line(pid, Some(""), Some("black"), 2)).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn no_size_is_distinct_from_a_concrete_size() {
        let pid = Uuid::new_v4();
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_line(line(pid, None, Some("black"), 1)).unwrap();
        cart.add_line(line(pid, Some("42"), Some("black"), 1)).unwrap();
        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn zero_quantity_update_removes_the_line() {
        let pid = Uuid::new_v4();
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_line(line(pid, Some("42"), None, 2)).unwrap();
        cart.update_quantity(pid, Some("42"), None, 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price(), Decimal::ZERO);
    }

    #[test]
    fn negative_quantity_update_also_removes() {
        let pid = Uuid::new_v4();
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_line(line(pid, Some("42"), None, 2)).unwrap();
        cart.update_quantity(pid, Some("42"), None, -3).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn update_of_unknown_line_errors() {
        let mut cart = Cart::new(Uuid::new_v4());
        let err = cart
            .update_quantity(Uuid::new_v4(), None, None, 2)
            .unwrap_err();
        assert_eq!(err, CartError::LineNotFound);
    }

    #[test]
    fn remove_matches_under_normalization() {
        let pid = Uuid::new_v4();
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_line(line(pid, Some(""), Some("red"), 1)).unwrap();
        // Stored with an empty size, removed with no size.
        cart.remove_line(pid, None, Some("red")).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn add_with_non_positive_quantity_is_rejected() {
        let mut cart = Cart::new(Uuid::new_v4());
        let err = cart
            .add_line(line(Uuid::new_v4(), None, None, 0))
            .unwrap_err();
        assert_eq!(err, CartError::NonPositiveQuantity);
    }

    #[test]
    fn lines_keep_insertion_order_across_mutations() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_line(line(a, Some("42"), None, 1)).unwrap();
        cart.add_line(line(b, Some("42"), None, 1)).unwrap();
        cart.add_line(line(c, Some("42"), None, 1)).unwrap();
        cart.update_quantity(b, Some("42"), None, 7).unwrap();
        cart.add_line(line(a, Some("42"), None, 2)).unwrap();
        let order: Vec<Uuid> = cart.lines().iter().map(|l| l.product_id).collect();
        assert_eq!(order, vec![a, b, c]);
        assert_eq!(cart.lines()[1].quantity, 7);
    }

    #[test]
    fn clear_empties_the_cart() {
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_line(line(Uuid::new_v4(), None, None, 2)).unwrap();
        cart.clear();
        assert!(cart.is_empty());
    }
}
