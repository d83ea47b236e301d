//! Domain module - pure business logic, no I/O.

pub mod cart;
pub mod transaction;
pub mod value_objects;
pub mod wishlist;

pub use cart::{Cart, CartError, CartLine};
pub use transaction::{transition, PaymentEvent, PaymentMethod, TransactionStatus};
pub use value_objects::{Money, MoneyError, PaymentReference, PhoneError, PhoneNumber};
pub use wishlist::{Wishlist, WishlistError, WishlistItem};
