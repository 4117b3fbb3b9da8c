//! Domain models for the portal.

pub mod cart;
pub mod session;

pub use cart::{Cart, CartItem};
pub use session::{CurrentUser, SessionSnapshot, keys as session_keys};
