//! Shared domain types for the shop engine
//!
//! Catalog, order, cart and stock-movement models used by the storage
//! layer and the engines. Everything here is a plain serde document;
//! behavior lives in `shop-server`.

pub mod models;
pub mod util;

// Re-exports
pub use models::{
    Cart, CartItem, MovementSource, Order, OrderItem, OrderItemInput, OrderStatus, Product,
    StockMovement,
};
pub use serde::{Deserialize, Serialize};
