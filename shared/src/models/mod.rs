//! Domain models

pub mod cart;
pub mod movement;
pub mod order;
pub mod product;

pub use cart::{Cart, CartItem};
pub use movement::{MovementSource, StockMovement};
pub use order::{Order, OrderItem, OrderItemInput, OrderStatus};
pub use product::Product;
