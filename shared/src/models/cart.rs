//! Cart Model

use serde::{Deserialize, Serialize};

/// Cart line - a plain (product, quantity) reference, no snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: i32,
}

impl CartItem {
    pub fn new(product_id: impl Into<String>, quantity: i32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Shopping cart
///
/// Created once by a successful reservation and immutable afterwards.
/// Reservations do not expire; `release_reserved_stock` is the manual undo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,
    pub items: Vec<CartItem>,
    /// Unix ms
    pub created_at: i64,
}

impl Cart {
    pub fn new(id: impl Into<String>, items: Vec<CartItem>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            items,
            created_at,
        }
    }
}
