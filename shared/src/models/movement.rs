//! Stock movement ledger types
//!
//! One entry per product per mutating operation. Entries are append-only:
//! the storage layer offers no update or delete path, so the running sum
//! of deltas per product always reconciles with its current stock.

use serde::{Deserialize, Serialize};

/// What caused a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementSource {
    PlaceOrder,
    CancelOrder,
    RefundOrder,
    GoodsIn,
    GoodsOut,
    ReserveCart,
    ReleaseReservedStock,
}

impl std::fmt::Display for MovementSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One signed change to a product's stock count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    /// Globally increasing sequence number, assigned by storage
    pub id: u64,
    /// Unix ms
    pub timestamp: i64,
    /// The product whose stock moved
    pub product_id: String,
    /// Positive = stock added, negative = stock removed
    pub delta: i64,
    pub source_type: MovementSource,
    /// The order/cart/product id that caused the movement
    pub source_id: String,
}
