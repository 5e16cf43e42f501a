//! Order Model
//!
//! An order is created once by placement and afterwards mutated only by
//! status transitions and quantity edits; it is never deleted. Cancelled
//! and refunded orders stay in the store as terminal statuses.

use serde::{Deserialize, Serialize};

use super::product::Product;

// ============================================================================
// Status
// ============================================================================

/// Order lifecycle status
///
/// ```text
/// PROCESSING ──> COMPLETED ──> REFUNDED
///      │
///      └──> CANCELED
/// ```
///
/// CANCELED and REFUNDED are terminal. `can_transition_to` encodes the
/// graph; the unchecked administrative setter on the orders manager
/// deliberately bypasses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Processing,
    Completed,
    Canceled,
    Refunded,
}

impl OrderStatus {
    /// No further transitions are allowed out of a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Canceled | OrderStatus::Refunded)
    }

    /// Whether `self -> next` is a legal lifecycle transition.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Processing, OrderStatus::Completed)
                | (OrderStatus::Processing, OrderStatus::Canceled)
                | (OrderStatus::Completed, OrderStatus::Refunded)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// Items
// ============================================================================

/// Order line input - what callers hand to `place_order`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: String,
    pub quantity: i32,
}

impl OrderItemInput {
    pub fn new(product_id: impl Into<String>, quantity: i32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Order line snapshot - the product as it looked at placement time
///
/// Not a live reference: later catalog edits do not change historical
/// orders. Duplicate product ids are kept as distinct lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: Product,
    pub quantity: i32,
}

// ============================================================================
// Order
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Ordered lines, placement order preserved
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    /// Creation time (Unix ms), immutable once set
    pub timestamp: i64,
}

impl Order {
    pub fn new(id: impl Into<String>, items: Vec<OrderItem>, status: OrderStatus, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            items,
            status,
            timestamp,
        }
    }
}
