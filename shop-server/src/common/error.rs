//! Unified Error Handling
//!
//! Domain error type shared by the three engines. Storage faults are
//! wrapped, never swallowed; every business failure keeps its own variant
//! so an adapter can translate it (not-found vs. conflict vs. validation)
//! without string matching.

use crate::storage::StorageError;

/// Engine-level error type
#[derive(Debug, thiserror::Error)]
pub enum ShopError {
    // ========== Not Found ==========
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Product not found in order {order_id}: {product_id}")]
    ItemNotInOrder {
        order_id: String,
        product_id: String,
    },

    // ========== Business Rules ==========
    /// A decrement would take stock below zero. Stock is left unchanged.
    #[error("Insufficient stock for product {product_id}: have {available}, need {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    #[error("Order already refunded: {0}")]
    AlreadyRefunded(String),

    #[error("Invalid order state: {0}")]
    InvalidState(String),

    #[error("Product already exists: {0}")]
    ProductAlreadyExists(String),

    // ========== Validation ==========
    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(i64),

    #[error("Validation failed: {0}")]
    Validation(String),

    // ========== System ==========
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type ShopResult<T> = Result<T, ShopError>;
