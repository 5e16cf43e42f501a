//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog product
///
/// `stock` is the count of sellable units and is never negative. It is
/// only ever changed by the stock ledger engine; catalog edits leave it
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub size: String,
    /// Unit price, non-negative
    pub price: Decimal,
    /// Sellable units on hand, >= 0
    #[serde(default)]
    pub stock: i64,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal, stock: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            brand: String::new(),
            description: String::new(),
            color: String::new(),
            size: String::new(),
            price,
            stock,
        }
    }
}
