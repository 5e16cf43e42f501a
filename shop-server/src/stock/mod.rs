//! Stock Ledger Engine
//!
//! The single authority for mutating a product's stock count. Every
//! successful mutation pairs the product update with exactly one
//! append-only movement entry, inside one write transaction. The
//! non-negativity check here is the only enforcement point in the crate:
//! a decrement that would go below zero fails with `InsufficientStock`
//! and leaves both the product and the ledger untouched.
//!
//! Multi-item engines (order placement, cart reservation) call
//! [`StockLedger::apply_adjustment`] with their own transaction so all of
//! their per-product adjustments commit or abort together.

use redb::WriteTransaction;
use tracing::{info, warn};

use shared::models::{MovementSource, Product, StockMovement};

use crate::common::error::{ShopError, ShopResult};
use crate::storage::ShopStorage;


#[derive(Clone)]
pub struct StockLedger {
    storage: ShopStorage,
}

impl StockLedger {
    pub fn new(storage: ShopStorage) -> Self {
        Self { storage }
    }

    /// Apply a signed stock adjustment and its ledger entry to `txn`
    ///
    /// Fails with `ProductNotFound` for unknown ids and `InsufficientStock`
    /// when the delta would take stock below zero; on failure nothing has
    /// been committed and the caller's transaction can simply be dropped.
    pub(crate) fn apply_adjustment(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
        delta: i64,
        source_type: MovementSource,
        source_id: &str,
    ) -> ShopResult<Product> {
        let mut product = self
            .storage
            .get_product_txn(txn, product_id)?
            .ok_or_else(|| ShopError::ProductNotFound(product_id.to_string()))?;

        let new_stock = product.stock + delta;
        if new_stock < 0 {
            warn!(
                product_id,
                available = product.stock,
                requested = -delta,
                %source_type,
                "Stock adjustment rejected"
            );
            return Err(ShopError::InsufficientStock {
                product_id: product_id.to_string(),
                available: product.stock,
                requested: -delta,
            });
        }

        product.stock = new_stock;
        self.storage.put_product_txn(txn, &product)?;
        self.storage
            .append_movement(txn, product_id, delta, source_type, source_id)?;
        Ok(product)
    }

    /// Adjust a product's stock by `delta` in its own transaction
    ///
    /// Returns the updated product. The ledger entry records the delta,
    /// the cause and the causing entity id.
    pub fn adjust_stock(
        &self,
        product_id: &str,
        delta: i64,
        source_type: MovementSource,
        source_id: &str,
    ) -> ShopResult<Product> {
        let txn = self.storage.begin_write()?;
        let product = self.apply_adjustment(&txn, product_id, delta, source_type, source_id)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;

        info!(
            product_id,
            delta,
            stock = product.stock,
            %source_type,
            source_id,
            "Stock adjusted"
        );
        Ok(product)
    }

    /// Receive `amount` units into stock
    pub fn goods_in(&self, product_id: &str, amount: i64) -> ShopResult<Product> {
        require_positive(amount)?;
        info!(product_id, amount, "Increasing stock");
        self.adjust_stock(product_id, amount, MovementSource::GoodsIn, product_id)
    }

    /// Remove `amount` units from stock; surfaces `InsufficientStock`
    pub fn goods_out(&self, product_id: &str, amount: i64) -> ShopResult<Product> {
        require_positive(amount)?;
        info!(product_id, amount, "Decreasing stock");
        self.adjust_stock(product_id, -amount, MovementSource::GoodsOut, product_id)
    }

    /// Manually return `amount` reserved units to stock
    ///
    /// The only undo for cart reservations; carts never expire on their own.
    pub fn release_reserved_stock(&self, product_id: &str, amount: i64) -> ShopResult<Product> {
        require_positive(amount)?;
        info!(product_id, amount, "Releasing reserved stock");
        self.adjust_stock(
            product_id,
            amount,
            MovementSource::ReleaseReservedStock,
            product_id,
        )
    }

    // ========== Ledger Queries ==========

    /// Full movement log in append order
    pub fn movements(&self) -> ShopResult<Vec<StockMovement>> {
        Ok(self.storage.get_all_movements()?)
    }

    /// Movements with `from <= timestamp <= to` (Unix ms, inclusive)
    pub fn movements_between(&self, from: i64, to: i64) -> ShopResult<Vec<StockMovement>> {
        Ok(self.storage.get_movements_between(from, to)?)
    }

    /// Sum of ledger deltas for one product; `initial stock + sum` must
    /// equal the product's current stock
    pub fn movement_sum(&self, product_id: &str) -> ShopResult<i64> {
        Ok(self.storage.movement_sum(product_id)?)
    }
}

fn require_positive(amount: i64) -> ShopResult<()> {
    if amount <= 0 {
        return Err(ShopError::InvalidQuantity(amount));
    }
    Ok(())
}
