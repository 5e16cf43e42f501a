//! OrdersManager - order placement and lifecycle transitions
//!
//! # Operation Flow
//!
//! ```text
//! place_order(id, lines, status)
//!     ├─ 1. Validate line quantities
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Per line: decrement stock + append PlaceOrder movement,
//!     │      snapshot the product into the order
//!     ├─ 4. Persist the order
//!     └─ 5. Commit (any failure aborts the whole transaction)
//! ```
//!
//! Multi-item operations are all-or-nothing: a mid-sequence failure (an
//! unknown product, an out-of-stock line) aborts the transaction, so no
//! earlier line's decrement survives.
//!
//! Two access paths mutate the status field: `update_order_status` is the
//! unchecked administrative override, while `cancel_order` and
//! `refund_order` enforce the transition graph via
//! `OrderStatus::can_transition_to`.

use tracing::{debug, info, warn};

use shared::models::{MovementSource, Order, OrderItem, OrderItemInput, OrderStatus};
use shared::util::now_millis;

use crate::common::error::{ShopError, ShopResult};
use crate::stock::StockLedger;
use crate::storage::{ShopStorage, StorageError};

#[derive(Clone)]
pub struct OrdersManager {
    storage: ShopStorage,
    ledger: StockLedger,
}

impl OrdersManager {
    pub fn new(storage: ShopStorage, ledger: StockLedger) -> Self {
        Self { storage, ledger }
    }

    // ========== Placement ==========

    /// Place a new order
    ///
    /// Each line decrements the product's stock and appends a `PlaceOrder`
    /// movement carrying the order id. The stored order embeds the product
    /// as read inside the placement transaction; later catalog edits do
    /// not reach back into it. Duplicate product ids stay distinct lines.
    pub fn place_order(
        &self,
        order_id: &str,
        lines: &[OrderItemInput],
        status: OrderStatus,
    ) -> ShopResult<Order> {
        info!(order_id, lines = lines.len(), "Placing order");

        for line in lines {
            if line.quantity <= 0 {
                return Err(ShopError::InvalidQuantity(i64::from(line.quantity)));
            }
        }

        let txn = self.storage.begin_write()?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let product = self.ledger.apply_adjustment(
                &txn,
                &line.product_id,
                -i64::from(line.quantity),
                MovementSource::PlaceOrder,
                order_id,
            )?;
            items.push(OrderItem {
                product,
                quantity: line.quantity,
            });
        }

        let order = Order::new(order_id, items, status, now_millis());
        self.storage.put_order_txn(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        info!(order_id, %status, "Order placed");
        Ok(order)
    }

    // ========== Status Transitions ==========

    /// Set an order's status without transition validation
    ///
    /// Administrative override: any status may be set, and stock is not
    /// touched. Use `cancel_order`/`refund_order` for the checked,
    /// stock-consistent transitions.
    pub fn update_order_status(&self, order_id: &str, new_status: OrderStatus) -> ShopResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| ShopError::OrderNotFound(order_id.to_string()))?;

        debug!(order_id, from = %order.status, to = %new_status, "Updating order status");
        order.status = new_status;
        self.storage.put_order_txn(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        info!(order_id, %new_status, "Order status updated");
        Ok(order)
    }

    /// Replace the quantity of every line matching `product_id`
    ///
    /// A pure order-content edit: product stock is not adjusted. Callers
    /// needing a stock-consistent change compose `goods_in`/`goods_out`
    /// on the ledger themselves.
    pub fn update_order_item_quantity(
        &self,
        order_id: &str,
        product_id: &str,
        new_quantity: i32,
    ) -> ShopResult<Order> {
        if new_quantity <= 0 {
            return Err(ShopError::InvalidQuantity(i64::from(new_quantity)));
        }

        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| ShopError::OrderNotFound(order_id.to_string()))?;

        let mut found = false;
        for item in &mut order.items {
            if item.product.id == product_id {
                item.quantity = new_quantity;
                found = true;
            }
        }
        if !found {
            warn!(order_id, product_id, "Quantity update target not in order");
            return Err(ShopError::ItemNotInOrder {
                order_id: order_id.to_string(),
                product_id: product_id.to_string(),
            });
        }

        self.storage.put_order_txn(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        info!(order_id, product_id, new_quantity, "Order item quantity updated");
        Ok(order)
    }

    /// Cancel a PROCESSING order, restoring every line's stock
    ///
    /// Rejected for any other status: restocking a completed or already
    /// terminal order would let the same units re-enter stock twice.
    pub fn cancel_order(&self, order_id: &str) -> ShopResult<Order> {
        info!(order_id, "Cancelling order");

        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| ShopError::OrderNotFound(order_id.to_string()))?;

        if !order.status.can_transition_to(OrderStatus::Canceled) {
            return Err(ShopError::InvalidState(format!(
                "only {} orders can be cancelled, order {} is {}",
                OrderStatus::Processing,
                order_id,
                order.status
            )));
        }

        for item in &order.items {
            self.ledger.apply_adjustment(
                &txn,
                &item.product.id,
                i64::from(item.quantity),
                MovementSource::CancelOrder,
                order_id,
            )?;
            debug!(order_id, product_id = %item.product.id, quantity = item.quantity, "Restocked");
        }

        order.status = OrderStatus::Canceled;
        self.storage.put_order_txn(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        info!(order_id, "Order marked as CANCELED");
        Ok(order)
    }

    /// Refund a COMPLETED order, restoring every line's stock
    ///
    /// Fails with `AlreadyRefunded` on a second refund and `InvalidState`
    /// for any status other than COMPLETED.
    pub fn refund_order(&self, order_id: &str) -> ShopResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| ShopError::OrderNotFound(order_id.to_string()))?;

        if order.status == OrderStatus::Refunded {
            return Err(ShopError::AlreadyRefunded(order_id.to_string()));
        }
        if !order.status.can_transition_to(OrderStatus::Refunded) {
            return Err(ShopError::InvalidState(format!(
                "only {} orders can be refunded, order {} is {}",
                OrderStatus::Completed,
                order_id,
                order.status
            )));
        }

        for item in &order.items {
            self.ledger.apply_adjustment(
                &txn,
                &item.product.id,
                i64::from(item.quantity),
                MovementSource::RefundOrder,
                order_id,
            )?;
        }

        order.status = OrderStatus::Refunded;
        self.storage.put_order_txn(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        info!(order_id, "Processed refund");
        Ok(order)
    }

    // ========== Reads ==========

    pub fn get_order_by_id(&self, order_id: &str) -> ShopResult<Order> {
        debug!(order_id, "Fetching order");
        self.storage
            .get_order(order_id)?
            .ok_or_else(|| ShopError::OrderNotFound(order_id.to_string()))
    }

    pub fn get_orders_by_status(&self, status: OrderStatus) -> ShopResult<Vec<Order>> {
        Ok(self.storage.get_orders_by_status(status)?)
    }

    pub fn get_all_orders(&self) -> ShopResult<Vec<Order>> {
        Ok(self.storage.get_all_orders()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::Product;

    fn setup(products: &[(&str, i64)]) -> (ShopStorage, StockLedger, OrdersManager) {
        let storage = ShopStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        for (id, stock) in products {
            storage
                .put_product_txn(
                    &txn,
                    &Product::new(*id, format!("product {id}"), Decimal::new(200, 2), *stock),
                )
                .unwrap();
        }
        txn.commit().unwrap();

        let ledger = StockLedger::new(storage.clone());
        let manager = OrdersManager::new(storage.clone(), ledger.clone());
        (storage, ledger, manager)
    }

    fn stock_of(storage: &ShopStorage, id: &str) -> i64 {
        storage.get_product(id).unwrap().unwrap().stock
    }

    #[test]
    fn place_order_decrements_and_snapshots() {
        let (storage, ledger, manager) = setup(&[("p1", 5)]);

        let order = manager
            .place_order("o1", &[OrderItemInput::new("p1", 2)], OrderStatus::Processing)
            .unwrap();

        assert_eq!(order.id, "o1");
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.items[0].product.id, "p1");
        assert_eq!(stock_of(&storage, "p1"), 3);

        let movements = ledger.movements().unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].delta, -2);
        assert_eq!(movements[0].source_type, MovementSource::PlaceOrder);
        assert_eq!(movements[0].source_id, "o1");
    }

    #[test]
    fn place_order_snapshot_survives_catalog_edits() {
        let (storage, _ledger, manager) = setup(&[("p1", 5)]);

        manager
            .place_order("o1", &[OrderItemInput::new("p1", 1)], OrderStatus::Processing)
            .unwrap();

        // Rename the product after placement
        let txn = storage.begin_write().unwrap();
        let mut product = storage.get_product_txn(&txn, "p1").unwrap().unwrap();
        product.name = "renamed".into();
        storage.put_product_txn(&txn, &product).unwrap();
        txn.commit().unwrap();

        let order = manager.get_order_by_id("o1").unwrap();
        assert_eq!(order.items[0].product.name, "product p1");
    }

    #[test]
    fn place_order_duplicate_lines_stay_distinct() {
        let (storage, _ledger, manager) = setup(&[("p1", 10)]);

        let order = manager
            .place_order(
                "o1",
                &[OrderItemInput::new("p1", 2), OrderItemInput::new("p1", 3)],
                OrderStatus::Processing,
            )
            .unwrap();

        assert_eq!(order.items.len(), 2);
        assert_eq!(stock_of(&storage, "p1"), 5);
    }

    #[test]
    fn place_order_missing_product_rolls_back() {
        let (storage, ledger, manager) = setup(&[("p1", 5)]);

        let err = manager
            .place_order(
                "o1",
                &[OrderItemInput::new("p1", 2), OrderItemInput::new("ghost", 1)],
                OrderStatus::Processing,
            )
            .unwrap_err();
        assert!(matches!(err, ShopError::ProductNotFound(_)));

        // First line's decrement was rolled back with the transaction
        assert_eq!(stock_of(&storage, "p1"), 5);
        assert!(ledger.movements().unwrap().is_empty());
        assert!(matches!(
            manager.get_order_by_id("o1").unwrap_err(),
            ShopError::OrderNotFound(_)
        ));
    }

    #[test]
    fn place_order_rejects_non_positive_quantity() {
        let (storage, _ledger, manager) = setup(&[("p1", 5)]);

        let err = manager
            .place_order("o1", &[OrderItemInput::new("p1", 0)], OrderStatus::Processing)
            .unwrap_err();
        assert!(matches!(err, ShopError::InvalidQuantity(0)));
        assert_eq!(stock_of(&storage, "p1"), 5);
    }

    #[test]
    fn update_order_status_is_unchecked() {
        let (_storage, _ledger, manager) = setup(&[("p1", 5)]);
        manager
            .place_order("o1", &[OrderItemInput::new("p1", 1)], OrderStatus::Processing)
            .unwrap();

        // Even an illegal jump is accepted on the administrative path
        let order = manager
            .update_order_status("o1", OrderStatus::Refunded)
            .unwrap();
        assert_eq!(order.status, OrderStatus::Refunded);

        assert!(matches!(
            manager.update_order_status("ghost", OrderStatus::Completed),
            Err(ShopError::OrderNotFound(_))
        ));
    }

    #[test]
    fn update_order_status_preserves_timestamp() {
        let (_storage, _ledger, manager) = setup(&[("p1", 5)]);
        let placed = manager
            .place_order("o1", &[OrderItemInput::new("p1", 1)], OrderStatus::Processing)
            .unwrap();

        let updated = manager
            .update_order_status("o1", OrderStatus::Completed)
            .unwrap();
        assert_eq!(updated.timestamp, placed.timestamp);
        assert_eq!(updated.id, placed.id);
    }

    #[test]
    fn update_item_quantity_leaves_stock_alone() {
        let (storage, ledger, manager) = setup(&[("p1", 10)]);
        manager
            .place_order("o1", &[OrderItemInput::new("p1", 2)], OrderStatus::Processing)
            .unwrap();

        let order = manager.update_order_item_quantity("o1", "p1", 5).unwrap();
        assert_eq!(order.items[0].quantity, 5);

        // Stock still reflects the original placement only
        assert_eq!(stock_of(&storage, "p1"), 8);
        assert_eq!(ledger.movements().unwrap().len(), 1);
    }

    #[test]
    fn update_item_quantity_unknown_product() {
        let (_storage, _ledger, manager) = setup(&[("p1", 10)]);
        manager
            .place_order("o1", &[OrderItemInput::new("p1", 2)], OrderStatus::Processing)
            .unwrap();

        let err = manager
            .update_order_item_quantity("o1", "ghost", 5)
            .unwrap_err();
        match err {
            ShopError::ItemNotInOrder {
                order_id,
                product_id,
            } => {
                assert_eq!(order_id, "o1");
                assert_eq!(product_id, "ghost");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cancel_restores_stock_and_logs() {
        let (storage, ledger, manager) = setup(&[("p1", 5)]);
        manager
            .place_order("o1", &[OrderItemInput::new("p1", 2)], OrderStatus::Processing)
            .unwrap();
        assert_eq!(stock_of(&storage, "p1"), 3);

        let order = manager.cancel_order("o1").unwrap();
        assert_eq!(order.status, OrderStatus::Canceled);
        assert_eq!(stock_of(&storage, "p1"), 5);

        let deltas: Vec<i64> = ledger
            .movements()
            .unwrap()
            .iter()
            .map(|m| m.delta)
            .collect();
        assert_eq!(deltas, vec![-2, 2]);
    }

    #[test]
    fn cancel_requires_processing() {
        let (storage, _ledger, manager) = setup(&[("p1", 5)]);
        manager
            .place_order("o1", &[OrderItemInput::new("p1", 2)], OrderStatus::Processing)
            .unwrap();
        manager
            .update_order_status("o1", OrderStatus::Completed)
            .unwrap();

        assert!(matches!(
            manager.cancel_order("o1").unwrap_err(),
            ShopError::InvalidState(_)
        ));
        assert_eq!(stock_of(&storage, "p1"), 3);
    }

    #[test]
    fn cancel_twice_does_not_double_restock() {
        let (storage, _ledger, manager) = setup(&[("p1", 5)]);
        manager
            .place_order("o1", &[OrderItemInput::new("p1", 2)], OrderStatus::Processing)
            .unwrap();

        manager.cancel_order("o1").unwrap();
        assert!(matches!(
            manager.cancel_order("o1").unwrap_err(),
            ShopError::InvalidState(_)
        ));
        assert_eq!(stock_of(&storage, "p1"), 5);
    }

    #[test]
    fn refund_lifecycle() {
        let (storage, _ledger, manager) = setup(&[("p1", 10)]);
        manager
            .place_order("o1", &[OrderItemInput::new("p1", 3)], OrderStatus::Processing)
            .unwrap();

        // Not completed yet
        assert!(matches!(
            manager.refund_order("o1").unwrap_err(),
            ShopError::InvalidState(_)
        ));

        manager
            .update_order_status("o1", OrderStatus::Completed)
            .unwrap();
        let refunded = manager.refund_order("o1").unwrap();
        assert_eq!(refunded.status, OrderStatus::Refunded);
        assert_eq!(stock_of(&storage, "p1"), 10);

        // Second refund is its own error kind
        assert!(matches!(
            manager.refund_order("o1").unwrap_err(),
            ShopError::AlreadyRefunded(id) if id == "o1"
        ));
        assert_eq!(stock_of(&storage, "p1"), 10);
    }

    #[test]
    fn reads_by_status() {
        let (_storage, _ledger, manager) = setup(&[("p1", 10)]);
        manager
            .place_order("o1", &[OrderItemInput::new("p1", 1)], OrderStatus::Processing)
            .unwrap();
        manager
            .place_order("o2", &[OrderItemInput::new("p1", 1)], OrderStatus::Processing)
            .unwrap();
        manager
            .update_order_status("o2", OrderStatus::Completed)
            .unwrap();

        let processing = manager.get_orders_by_status(OrderStatus::Processing).unwrap();
        assert_eq!(processing.len(), 1);
        assert_eq!(processing[0].id, "o1");

        // Repeating the read returns the same answer
        let again = manager.get_orders_by_status(OrderStatus::Processing).unwrap();
        assert_eq!(again.len(), 1);

        assert_eq!(manager.get_all_orders().unwrap().len(), 2);
        assert!(matches!(
            manager.get_order_by_id("nope").unwrap_err(),
            ShopError::OrderNotFound(_)
        ));
    }
}
