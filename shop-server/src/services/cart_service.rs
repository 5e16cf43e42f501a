//! Cart Service - stock reservations and totals
//!
//! A reservation decrements stock through the ledger (source
//! `ReserveCart`) and persists the cart in the same transaction. There is
//! no automatic release; `StockLedger::release_reserved_stock` is the
//! manual undo. Totals are a pure read against current catalog prices.

use rust_decimal::Decimal;
use tracing::{debug, info};

use shared::models::{Cart, CartItem, MovementSource};
use shared::util::now_millis;

use crate::common::error::{ShopError, ShopResult};
use crate::money;
use crate::stock::StockLedger;
use crate::storage::{ShopStorage, StorageError};

#[derive(Clone)]
pub struct CartService {
    storage: ShopStorage,
    ledger: StockLedger,
}

impl CartService {
    pub fn new(storage: ShopStorage, ledger: StockLedger) -> Self {
        Self { storage, ledger }
    }

    /// Reserve stock for a new cart
    ///
    /// All items reserve or none do: an unknown product or an
    /// out-of-stock line aborts the transaction, and no cart is created.
    pub fn reserve_stock_for_cart(&self, cart_id: &str, items: Vec<CartItem>) -> ShopResult<Cart> {
        info!(cart_id, items = items.len(), "Reserving stock for cart");

        for item in &items {
            if item.quantity <= 0 {
                return Err(ShopError::InvalidQuantity(i64::from(item.quantity)));
            }
        }

        let txn = self.storage.begin_write()?;
        for item in &items {
            self.ledger.apply_adjustment(
                &txn,
                &item.product_id,
                -i64::from(item.quantity),
                MovementSource::ReserveCart,
                cart_id,
            )?;
        }

        let cart = Cart::new(cart_id, items, now_millis());
        self.storage.put_cart_txn(&txn, &cart)?;
        txn.commit().map_err(StorageError::from)?;

        info!(cart_id, created_at = cart.created_at, "Stock reserved for cart");
        Ok(cart)
    }

    /// Total the given items at current catalog prices
    ///
    /// Pure function: no stock is touched, and the result reflects the
    /// price now, not any price frozen at reservation time. Exact decimal
    /// arithmetic throughout.
    pub fn calculate_cart_total(&self, items: &[CartItem]) -> ShopResult<Decimal> {
        debug!(items = items.len(), "Calculating cart total");

        let mut total = Decimal::ZERO;
        for item in items {
            let product = self
                .storage
                .get_product(&item.product_id)?
                .ok_or_else(|| ShopError::ProductNotFound(item.product_id.clone()))?;

            let line_total = money::line_total(product.price, item.quantity);
            debug!(
                product_id = %item.product_id,
                price = %product.price,
                quantity = item.quantity,
                %line_total,
                "Line item"
            );
            total += line_total;
        }

        info!(%total, "Cart total computed");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Product;

    fn setup(products: &[(&str, &str, i64)]) -> (ShopStorage, CartService) {
        let storage = ShopStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        for (id, price, stock) in products {
            storage
                .put_product_txn(
                    &txn,
                    &Product::new(*id, format!("product {id}"), price.parse().unwrap(), *stock),
                )
                .unwrap();
        }
        txn.commit().unwrap();

        let ledger = StockLedger::new(storage.clone());
        let service = CartService::new(storage.clone(), ledger);
        (storage, service)
    }

    fn stock_of(storage: &ShopStorage, id: &str) -> i64 {
        storage.get_product(id).unwrap().unwrap().stock
    }

    #[test]
    fn reserve_decrements_and_persists_cart() {
        let (storage, service) = setup(&[("p1", "2.00", 10)]);

        let cart = service
            .reserve_stock_for_cart("c1", vec![CartItem::new("p1", 4)])
            .unwrap();
        assert_eq!(cart.id, "c1");
        assert_eq!(cart.items.len(), 1);

        assert_eq!(stock_of(&storage, "p1"), 6);
        let stored = storage.get_cart("c1").unwrap().unwrap();
        assert_eq!(stored, cart);

        let movements = storage.get_all_movements().unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].delta, -4);
        assert_eq!(movements[0].source_type, MovementSource::ReserveCart);
        assert_eq!(movements[0].source_id, "c1");
    }

    #[test]
    fn reserve_is_all_or_nothing() {
        let (storage, service) = setup(&[("p1", "2.00", 10), ("p2", "3.00", 1)]);

        let err = service
            .reserve_stock_for_cart(
                "c1",
                vec![CartItem::new("p1", 4), CartItem::new("p2", 2)],
            )
            .unwrap_err();
        assert!(matches!(err, ShopError::InsufficientStock { .. }));

        assert_eq!(stock_of(&storage, "p1"), 10);
        assert_eq!(stock_of(&storage, "p2"), 1);
        assert!(storage.get_cart("c1").unwrap().is_none());
        assert!(storage.get_all_movements().unwrap().is_empty());
    }

    #[test]
    fn reserve_rejects_unknown_product_and_bad_quantity() {
        let (storage, service) = setup(&[("p1", "2.00", 10)]);

        assert!(matches!(
            service
                .reserve_stock_for_cart("c1", vec![CartItem::new("ghost", 1)])
                .unwrap_err(),
            ShopError::ProductNotFound(_)
        ));
        assert!(matches!(
            service
                .reserve_stock_for_cart("c1", vec![CartItem::new("p1", 0)])
                .unwrap_err(),
            ShopError::InvalidQuantity(0)
        ));
        assert_eq!(stock_of(&storage, "p1"), 10);
    }

    #[test]
    fn cart_total_uses_current_prices() {
        let (storage, service) = setup(&[("p1", "2.00", 10), ("p2", "19.99", 5)]);

        let items = vec![CartItem::new("p1", 4), CartItem::new("p2", 3)];
        let total = service.calculate_cart_total(&items).unwrap();
        assert_eq!(total, "67.97".parse::<Decimal>().unwrap());

        // Total is independent of any reservation
        service
            .reserve_stock_for_cart("c1", vec![CartItem::new("p1", 4)])
            .unwrap();
        let again = service
            .calculate_cart_total(&[CartItem::new("p1", 4)])
            .unwrap();
        assert_eq!(again, "8.00".parse::<Decimal>().unwrap());

        // Price changes are reflected immediately
        let txn = storage.begin_write().unwrap();
        let mut product = storage.get_product_txn(&txn, "p1").unwrap().unwrap();
        product.price = "2.50".parse().unwrap();
        storage.put_product_txn(&txn, &product).unwrap();
        txn.commit().unwrap();

        let repriced = service
            .calculate_cart_total(&[CartItem::new("p1", 4)])
            .unwrap();
        assert_eq!(repriced, "10.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn cart_total_unknown_product() {
        let (_storage, service) = setup(&[("p1", "2.00", 10)]);

        assert!(matches!(
            service
                .calculate_cart_total(&[CartItem::new("ghost", 1)])
                .unwrap_err(),
            ShopError::ProductNotFound(id) if id == "ghost"
        ));
    }

    #[test]
    fn empty_cart_totals_zero() {
        let (_storage, service) = setup(&[]);
        assert_eq!(service.calculate_cart_total(&[]).unwrap(), Decimal::ZERO);
    }
}
