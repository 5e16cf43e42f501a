//! redb-based storage layer for the shop engine
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `products` | `product_id` | `Product` | Catalog |
//! | `orders` | `order_id` | `Order` | Orders (never deleted) |
//! | `carts` | `cart_id` | `Cart` | Carts |
//! | `stock_movements` | `(timestamp, sequence)` | `StockMovement` | Movement ledger (append-only) |
//! | `sequence_counter` | `()` | `u64` | Global movement sequence |
//!
//! # Atomicity
//!
//! Every mutating engine operation runs inside a single write transaction:
//! the product update and its ledger append commit together or not at all.
//! redb serializes writers, so the read-validate-write-append sequence on a
//! product can never interleave with another writer's.
//!
//! The movement table has no update or remove path. Keys are
//! `(timestamp, sequence)` so time-window queries are a plain range scan.

use std::path::Path;
use std::sync::Arc;

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use shared::models::{Cart, MovementSource, Order, OrderStatus, Product, StockMovement};
use shared::util::now_millis;

/// Table for products: key = product_id, value = JSON-serialized Product
const PRODUCTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("products");

/// Table for orders: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Table for carts: key = cart_id, value = JSON-serialized Cart
const CARTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("carts");

/// Table for the movement ledger: key = (unix_ms, sequence), value = JSON-serialized StockMovement
const MOVEMENTS_TABLE: TableDefinition<(i64, u64), &[u8]> = TableDefinition::new("stock_movements");

/// Table for the movement sequence counter: key = "seq", value = u64
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const SEQUENCE_KEY: &str = "seq";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

fn encode<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Shop storage backed by redb
#[derive(Clone)]
pub struct ShopStorage {
    db: Arc<Database>,
}

impl ShopStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits with immediate durability: once `commit()` returns,
    /// the file is in a consistent state that survives power loss.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        // Create all tables if they don't exist
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PRODUCTS_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(CARTS_TABLE)?;
            let _ = write_txn.open_table(MOVEMENTS_TABLE)?;

            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(SEQUENCE_KEY)?.is_none() {
                seq_table.insert(SEQUENCE_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    ///
    /// Dropping the transaction without committing aborts it; nothing
    /// written through it becomes observable.
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Product Operations ==========

    /// Get a product by id (within transaction)
    pub fn get_product_txn(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
    ) -> StorageResult<Option<Product>> {
        let table = txn.open_table(PRODUCTS_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    /// Insert or replace a product (within transaction)
    pub fn put_product_txn(&self, txn: &WriteTransaction, product: &Product) -> StorageResult<()> {
        let mut table = txn.open_table(PRODUCTS_TABLE)?;
        let value = encode(product)?;
        table.insert(product.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Remove a product (within transaction); returns whether it existed
    pub fn remove_product_txn(&self, txn: &WriteTransaction, product_id: &str) -> StorageResult<bool> {
        let mut table = txn.open_table(PRODUCTS_TABLE)?;
        Ok(table.remove(product_id)?.is_some())
    }

    /// Get a product by id
    pub fn get_product(&self, product_id: &str) -> StorageResult<Option<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get all products (key order)
    pub fn get_all_products(&self) -> StorageResult<Vec<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;

        let mut products = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            products.push(decode(value.value())?);
        }
        Ok(products)
    }

    // ========== Order Operations ==========

    /// Get an order by id (within transaction)
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    /// Insert or replace an order (within transaction)
    pub fn put_order_txn(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = encode(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get an order by id
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get all orders (key order)
    pub fn get_all_orders(&self) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            orders.push(decode(value.value())?);
        }
        Ok(orders)
    }

    /// Get all orders whose current status equals `status`
    pub fn get_orders_by_status(&self, status: OrderStatus) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: Order = decode(value.value())?;
            if order.status == status {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    // ========== Cart Operations ==========

    /// Insert or replace a cart (within transaction)
    pub fn put_cart_txn(&self, txn: &WriteTransaction, cart: &Cart) -> StorageResult<()> {
        let mut table = txn.open_table(CARTS_TABLE)?;
        let value = encode(cart)?;
        table.insert(cart.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a cart by id
    pub fn get_cart(&self, cart_id: &str) -> StorageResult<Option<Cart>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CARTS_TABLE)?;
        match table.get(cart_id)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    // ========== Movement Ledger ==========

    /// Increment and return the movement sequence number (within transaction)
    fn increment_sequence(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        let current = table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(SEQUENCE_KEY, next)?;
        Ok(next)
    }

    /// Append a movement entry (within transaction)
    ///
    /// Assigns the timestamp and the next global sequence number. The only
    /// write path into the ledger table.
    pub fn append_movement(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
        delta: i64,
        source_type: MovementSource,
        source_id: &str,
    ) -> StorageResult<StockMovement> {
        let id = self.increment_sequence(txn)?;
        let movement = StockMovement {
            id,
            timestamp: now_millis(),
            product_id: product_id.to_string(),
            delta,
            source_type,
            source_id: source_id.to_string(),
        };

        let mut table = txn.open_table(MOVEMENTS_TABLE)?;
        let value = encode(&movement)?;
        table.insert((movement.timestamp, movement.id), value.as_slice())?;
        Ok(movement)
    }

    /// Get the full movement log in append order
    pub fn get_all_movements(&self) -> StorageResult<Vec<StockMovement>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MOVEMENTS_TABLE)?;

        let mut movements = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            movements.push(decode(value.value())?);
        }

        movements.sort_by_key(|m: &StockMovement| m.id);
        Ok(movements)
    }

    /// Get movements with `from <= timestamp <= to` (Unix ms, inclusive)
    pub fn get_movements_between(&self, from: i64, to: i64) -> StorageResult<Vec<StockMovement>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MOVEMENTS_TABLE)?;

        let range_start = (from, u64::MIN);
        let range_end = (to, u64::MAX);

        let mut movements = Vec::new();
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            movements.push(decode(value.value())?);
        }

        movements.sort_by_key(|m: &StockMovement| m.id);
        Ok(movements)
    }

    /// Sum of all ledger deltas for one product
    ///
    /// Adding this to the product's initial stock must always equal its
    /// current stock; the test suites assert that as a standing invariant.
    pub fn movement_sum(&self, product_id: &str) -> StorageResult<i64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MOVEMENTS_TABLE)?;

        let mut sum = 0i64;
        for result in table.iter()? {
            let (_key, value) = result?;
            let movement: StockMovement = decode(value.value())?;
            if movement.product_id == product_id {
                sum += movement.delta;
            }
        }
        Ok(sum)
    }
}
