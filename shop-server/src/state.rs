//! Engine wiring
//!
//! One storage handle shared by the three engines. Everything is `Clone`
//! (the database handle is reference-counted), so a hosting service can
//! hand the state to as many request handlers as it likes.

use std::path::Path;

use crate::common::error::ShopResult;
use crate::services::{CartService, CatalogService};
use crate::stock::StockLedger;
use crate::storage::ShopStorage;
use crate::OrdersManager;

#[derive(Clone)]
pub struct ShopState {
    pub storage: ShopStorage,
    pub catalog: CatalogService,
    pub stock: StockLedger,
    pub orders: OrdersManager,
    pub carts: CartService,
}

impl ShopState {
    /// Open (or create) the database at `db_path` and wire the engines
    pub fn open(db_path: impl AsRef<Path>) -> ShopResult<Self> {
        Ok(Self::with_storage(ShopStorage::open(db_path)?))
    }

    pub fn with_storage(storage: ShopStorage) -> Self {
        let stock = StockLedger::new(storage.clone());
        let catalog = CatalogService::new(storage.clone());
        let orders = OrdersManager::new(storage.clone(), stock.clone());
        let carts = CartService::new(storage.clone(), stock.clone());
        Self {
            storage,
            catalog,
            stock,
            orders,
            carts,
        }
    }
}
