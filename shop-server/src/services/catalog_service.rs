//! Catalog Service - product management and search
//!
//! Catalog edits never touch the stock count: `create_product` sets the
//! initial stock and from then on only the stock ledger moves it;
//! `update_product` copies the stored count into the replacement record.

use rust_decimal::Decimal;
use tracing::{debug, info};

use shared::models::Product;

use crate::common::error::{ShopError, ShopResult};
use crate::storage::{ShopStorage, StorageError};

#[derive(Clone)]
pub struct CatalogService {
    storage: ShopStorage,
}

impl CatalogService {
    pub fn new(storage: ShopStorage) -> Self {
        Self { storage }
    }

    /// Create a new product
    ///
    /// Rejects empty ids, negative prices, negative initial stock and
    /// duplicate ids.
    pub fn create_product(&self, product: Product) -> ShopResult<Product> {
        if product.id.trim().is_empty() {
            return Err(ShopError::Validation("product id must not be empty".into()));
        }
        if product.price < Decimal::ZERO {
            return Err(ShopError::Validation(format!(
                "price must be non-negative, got {}",
                product.price
            )));
        }
        if product.stock < 0 {
            return Err(ShopError::Validation(format!(
                "initial stock must be non-negative, got {}",
                product.stock
            )));
        }

        let txn = self.storage.begin_write()?;
        if self.storage.get_product_txn(&txn, &product.id)?.is_some() {
            return Err(ShopError::ProductAlreadyExists(product.id));
        }
        self.storage.put_product_txn(&txn, &product)?;
        txn.commit().map_err(StorageError::from)?;

        info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    pub fn get_product(&self, product_id: &str) -> ShopResult<Product> {
        self.storage
            .get_product(product_id)?
            .ok_or_else(|| ShopError::ProductNotFound(product_id.to_string()))
    }

    pub fn get_all_products(&self) -> ShopResult<Vec<Product>> {
        Ok(self.storage.get_all_products()?)
    }

    /// Replace a product's descriptive attributes and price
    ///
    /// The stored id and stock count are preserved; stock moves only
    /// through the stock ledger.
    pub fn update_product(&self, product_id: &str, updated: Product) -> ShopResult<Product> {
        if updated.price < Decimal::ZERO {
            return Err(ShopError::Validation(format!(
                "price must be non-negative, got {}",
                updated.price
            )));
        }

        let txn = self.storage.begin_write()?;
        let existing = self
            .storage
            .get_product_txn(&txn, product_id)?
            .ok_or_else(|| ShopError::ProductNotFound(product_id.to_string()))?;

        let replacement = Product {
            id: existing.id,
            stock: existing.stock,
            ..updated
        };
        self.storage.put_product_txn(&txn, &replacement)?;
        txn.commit().map_err(StorageError::from)?;

        info!(product_id, "Product updated");
        Ok(replacement)
    }

    /// Delete a product from the catalog
    ///
    /// Historical orders keep their snapshots; the movement ledger keeps
    /// its entries.
    pub fn delete_product(&self, product_id: &str) -> ShopResult<()> {
        let txn = self.storage.begin_write()?;
        if !self.storage.remove_product_txn(&txn, product_id)? {
            return Err(ShopError::ProductNotFound(product_id.to_string()));
        }
        txn.commit().map_err(StorageError::from)?;

        info!(product_id, "Product deleted");
        Ok(())
    }

    /// Case-insensitive substring search over name and description
    ///
    /// The keyword is trimmed first; result order is the store's key order.
    pub fn search_products(&self, keyword: &str) -> ShopResult<Vec<Product>> {
        let kw = keyword.trim().to_lowercase();
        debug!(keyword = %kw, "Searching products");

        let results: Vec<Product> = self
            .storage
            .get_all_products()?
            .into_iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&kw) || p.description.to_lowercase().contains(&kw)
            })
            .collect();

        info!(keyword = %kw, count = results.len(), "Product search finished");
        Ok(results)
    }
}
