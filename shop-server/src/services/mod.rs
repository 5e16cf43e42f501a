//! Catalog and cart services

pub mod cart_service;
pub mod catalog_service;

pub use cart_service::CartService;
pub use catalog_service::CatalogService;
