//! Shared infrastructure: error taxonomy and logging setup

pub mod error;
pub mod logger;

pub use error::{ShopError, ShopResult};
