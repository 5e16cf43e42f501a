//! Environment-driven configuration

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the redb database file
    pub db_path: PathBuf,
    /// Default log level when RUST_LOG is unset
    pub log_level: String,
    /// Directory for rolling log files; console-only when unset
    pub log_dir: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            db_path: std::env::var("SHOP_DB_PATH")
                .unwrap_or_else(|_| "./work_dir/shop.redb".into())
                .into(),
            log_level: std::env::var("SHOP_LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("SHOP_LOG_DIR").ok(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "./work_dir/shop.redb".into(),
            log_level: "info".into(),
            log_dir: None,
        }
    }
}
