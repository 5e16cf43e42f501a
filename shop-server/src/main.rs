use shop_server::{Config, ShopState, demo, init_logger};

fn main() -> anyhow::Result<()> {
    // Environment (dotenv, logging)
    dotenv::dotenv().ok();
    let config = Config::from_env();
    let _log_guard = init_logger(&config.log_level, config.log_dir.as_deref())?;

    tracing::info!("Shop server starting...");

    if let Some(parent) = config.db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let state = ShopState::open(&config.db_path)?;
    demo::run(&state)?;

    Ok(())
}
