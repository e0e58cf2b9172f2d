use std::net::SocketAddr;

use dealership_backend::config::AppConfig;
use dealership_backend::images::{SELL_REQUESTS, VEHICLES};
use dealership_backend::{db, router, seed, AppState};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = AppConfig::load()?;
    log::info!(
        "loaded config: port {}, upload dir {}, max upload {} bytes",
        config.port,
        config.upload_dir,
        config.max_file_size
    );

    let store = db::connect(&config.database_url).await?;

    for subfolder in ["", VEHICLES, SELL_REQUESTS, "brands"] {
        tokio::fs::create_dir_all(std::path::Path::new(&config.upload_dir).join(subfolder))
            .await?;
    }

    seed::ensure_default_admin(store.as_ref(), &config).await?;
    seed::seed_brands(store.as_ref()).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config, store));

    log::info!("listening on {addr}");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
