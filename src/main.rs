use std::{process, sync::Arc};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use storefront_cart::{
    cart::AppState,
    catalog::seed::load_catalog,
    config::Config,
    identity::HeaderIdentity,
    router::create_app_router,
    store::MemoryStore,
};

fn setup_tracing(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[tokio::main]
async fn main() {
    let config = Config::load().unwrap_or_else(|e| e.exit());

    setup_tracing(&config.log_level);

    // Load the catalog into the in-memory store
    let products = match load_catalog(config.catalog_file.as_deref()).await {
        Ok(products) => products,
        Err(e) => {
            error!("Failed to load catalog: {e}");
            process::exit(1);
        }
    };
    info!("Loaded {} products", products.len());

    let identity = match HeaderIdentity::new(&config.identity_header) {
        Ok(identity) => identity,
        Err(e) => {
            error!(header = %config.identity_header, "Invalid identity header: {e}");
            process::exit(1);
        }
    };

    // Initialize application state
    let store = Arc::new(MemoryStore::with_products(products));
    let state = Arc::new(AppState::with_store(
        store,
        &config.settings(),
        Arc::new(identity),
    ));

    // Build application router with all routes and middleware
    let app = create_app_router(state);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {addr}: {e}");
            process::exit(1);
        }
    };

    info!("Server running on http://{addr}");

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {e}");
        process::exit(1);
    }
}
