use std::sync::Arc;

use tradematch_api::database::manager::DatabaseManager;
use tradematch_api::matching::{MatchingService, SqlMatchStore};
use tradematch_api::routes::{app, AppState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = tradematch_api::config::config();

    tracing_subscriber::fmt::init();
    tracing::info!("Starting TradeMatch API in {:?} mode", config.environment);

    let db = DatabaseManager::app_pool().unwrap_or_else(|e| panic!("database setup failed: {}", e));
    let service_role = DatabaseManager::service_role()
        .unwrap_or_else(|e| panic!("service-role setup failed: {}", e));

    // Pools connect lazily; migrations run on the first successful connection
    if let Err(e) = DatabaseManager::migrate(&db).await {
        tracing::warn!("migrations not applied at startup: {}", e);
    }

    let state = AppState {
        db,
        matching: MatchingService::new(Arc::new(SqlMatchStore::new(service_role))),
    };

    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("TRADEMATCH_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 TradeMatch API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
