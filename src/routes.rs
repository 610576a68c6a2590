use axum::{
    extract::{DefaultBodyLimit, State},
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{self, SecurityConfig};
use crate::database::manager::DatabaseManager;
use crate::handlers::{
    conversations, customers, jobs, leads, messages, profiles, quotes, requests,
};
use crate::matching::MatchingService;
use crate::middleware::bearer_auth_middleware;

/// Shared application state. The matching service carries the service-role
/// capability; everything else uses the caller-scoped pool.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub matching: MatchingService,
}

pub fn app(state: AppState) -> Router {
    let cfg = config::config();

    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Authenticated API
        .merge(api_routes())
        // Global middleware
        .layer(DefaultBodyLimit::max(cfg.api.max_request_size_bytes))
        .layer(cors_layer(&cfg.security));
    if cfg.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router.with_state(state)
}

/// CORS from the security config: a no-op layer when disabled, the configured
/// origin list otherwise. An empty list means any origin.
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/profiles/me",
            get(profiles::get_me).patch(profiles::update_me),
        )
        .route("/api/requests", get(requests::list).post(requests::create))
        .route(
            "/api/requests/:id",
            get(requests::get)
                .patch(requests::update)
                .delete(requests::delete),
        )
        .route("/api/requests/:id/match", post(requests::match_contractors))
        .route(
            "/api/requests/:id/messages",
            get(messages::list).post(messages::create),
        )
        .route("/api/leads", get(leads::list))
        .route("/api/leads/:id", get(leads::get).patch(leads::respond))
        .route("/api/jobs", get(jobs::list).post(jobs::create))
        .route(
            "/api/jobs/:id",
            get(jobs::get).patch(jobs::update).delete(jobs::delete),
        )
        .route("/api/quotes", get(quotes::list).post(quotes::create))
        .route(
            "/api/quotes/:id",
            get(quotes::get)
                .patch(quotes::update)
                .delete(quotes::delete),
        )
        .route(
            "/api/customers",
            get(customers::list).post(customers::create),
        )
        .route(
            "/api/customers/:id",
            get(customers::get)
                .patch(customers::update)
                .delete(customers::delete),
        )
        .route("/api/conversations", get(conversations::list))
        .route_layer(axum::middleware::from_fn(bearer_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "TradeMatch API",
        "version": version,
        "description": "Trades marketplace API built with Rust (Axum)",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "profile": "/api/profiles/me (protected)",
            "requests": "/api/requests[/:id] (protected)",
            "matching": "/api/requests/:id/match (protected)",
            "messages": "/api/requests/:id/messages (protected)",
            "leads": "/api/leads[/:id] (protected)",
            "jobs": "/api/jobs[/:id] (protected)",
            "quotes": "/api/quotes[/:id] (protected)",
            "customers": "/api/customers[/:id] (protected)",
            "conversations": "/api/conversations (protected)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.db).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
