use crate::auth::AuthKeys;
use crate::cli::Args;
use crate::engine::judge::Judge0Client;
use crate::state::AppState;
use anyhow::Context;
use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use deadpool_diesel::Runtime;
use deadpool_diesel::postgres::{Manager, Pool};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod auth;
pub mod cli;
pub mod engine;
pub mod model;
pub mod payloads;
pub mod response;
pub mod schema;
pub mod state;

mod api;
mod errors;

pub use errors::AppError;

pub fn init_router(args: &Args) -> anyhow::Result<Router> {
    info!("Initializing database pool...");
    let pool = init_pool(&args.connection_str, args.db_pool_max_size)
        .context("Failed to initialize database pool")?;

    info!("Initializing judge client for {}...", args.judge_api_url);
    let judge = Judge0Client::new(args.judge_config()).context("Failed to build judge client")?;

    let state = AppState {
        pool,
        judge: Arc::new(judge),
        judge_deadline: Duration::from_secs(args.judge_total_timeout_secs),
        auth: AuthKeys::from_secret(args.jwt_secret.as_bytes()),
        award_policy: args.award_policy,
    };
    info!("Points award policy: {:?}", state.award_policy);

    info!("Initializing router...");
    let cors = init_cors_layer(&args.cors_allowed_origins)?;
    Ok(build_router(state).layer(cors))
}

/// Routes with state attached, without CORS.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn init_pool(conn_str: &str, max_size: u32) -> anyhow::Result<Pool> {
    let manager = Manager::new(conn_str, Runtime::Tokio1);
    let pool = Pool::builder(manager).max_size(max_size as usize).build()?;
    Ok(pool)
}

fn init_cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin.trim())
                .with_context(|| format!("Invalid CORS origin {}", origin))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // public routes go here
        .route("/health", get(api::health::health))
        .route("/tournaments/languages", get(api::tournament::list_languages))
        // token optional
        .route("/tournaments/{id}", get(api::tournament::get_tournament))
        // listing is public, creation needs a teacher token
        .route(
            "/tournaments",
            get(api::tournament::list_tournaments).post(api::tournament::create_tournament),
        )
        // protected routes go here
        .route(
            "/tournaments/{id}/submit",
            post(api::tournament::submit_solution),
        )
        .route(
            "/tournaments/{id}/complete",
            post(api::tournament::complete_tournament),
        )
}
