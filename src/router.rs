use axum::http::HeaderValue;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Config;
use crate::db::Storage;
use crate::handlers;
use crate::middleware::rate_limit;

#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(storage: Storage, config: Arc<Config>) -> Self {
        Self { storage, config }
    }
}

/// Build the full REST surface. The credential endpoints sit behind their own
/// tighter rate limit in addition to the general one.
pub fn app_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .layer(from_fn_with_state(
            rate_limit::auth_limiter(),
            rate_limit::enforce,
        ));

    Router::new()
        .route("/", get(root))
        .nest("/auth", auth_routes)
        .route("/me", get(handlers::user::me))
        .route(
            "/bookmarks",
            post(handlers::bookmarks::create).get(handlers::bookmarks::list),
        )
        .route(
            "/bookmarks/{id}",
            get(handlers::bookmarks::get_by_id)
                .put(handlers::bookmarks::update)
                .delete(handlers::bookmarks::remove),
        )
        .route(
            "/bookmarks/{id}/read",
            patch(handlers::bookmarks::mark_as_read),
        )
        .route("/stats", get(handlers::stats::stats))
        .layer(from_fn_with_state(
            rate_limit::general_limiter(),
            rate_limit::enforce,
        ))
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Bookmarks API is running!" }))
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins = config.origins();
    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let list: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(list))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
