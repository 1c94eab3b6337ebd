use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod admin;
pub mod auth;
mod discover;
mod error;
mod me;
mod media;
mod observability;
mod system;
pub mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, max_upload_bytes) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.uploads.max_upload_bytes(),
        )
    };

    let admin_routes = Router::new()
        .route("/admin/overview", get(admin::overview))
        .route("/admin/users/{id}/admin", put(admin::set_admin))
        .route("/admin/media", post(admin::create_media))
        .route(
            "/admin/media/{id}",
            put(admin::update_media).delete(admin::delete_media),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes));

    let api_router = Router::new()
        .route("/health", get(system::health))
        .route("/genres", get(discover::list_genres))
        .route("/discover", get(discover::discover))
        .route("/media/{id}", get(media::get_media))
        .route("/media/{id}/rating", post(media::rate_media))
        .route("/media/{id}/watch", post(media::record_watch))
        .route(
            "/media/{id}/comments",
            get(media::list_comments).post(media::add_comment),
        )
        .route(
            "/media/{id}/status",
            put(media::set_status).delete(media::clear_status),
        )
        .route("/me", get(me::get_me))
        .route("/me/watchlist", get(me::my_watchlist))
        .route("/me/activity", get(me::my_activity))
        .route("/users/{id}/watchlist", get(me::user_watchlist))
        .merge(admin_routes);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .route("/metrics", get(observability::get_metrics))
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}
