use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use ipnet::IpNet;
use tower_http::compression::CompressionLayer;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    delete_user_urls_handler, ping_handler, redirect_handler, shorten_batch_handler,
    shorten_json_handler, shorten_text_handler, stats_handler, user_urls_handler,
};
use crate::identity::identify;
use crate::state::AppState;
use crate::trusted::require_trusted_subnet;

pub struct App {}

impl App {
    /// Builds the HTTP router. `GET /api/internal/stats` only answers
    /// clients inside `trusted_subnet`.
    pub fn router(state: AppState, trusted_subnet: Option<IpNet>) -> Router {
        Router::new()
            .route("/", post(shorten_text_handler))
            .route("/ping", get(ping_handler))
            .route("/{token}", get(redirect_handler))
            .route("/api/shorten", post(shorten_json_handler))
            .route("/api/shorten/batch", post(shorten_batch_handler))
            .route(
                "/api/user/urls",
                get(user_urls_handler).delete(delete_user_urls_handler),
            )
            .route(
                "/api/internal/stats",
                get(stats_handler)
                    .route_layer(from_fn_with_state(trusted_subnet, require_trusted_subnet)),
            )
            .layer(RequestDecompressionLayer::new())
            .layer(from_fn_with_state(state.clone(), identify))
            .layer(CompressionLayer::new())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
