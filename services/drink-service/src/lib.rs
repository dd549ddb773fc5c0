pub mod app_state;
pub mod config;
pub mod drink_handlers;
pub mod metrics;
pub mod model;
pub mod permissions;
pub mod store;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, patch},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

pub use app_state::AppState;
pub use common_http_errors::ApiError;

use drink_handlers::{create_drink, delete_drink, get_drinks_detail, health, list_drinks, update_drink};
use metrics::{render_metrics, track_http_errors};

pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        ))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE, AUTHORIZATION])
}

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/drinks", get(list_drinks).post(create_drink))
        .route("/drinks-detail", get(get_drinks_detail))
        .route("/drinks/:id", patch(update_drink).delete(delete_drink))
        .route("/healthz", get(health))
        .route("/metrics", get(render_metrics))
        .with_state(state)
        .layer(middleware::from_fn(track_http_errors))
        .layer(cors_layer(allowed_origins))
}
