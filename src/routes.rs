mod counts;
mod root;
mod shifts;

use crate::state::AppState;
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

pub fn app(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config()
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();
    let request_timeout = state.config().request_timeout;

    Router::new()
        .route("/", get(root::health))
        .nest("/shifts", shifts::new())
        .nest("/counts", counts::new())
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(
            // POST 帶 application/json 時需要允許 CONTENT_TYPE
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_origin(origins)
                .allow_headers([AUTHORIZATION, CONTENT_TYPE]),
        )
        .with_state(state)
}

async fn fallback() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "api not found")
}
