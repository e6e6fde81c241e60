use crate::controller::{channel_controller, health_check_controller};
use crate::sse::handler::sse_handler;
use axum::handler::HandlerWithoutStateExt;
use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Router};
use service::AppState;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

pub fn define_routes(app_state: AppState) -> Router {
    let static_dir = app_state.config.static_dir.clone();

    Router::new()
        .merge(stream_routes(app_state))
        .merge(health_routes())
        .merge(static_routes(&static_dir))
        .layer(cors_layer())
}

/// Event streams and their client listings
fn stream_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/stream/:channel", get(sse_handler))
        .route("/stream/:channel/clients", get(channel_controller::index))
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

// EventSource clients on other origins must be able to open streams and
// resend Last-Event-ID when reconnecting
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([HeaderName::from_static("last-event-id")])
}

// Serves the demo page and its assets; anything else is a 404
pub fn static_routes(static_dir: &str) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(static_dir).not_found_service(not_found.into_service()))
}

/// The response for unknown routes and unknown channels. Never cached.
pub(crate) async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(
            header::CACHE_CONTROL,
            HeaderValue::from_static("private, no-store"),
        )],
        "Not found",
    )
        .into_response()
}
