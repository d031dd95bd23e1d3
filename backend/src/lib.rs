pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;
pub mod state;
pub mod types;
pub mod utils;
pub mod validation;

use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

/// Builds the full application router around `state`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
        );

    let session_routes = Router::new()
        .route(
            "/api/events/{event_id}/register",
            post(handlers::sessions::register_session),
        )
        .route("/api/sessions/{id}", get(handlers::sessions::get_session))
        .route(
            "/api/sessions/{id}/start",
            post(handlers::sessions::start_session),
        )
        .route(
            "/api/sessions/{id}/update",
            post(handlers::sessions::update_session),
        )
        .route(
            "/api/sessions/{id}/stop",
            post(handlers::sessions::stop_session),
        )
        .route(
            "/api/sessions/{id}/messages",
            post(handlers::voice_messages::create_voice_message),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
