use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

use crate::observability;
use crate::openapi::ApiDoc;
use crate::session;
use crate::state::ServerState;

pub mod perf;
pub mod prefs;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router: public routes plus the user-scoped preference API.
pub fn build_router(state: ServerState, cors: CorsLayer, max_body_bytes: usize) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/metrics", get(observability::metrics));

    let with_prefs = middleware::from_fn_with_state(state.clone(), session::load_preferences);

    // Every user route needs a resolved user
    let user_api = Router::new()
        .route("/api/user/prefs", get(prefs::get_user_prefs).route_layer(with_prefs.clone()))
        .route(
            "/api/perf/load-test-prefs",
            post(prefs::save_load_test_prefs)
                .route_layer(with_prefs)
                .fallback(prefs::not_found),
        )
        .route(
            "/api/user/prefs/perf",
            get(perf::fetch_test_configs)
                .post(perf::store_test_config)
                .delete(perf::delete_test_config),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), session::require_user));

    public
        .merge(user_api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
