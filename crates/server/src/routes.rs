pub mod auth;
pub mod cash_cards;

use axum::{
    middleware,
    routing::get,
    Json, Router,
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

use self::auth::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(crate::openapi::ApiDoc::openapi())
}

/// Build the application router: public health and docs routes, and the card
/// routes behind Basic auth.
pub fn build_router(state: ServerState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json));

    let cards = Router::new()
        .route("/cashcards", get(cash_cards::list).post(cash_cards::create))
        .route(
            "/cashcards/:id",
            get(cash_cards::get).put(cash_cards::update).delete(cash_cards::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_basic_auth));

    public
        .merge(cards)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                // one INFO span per request; headers stay out since they carry credentials
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
