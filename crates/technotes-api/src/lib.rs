// Technotes API library
// Decision: Router assembly lives here so integration tests can drive the
// full application against the in-memory store

// API routes and types
pub mod api;

// Authentication module
pub mod auth;

// Error taxonomy
pub mod error;

// OpenAPI spec generation
pub mod openapi;

// Storage layer
pub mod storage;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use auth::AuthConfig;
use error::ErrorResponse;
use storage::StorageBackend;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    storage_mode: &'static str,
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    storage_mode: &'static str,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage_mode: state.storage_mode,
    })
}

async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("404 Not Found")))
}

/// Assemble the application router. CORS and request tracing are layered on
/// by the binary; everything else lives here.
pub fn build_app(db: Arc<StorageBackend>, auth_config: AuthConfig) -> Router {
    let auth_state = auth::AuthState::new(auth_config, db.clone());
    let users_state = api::users::UsersState {
        db: db.clone(),
        auth: auth_state.clone(),
    };
    let notes_state = api::notes::NotesState {
        db: db.clone(),
        auth: auth_state.clone(),
    };
    let health_state = HealthState {
        storage_mode: if db.is_dev_mode() { "memory" } else { "postgres" },
    };

    Router::new()
        .route("/health", get(health).with_state(health_state))
        .merge(auth::routes(auth_state))
        .merge(api::users::routes(users_state))
        .merge(api::notes::routes(notes_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", openapi::ApiDoc::openapi()))
        .fallback(not_found)
}
