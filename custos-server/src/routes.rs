use axum::{
    Json, Router, middleware,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use custos_core::ApiResponse;
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::infra::app_state::AppState;
use crate::infra::config::Config;
use crate::{audit, auth, users};

/// Assembles the full application router: public endpoints, the
/// access-protected surface, and the refresh-gated endpoint, under `/api`.
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let protected = Router::new()
        .route("/auth/me", get(auth::handlers::me))
        .route(
            "/users",
            get(users::handlers::list_users).post(users::handlers::create_user),
        )
        .route(
            "/users/{id}",
            get(users::handlers::get_user)
                .put(users::handlers::update_user)
                .delete(users::handlers::delete_user),
        )
        .route("/user-logs", get(audit::handlers::list_user_logs))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_access_token,
        ));

    let refresh = Router::new()
        .route("/auth/refresh-token", post(auth::handlers::refresh_token))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_refresh_token,
        ));

    let api = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth::handlers::login))
        .merge(protected)
        .merge(refresh);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(json!({
        "status": "ok",
        "message": "Service is running",
    })))
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
