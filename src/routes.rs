// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, health, user},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, participant_middleware},
};

/// Assembles the main application router.
///
/// * Public: login, register, health.
/// * `/auth`: any signed-in account.
/// * `/api/v1/user`: participants only.
/// * `/api/v1`: admin catalog management.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let public_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/health", get(health::health));

    let token_routes = Router::new()
        .route("/refresh_token", get(auth::refresh_token))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let participant_routes = Router::new()
        .route("/attempt-test", post(user::attempt_test))
        .route("/answer", post(user::answer_test))
        .route("/test/{id}/result", get(user::result))
        // Layers run outside in: authenticate first, then check the role
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
                .layer(middleware::from_fn(participant_middleware)),
        );

    let admin_routes = Router::new()
        .route("/list-test", get(admin::list_tests))
        .route("/test/{id}/detail", get(admin::test_detail))
        .route("/create-test", post(admin::create_test))
        .route("/create-question", post(admin::create_question))
        .route("/create-choice", post(admin::create_choice))
        .route("/update-test", post(admin::update_test))
        .route("/update-question", post(admin::update_question))
        .route("/update-choice", post(admin::update_choice))
        .route("/delete", delete(admin::delete_test))
        .route("/delete-question", delete(admin::delete_question))
        .route("/delete-choice", delete(admin::delete_choice))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
                .layer(middleware::from_fn(admin_middleware)),
        );

    Router::new()
        .merge(public_routes)
        .nest("/auth", token_routes)
        .nest("/api/v1/user", participant_routes)
        .nest("/api/v1", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
