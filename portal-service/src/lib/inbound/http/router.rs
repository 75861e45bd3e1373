use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::dashboard::dashboard;
use super::handlers::dashboard::doctor_view;
use super::handlers::dashboard::patient_view;
use super::handlers::login::login;
use super::handlers::login::login_page;
use super::handlers::login::root;
use super::handlers::logout::logout;
use super::handlers::signup::signup;
use super::handlers::signup::signup_page;
use super::middleware::require_identity;
use super::middleware::resolve_identity;
use crate::domain::session::ports::SessionServicePort;
use crate::domain::user::ports::UserServicePort;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServicePort>,
    pub session_service: Arc<dyn SessionServicePort>,
    pub authenticator: Arc<Authenticator>,
    pub secure_cookies: bool,
}

/// Limits and locations the router needs beyond the shared state.
#[derive(Debug, Clone)]
pub struct RouterSettings<'a> {
    pub uploads_directory: &'a Path,
    pub max_request_bytes: usize,
}

pub fn create_router(state: AppState, settings: RouterSettings<'_>) -> Router {
    let public_routes = Router::new()
        .route("/", get(root))
        .route(
            "/signup",
            get(signup_page)
                .post(signup)
                .layer(DefaultBodyLimit::max(settings.max_request_bytes)),
        )
        .route("/login", get(login_page).post(login));

    let protected_routes = Router::new()
        .route("/logout", get(logout))
        .route("/dashboard", get(dashboard))
        .route("/patient", get(patient_view))
        .route("/doctor", get(doctor_view))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_identity,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            // Headers stay out of the span: they carry session cookies
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri().path(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                path = %request.uri().path(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/uploads", ServeDir::new(settings.uploads_directory))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            resolve_identity,
        ))
        .layer(trace_layer)
        .with_state(state)
}
