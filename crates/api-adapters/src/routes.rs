//! Route table.

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Builds the full application router with its middleware stack.
pub fn router(state: AppState, body_limit_bytes: usize) -> Router {
    let donations = Router::new()
        .route("/list", get(handlers::list_donations))
        .route("/new", post(handlers::create_donation))
        .route("/edit", post(handlers::edit_donation))
        .route("/report", post(handlers::report_donation))
        .route("/{id}", get(handlers::get_donation))
        .route("/{id}/delete", post(handlers::delete_donation));

    let users = Router::new()
        .route("/new", post(handlers::create_account))
        .route("/delete", post(handlers::delete_user))
        .route("/ban", post(handlers::ban_user))
        .route("/banned", get(handlers::is_banned))
        .route("/admin", get(handlers::is_admin))
        .route("/{id}", get(handlers::get_user));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .nest("/donations", donations)
        .nest("/users", users)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::set_request_id())
                .layer(TraceLayer::new_for_http().make_span_with(middleware::make_span))
                .layer(middleware::propagate_request_id())
                .layer(middleware::cors_layer()),
        )
        .layer(middleware::body_limit(body_limit_bytes))
        .with_state(state)
}
