//! HTTP route definitions and handlers.
//!
//! This module organizes all HTTP endpoints into logical groups:
//! pages, authentication, diagnostics, health checks and metrics.

mod auth_routes;
mod debug_env;
mod health_routes;
mod legal;
mod metrics;
mod pages;

use crate::state::AppState;
use axum::Router;

/// Creates the application router with all configured routes.
///
/// Combines all route modules into a single router and attaches
/// the application state for access in handlers.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(pages::routes())
        .merge(auth_routes::routes())
        .merge(legal::routes())
        .merge(debug_env::routes())
        .merge(health_routes::routes())
        .merge(metrics::routes())
        .with_state(state)
}
