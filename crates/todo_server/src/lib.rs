//! HTTP boundary for the TODO store.
//!
//! Routes:
//! - `GET /healthz`
//! - `GET|POST|PUT|DELETE /todos`

pub mod api;
pub mod config;
pub mod error;
pub mod handler;

use axum::Router;
use todo_core::TodoService;

pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use handler::{AppState, DEFAULT_REQUEST_TIMEOUT};

/// Builds the router with the default request timeout.
pub fn app(service: TodoService) -> Router {
    app_with_state(AppState::new(service, DEFAULT_REQUEST_TIMEOUT))
}

pub fn app_with_state(state: AppState) -> Router {
    handler::router(state)
}
