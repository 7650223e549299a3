//! Cambium API crate - axum HTTP server and route handlers.
//!
//! Provides the REST API for the Cambium chatbot: session lifecycle,
//! message submission, the embedded chat page, and health checks.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod ui;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
