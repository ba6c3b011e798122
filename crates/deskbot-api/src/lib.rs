//! Deskbot API crate - axum HTTP server and route handlers.
//!
//! Exposes the chat transport contract: submit a message, fetch a session's
//! history, clear it, and a health check.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
