//! Shared foundation for the Deskbot support assistant.
//!
//! Holds the domain types exchanged between crates (turns, retrieval
//! candidates, intents), the top-level error taxonomy, and the TOML
//! configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::DeskbotConfig;
pub use error::{DeskbotError, Result};
pub use types::{Candidate, Intent, Role, Turn};
