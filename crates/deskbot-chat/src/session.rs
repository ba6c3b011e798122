//! Session identity.
//!
//! Session ids are opaque tokens coined server-side when a client starts a
//! conversation without one. Client-supplied ids are validated syntactically
//! before they reach the history store or the policy engine.

use uuid::Uuid;

use crate::error::ChatError;

/// Maximum accepted length of a client-supplied session id.
pub const MAX_SESSION_ID_LENGTH: usize = 128;

/// Coin a fresh session id.
///
/// UUID v4 in textual form: 122 bits of randomness, safe to embed in a URL
/// path segment, unique without coordination.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Validate a client-supplied session id.
///
/// Accepts non-empty ids up to [`MAX_SESSION_ID_LENGTH`] characters drawn
/// from the URL-unreserved set (alphanumerics plus `-`, `_`, `.`, `~`), so
/// every accepted id can round-trip through the history-clearing URL path.
pub fn validate_session_id(id: &str) -> Result<(), ChatError> {
    if id.is_empty() {
        return Err(ChatError::InvalidSessionId("must not be empty".to_string()));
    }
    if id.len() > MAX_SESSION_ID_LENGTH {
        return Err(ChatError::InvalidSessionId(format!(
            "must not exceed {} characters",
            MAX_SESSION_ID_LENGTH
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
    {
        return Err(ChatError::InvalidSessionId(
            "must contain only alphanumerics, '-', '_', '.', or '~'".to_string(),
        ));
    }
    Ok(())
}
