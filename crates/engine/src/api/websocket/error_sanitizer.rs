//! Error sanitization for client-facing messages.
//!
//! Prevents leaking internal details (paths, SQL errors, upstream bodies) to
//! clients.

/// Sanitize a repository error.
pub fn sanitize_repo_error<E: std::fmt::Display>(error: &E, operation: &str) -> String {
    tracing::error!(
        error = %error,
        operation = operation,
        "Repository error"
    );

    format!("Failed to {} - please try again", operation)
}

/// Common error messages for client consumption.
pub mod messages {
    pub const NOT_JOINED: &str = "Not joined to a session";
    pub const INVALID_SESSION: &str = "Invalid session";
    pub const NOT_IN_SESSION: &str = "Not in a session";
    pub const USER_NOT_IN_SESSION: &str = "User not found in session";
    pub const INVALID_MESSAGE: &str = "Invalid message format";
}
