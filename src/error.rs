// SPDX-License-Identifier: MIT

//! Client error types.

use crate::events::Event;

/// Errors surfaced by the client runtime.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network failure, non-2xx status, or an unparseable response body.
    /// The refresh scheduler retries these on its next tick; they never
    /// terminate the background loop.
    #[error("transport error: {0}")]
    Transport(String),

    /// A required field was missing or undecodable while constructing an
    /// entity. Fatal to that single construction only.
    #[error("malformed entity: {0}")]
    MalformedEntity(String),

    /// An operation that needs an established session or identity was
    /// invoked too early.
    #[error("client not ready: {0}")]
    NotReady(&'static str),

    /// Invalid construction parameters or session lifecycle misuse.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// One or more handlers failed during a single event dispatch. Every
    /// failure from the fan-out is collected here; dispatch never
    /// short-circuits on the first.
    #[error("{} handler(s) failed dispatching '{event}'", .failures.len())]
    Dispatch { event: Event, failures: Vec<Error> },
}

impl Error {
    /// HTTP status marker embedded in transport errors for auth failures.
    pub const AUTH_ERROR_MARKER: &'static str = "HTTP 401";

    /// Whether this is a transport error caused by rejected credentials.
    pub fn is_auth_error(&self) -> bool {
        match self {
            Error::Transport(msg) => msg.contains(Self::AUTH_ERROR_MARKER),
            _ => false,
        }
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_auth_error_matches() {
        let err = Error::Transport(format!("{}: credentials rejected", Error::AUTH_ERROR_MARKER));
        assert!(err.is_auth_error());
    }

    #[test]
    fn test_is_auth_error_no_match() {
        let err = Error::Transport("HTTP 500 Internal Server Error: boom".to_string());
        assert!(!err.is_auth_error());

        let err = Error::NotReady("no session");
        assert!(!err.is_auth_error());

        let err = Error::MalformedEntity("user: missing field".to_string());
        assert!(!err.is_auth_error());
    }
}
