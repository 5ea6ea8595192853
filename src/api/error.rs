//! Error type shared by the API client and the action commands.

use thiserror::Error;

/// Everything that can go wrong between a user action and a backend reply.
///
/// The display string of each variant is the message shown to the user
/// verbatim, so it carries no prefixes.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (connection refused, DNS, TLS, ...).
    #[error("{0}")]
    Transport(String),

    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// A 2xx response whose body was not the JSON we expected.
    #[error("invalid response from backend: {0}")]
    Decode(String),

    /// A required input was missing; raised before any network call.
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// HTTP status for `Http` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short category name used in the activity log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Http { .. } => "http",
            Self::Decode(_) => "decode",
            Self::Validation(_) => "validation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_displays_message_only() {
        let err = ApiError::Http {
            status: 404,
            message: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "not found");
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.kind(), "http");
    }

    #[test]
    fn validation_error_has_no_status() {
        let err = ApiError::validation("Enter query");
        assert_eq!(err.to_string(), "Enter query");
        assert_eq!(err.status(), None);
    }
}
