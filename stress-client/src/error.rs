//! Error types for the facade client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the facade
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response was read
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Endpoint returned a non-success HTTP status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// The facade answered with a non-zero application status
    #[error("Command rejected (status {status:?}): {body}")]
    Rejected {
        /// Application status, `None` when the field was missing
        status: Option<i64>,
        /// Raw reply body
        body: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Create a rejection from the reply's status field and raw body
    pub fn rejected(status: Option<i64>, body: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            body: body.into(),
        }
    }

    /// Check if this error happened at the network layer
    ///
    /// Only transport errors are retried; everything else means the server
    /// did answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::RequestFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_is_not_transport() {
        let err = ClientError::rejected(Some(1), "{}");
        assert!(matches!(err, ClientError::Rejected { .. }));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_api_error_display() {
        let err = ClientError::api_error(502, "bad gateway");
        assert_eq!(err.to_string(), "API error (status 502): bad gateway");
        assert!(!err.is_transport());
    }
}
