use serde::Deserialize;
use thiserror::Error;

/// Failure reported by a [`TemporalClient`](crate::TemporalClient) call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemporalError {
    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("already exists: {message}")]
    AlreadyExists { message: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("cannot reach Temporal: {message}")]
    Connection { message: String },

    #[error("request timed out: {message}")]
    Timeout { message: String },

    #[error("Temporal returned HTTP {status}: {message}")]
    Platform { status: u16, message: String },

    #[error("unexpected response from Temporal: {message}")]
    Decode { message: String },
}

/// Error body returned by the frontend HTTP API.
#[derive(Debug, Default, Deserialize)]
struct StatusBody {
    #[serde(default)]
    code: Option<i32>,
    #[serde(default)]
    message: Option<String>,
}

/// gRPC codes that carry their own classification when the HTTP status is generic.
const GRPC_INVALID_ARGUMENT: i32 = 3;
const GRPC_DEADLINE_EXCEEDED: i32 = 4;
const GRPC_NOT_FOUND: i32 = 5;
const GRPC_ALREADY_EXISTS: i32 = 6;

impl TemporalError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists { message: message.into() }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument { message: message.into() }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into() }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout { message: message.into() }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode { message: message.into() }
    }

    /// Classifies a non-success HTTP response.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: StatusBody = serde_json::from_str(body).unwrap_or_default();
        let message = parsed
            .message
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| match body.trim() {
                "" => format!("HTTP {status}"),
                text => text.to_string(),
            });
        match (status, parsed.code) {
            (404, _) | (_, Some(GRPC_NOT_FOUND)) => Self::NotFound { message },
            (409, _) | (_, Some(GRPC_ALREADY_EXISTS)) => Self::AlreadyExists { message },
            (400, _) | (_, Some(GRPC_INVALID_ARGUMENT)) => Self::InvalidArgument { message },
            (408 | 504, _) | (_, Some(GRPC_DEADLINE_EXCEEDED)) => Self::Timeout { message },
            _ => Self::Platform { status, message },
        }
    }

    /// Classifies a failure to send or read a request.
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else if error.is_decode() {
            Self::decode(error.to_string())
        } else {
            Self::connection(error.to_string())
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_kinds() {
        assert!(matches!(
            TemporalError::from_response(404, r#"{"code":5,"message":"workflow not found"}"#),
            TemporalError::NotFound { message } if message == "workflow not found"
        ));
        assert!(matches!(TemporalError::from_response(409, "{}"), TemporalError::AlreadyExists { .. }));
        assert!(matches!(TemporalError::from_response(400, "bad"), TemporalError::InvalidArgument { message } if message == "bad"));
        assert!(matches!(TemporalError::from_response(504, ""), TemporalError::Timeout { .. }));
        assert!(matches!(
            TemporalError::from_response(503, r#"{"code":14,"message":"unavailable"}"#),
            TemporalError::Platform { status: 503, .. }
        ));
    }

    #[test]
    fn grpc_code_refines_generic_status() {
        let error = TemporalError::from_response(500, r#"{"code":6,"message":"Workflow execution is already running"}"#);
        assert!(matches!(error, TemporalError::AlreadyExists { .. }));
    }

    #[test]
    fn only_transport_failures_are_retryable() {
        assert!(TemporalError::connection("refused").is_retryable());
        assert!(TemporalError::timeout("slow").is_retryable());
        assert!(!TemporalError::not_found("gone").is_retryable());
    }
}
