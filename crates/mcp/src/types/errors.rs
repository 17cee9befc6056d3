//! Error taxonomy of the tool surface.

use std::fmt;

use serde::Serialize;
use temporal_mcp_api::TemporalError;
use temporal_mcp_types::WorkflowStatus;
use thiserror::Error;

/// Stable error kinds reported to MCP clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConfigurationError,
    ConnectionError,
    UnknownTool,
    MissingParameter,
    InvalidParameter,
    NotFound,
    AlreadyExists,
    WorkflowAlreadyExists,
    ScheduleAlreadyExists,
    Timeout,
    WorkflowFailed,
    Cancelled,
    PlatformError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ConfigurationError => "configuration_error",
            ErrorKind::ConnectionError => "connection_error",
            ErrorKind::UnknownTool => "unknown_tool",
            ErrorKind::MissingParameter => "missing_parameter",
            ErrorKind::InvalidParameter => "invalid_parameter",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::WorkflowAlreadyExists => "workflow_already_exists",
            ErrorKind::ScheduleAlreadyExists => "schedule_already_exists",
            ErrorKind::Timeout => "timeout",
            ErrorKind::WorkflowFailed => "workflow_failed",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::PlatformError => "platform_error",
        }
    }

    /// Coarse grouping used by clients that only branch on the category.
    pub fn category(&self) -> &'static str {
        match self {
            ErrorKind::ConfigurationError => "configuration",
            ErrorKind::UnknownTool | ErrorKind::MissingParameter | ErrorKind::InvalidParameter => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyExists | ErrorKind::WorkflowAlreadyExists | ErrorKind::ScheduleAlreadyExists => "conflict",
            ErrorKind::ConnectionError | ErrorKind::Timeout => "transport",
            ErrorKind::WorkflowFailed | ErrorKind::Cancelled | ErrorKind::PlatformError => "execution",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single tool call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("unknown tool '{name}'")]
    UnknownTool { name: String },

    #[error("missing required parameter '{parameter}'")]
    MissingParameter { parameter: String },

    #[error("invalid parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    AlreadyExists { message: String },

    #[error("workflow '{workflow_id}' is already running")]
    WorkflowAlreadyExists { workflow_id: String },

    #[error("schedule '{schedule_id}' already exists")]
    ScheduleAlreadyExists { schedule_id: String },

    #[error("{message}")]
    Timeout { message: String },

    #[error("workflow '{workflow_id}' closed with status {status}: {reason}")]
    WorkflowFailed {
        workflow_id: String,
        status: WorkflowStatus,
        reason: String,
    },

    #[error("request cancelled by the client")]
    Cancelled,

    #[error("{message}")]
    Connection { message: String },

    #[error("{message}")]
    Platform { message: String },
}

impl ToolError {
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool { name: name.into() }
    }

    pub fn missing_parameter(parameter: impl Into<String>) -> Self {
        Self::MissingParameter {
            parameter: parameter.into(),
        }
    }

    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout { message: message.into() }
    }

    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform { message: message.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::UnknownTool { .. } => ErrorKind::UnknownTool,
            ToolError::MissingParameter { .. } => ErrorKind::MissingParameter,
            ToolError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            ToolError::NotFound { .. } => ErrorKind::NotFound,
            ToolError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            ToolError::WorkflowAlreadyExists { .. } => ErrorKind::WorkflowAlreadyExists,
            ToolError::ScheduleAlreadyExists { .. } => ErrorKind::ScheduleAlreadyExists,
            ToolError::Timeout { .. } => ErrorKind::Timeout,
            ToolError::WorkflowFailed { .. } => ErrorKind::WorkflowFailed,
            ToolError::Cancelled => ErrorKind::Cancelled,
            ToolError::Connection { .. } => ErrorKind::ConnectionError,
            ToolError::Platform { .. } => ErrorKind::PlatformError,
        }
    }

    /// Whether repeating the same call may succeed.
    pub fn retryable(&self) -> bool {
        matches!(self, ToolError::Connection { .. } | ToolError::Timeout { .. })
    }

    pub fn suggested_action(&self) -> &'static str {
        match self {
            ToolError::UnknownTool { .. } => "List the available tools and call one of them by its exact name.",
            ToolError::MissingParameter { .. } | ToolError::InvalidParameter { .. } => {
                "Fix the arguments to match the tool's input schema and call again."
            }
            ToolError::NotFound { .. } => "Check the identifier and namespace; use list_workflows or list_schedules to discover valid ids.",
            ToolError::AlreadyExists { .. } => "Use a different identifier or operate on the existing resource.",
            ToolError::WorkflowAlreadyExists { .. } => "Choose another workflow_id or inspect the running execution with describe_workflow.",
            ToolError::ScheduleAlreadyExists { .. } => "Choose another schedule_id or manage the existing schedule.",
            ToolError::Timeout { .. } => "The workflow may still be running. Use describe_workflow to check its status.",
            ToolError::WorkflowFailed { .. } => "Inspect the execution with describe_workflow or get_workflow_history.",
            ToolError::Cancelled => "Call the tool again if the result is still needed.",
            ToolError::Connection { .. } => "Verify the Temporal host, TLS settings and credentials, then retry.",
            ToolError::Platform { .. } => "Check the Temporal server logs for details.",
        }
    }
}

impl From<TemporalError> for ToolError {
    fn from(error: TemporalError) -> Self {
        match error {
            TemporalError::NotFound { message } => ToolError::NotFound { message },
            TemporalError::AlreadyExists { message } => ToolError::AlreadyExists { message },
            TemporalError::InvalidArgument { message } => ToolError::InvalidParameter {
                parameter: "arguments".to_string(),
                reason: message,
            },
            TemporalError::Connection { message } => ToolError::Connection {
                message: format!("cannot reach Temporal: {message}"),
            },
            TemporalError::Timeout { message } => ToolError::Timeout {
                message: format!("Temporal request timed out: {message}"),
            },
            error @ (TemporalError::Platform { .. } | TemporalError::Decode { .. }) => ToolError::Platform {
                message: error.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_serialize_as_stable_strings() {
        assert_eq!(serde_json::to_value(ErrorKind::WorkflowAlreadyExists).unwrap(), "workflow_already_exists");
        assert_eq!(ErrorKind::ConnectionError.as_str(), "connection_error");
        assert_eq!(ErrorKind::ScheduleAlreadyExists.category(), "conflict");
    }

    #[test]
    fn platform_errors_are_reclassified() {
        let error = ToolError::from(TemporalError::not_found("workflow not found"));
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert!(!error.retryable());

        let error = ToolError::from(TemporalError::connection("connection refused"));
        assert_eq!(error.kind(), ErrorKind::ConnectionError);
        assert!(error.retryable());

        let error = ToolError::from(TemporalError::Platform {
            status: 500,
            message: "boom".into(),
        });
        assert!(matches!(error, ToolError::Platform { ref message } if message.contains("500")));
    }

    #[test]
    fn messages_name_the_parameter() {
        assert_eq!(
            ToolError::missing_parameter("workflow_id").to_string(),
            "missing required parameter 'workflow_id'"
        );
        assert_eq!(
            ToolError::invalid_parameter("limit", "must be between 1 and 1000").to_string(),
            "invalid parameter 'limit': must be between 1 and 1000"
        );
    }
}
