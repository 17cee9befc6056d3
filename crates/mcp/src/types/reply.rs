use rmcp::model::CallToolResult;
use serde::Serialize;
use serde_json::Value;

use super::errors::{ErrorKind, ToolError};

/// Structured failure returned as the content of an `isError` tool result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolFailure {
    pub error: ErrorKind,
    pub message: String,
    pub tool: String,
    pub category: &'static str,
    pub retryable: bool,
    pub suggested_action: &'static str,
}

/// Outcome of one dispatched tool call.
///
/// Serializes as `{"success": payload}` or as the flat [`ToolFailure`] object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolReply {
    Success { success: Value },
    Failure(ToolFailure),
}

impl ToolReply {
    pub fn success(payload: Value) -> Self {
        ToolReply::Success { success: payload }
    }

    pub fn failure(tool: impl Into<String>, error: &ToolError) -> Self {
        let kind = error.kind();
        ToolReply::Failure(ToolFailure {
            error: kind,
            message: error.to_string(),
            tool: tool.into(),
            category: kind.category(),
            retryable: error.retryable(),
            suggested_action: error.suggested_action(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolReply::Success { .. })
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            ToolReply::Success { success } => Some(success),
            ToolReply::Failure(_) => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            ToolReply::Success { .. } => None,
            ToolReply::Failure(failure) => Some(failure.error),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ToolReply::Success { success } => serde_json::json!({ "success": success }),
            ToolReply::Failure(failure) => serde_json::json!({
                "error": failure.error,
                "message": failure.message,
                "tool": failure.tool,
                "category": failure.category,
                "retryable": failure.retryable,
                "suggested_action": failure.suggested_action,
            }),
        }
    }

    pub fn into_call_tool_result(self) -> CallToolResult {
        let value = self.to_value();
        if self.is_success() {
            CallToolResult::structured(value)
        } else {
            CallToolResult::structured_error(value)
        }
    }
}
