//! Routes tool calls through the registry to their handlers.

use std::sync::Arc;

use rmcp::model::{CallToolRequestParams, JsonObject};
use serde_json::Value;
use temporal_mcp_api::{ServerSettings, SharedTemporalClient};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span, warn};

use crate::{
    registry::ToolRegistry,
    types::{ToolError, ToolReply},
};

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct ToolContext {
    temporal: SharedTemporalClient,
    settings: ServerSettings,
}

impl ToolContext {
    pub fn new(temporal: SharedTemporalClient, settings: ServerSettings) -> Self {
        Self { temporal, settings }
    }

    pub fn temporal(&self) -> &SharedTemporalClient {
        &self.temporal
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }
}

/// A tool name plus its raw JSON arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub name: String,
    pub arguments: JsonObject,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, arguments: JsonObject) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Accepts an object or `null` (no arguments).
    pub fn from_value(name: impl Into<String>, arguments: Value) -> Result<Self, ToolError> {
        match arguments {
            Value::Object(arguments) => Ok(Self::new(name, arguments)),
            Value::Null => Ok(Self::new(name, JsonObject::new())),
            other => Err(ToolError::invalid_parameter(
                "arguments",
                format!("expected a JSON object, got {other}"),
            )),
        }
    }
}

impl From<CallToolRequestParams> for ToolCallRequest {
    fn from(params: CallToolRequestParams) -> Self {
        Self::new(params.name.into_owned(), params.arguments.unwrap_or_default())
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    context: Arc<ToolContext>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, context: ToolContext) -> Self {
        Self {
            registry,
            context: Arc::new(context),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn context(&self) -> &ToolContext {
        &self.context
    }

    /// Runs one tool call to completion or until `cancellation` fires.
    ///
    /// Validation happens before the handler future exists, so a call with bad
    /// arguments never reaches the platform client. Every failure is folded
    /// into the returned [`ToolReply`].
    pub async fn dispatch(&self, request: ToolCallRequest, cancellation: &CancellationToken) -> ToolReply {
        let ToolCallRequest { name, arguments } = request;
        let span = info_span!("tool_call", tool = %name);
        async {
            match self.run(&name, arguments, cancellation).await {
                Ok(payload) => {
                    debug!("tool call succeeded");
                    ToolReply::success(payload)
                }
                Err(error) => {
                    warn!(kind = %error.kind(), %error, "tool call failed");
                    ToolReply::failure(name.as_str(), &error)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(&self, name: &str, arguments: JsonObject, cancellation: &CancellationToken) -> Result<Value, ToolError> {
        let descriptor = self.registry.lookup(name).map_err(|_| ToolError::unknown_tool(name))?;
        let call = descriptor.prepare(&self.context, arguments)?;
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(ToolError::Cancelled),
            result = call => result,
        }
    }
}
