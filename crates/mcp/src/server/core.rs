use std::future::Future;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, ErrorData as McpError, Implementation, ListToolsResult, PaginatedRequestParams, ProtocolVersion,
    ServerCapabilities, ServerInfo, Tool,
};
use rmcp::{RoleServer, ServerHandler, service::RequestContext};

use crate::dispatcher::{Dispatcher, ToolCallRequest};

const INSTRUCTIONS: &str = "Temporal workflow operations.\n\
WORKFLOWS:\n\
- start_workflow starts an execution; get_workflow_result waits for it to close.\n\
- describe_workflow and get_workflow_history inspect an execution; list_workflows searches with a visibility query.\n\
- query_workflow reads state; signal_workflow, cancel_workflow, terminate_workflow and continue_as_new change it.\n\
BATCHES:\n\
- batch_signal, batch_cancel and batch_terminate apply to at most `limit` workflows matching a non-empty query and report one outcome per workflow.\n\
SCHEDULES:\n\
- create_schedule, list_schedules, pause_schedule, unpause_schedule, delete_schedule, trigger_schedule.\n\
REPLIES:\n\
- Success is {\"success\": payload}. Failure is {\"error\": kind, \"message\", \"tool\", \"retryable\", \"suggested_action\"}.\n\
- Listings page with limit/skip; pass next_skip back as skip while has_more is true.";

/// MCP server handler that exposes the tool registry.
#[derive(Clone)]
pub struct TemporalMcpServer {
    dispatcher: Dispatcher,
}

impl TemporalMcpServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl ServerHandler for TemporalMcpServer {
    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(self.dispatcher.registry().tools())))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            let reply = self.dispatcher.dispatch(ToolCallRequest::from(request), &context.ct).await;
            Ok(reply.into_call_tool_result())
        }
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.dispatcher.registry().lookup(name).ok().map(|descriptor| descriptor.to_tool())
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: "temporal-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Temporal MCP".to_string()),
                description: Some(format!(
                    "Temporal workflow operations for namespace '{}'",
                    self.dispatcher.context().temporal().namespace()
                )),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use temporal_mcp_api::{InMemoryTemporal, ServerSettings};

    use super::*;
    use crate::{dispatcher::ToolContext, registry::ToolRegistry};

    fn server() -> TemporalMcpServer {
        let registry = Arc::new(ToolRegistry::temporal().unwrap());
        let context = ToolContext::new(Arc::new(InMemoryTemporal::new()), ServerSettings::default());
        TemporalMcpServer::new(Dispatcher::new(registry, context))
    }

    #[test]
    fn info_advertises_tools() {
        let info = server().get_info();
        assert!(info.capabilities.tools.is_some());
        assert_eq!(info.server_info.name, "temporal-mcp");
        assert!(info.instructions.unwrap().contains("get_workflow_result"));
    }

    #[test]
    fn get_tool_reads_the_registry() {
        let server = server();
        let tool = server.get_tool("terminate_workflow").unwrap();
        assert_eq!(tool.name, "terminate_workflow");
        assert!(server.get_tool("drop_namespace").is_none());
    }
}
