use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use super::arguments::{
    ContinueAsNewArguments, QueryWorkflowArguments, SignalWorkflowArguments, TerminateWorkflowArguments, WorkflowTarget,
};
use crate::{dispatcher::ToolContext, registry::ToolHandler, types::ToolError};

pub struct QueryWorkflow;

#[async_trait]
impl ToolHandler for QueryWorkflow {
    type Arguments = QueryWorkflowArguments;

    async fn call(&self, context: &ToolContext, arguments: QueryWorkflowArguments) -> Result<Value, ToolError> {
        let result = context
            .temporal()
            .query_workflow(&arguments.execution(), &arguments.query_name, arguments.query_args())
            .await?;
        Ok(json!({
            "workflow_id": arguments.workflow_id,
            "query_name": arguments.query_name,
            "query_result": result,
        }))
    }
}

pub struct SignalWorkflow;

#[async_trait]
impl ToolHandler for SignalWorkflow {
    type Arguments = SignalWorkflowArguments;

    async fn call(&self, context: &ToolContext, arguments: SignalWorkflowArguments) -> Result<Value, ToolError> {
        let payload = Some(&arguments.args).filter(|args| !args.is_null());
        context
            .temporal()
            .signal_workflow(&arguments.execution(), &arguments.signal_name, payload)
            .await?;
        info!(workflow_id = %arguments.workflow_id, signal = %arguments.signal_name, "signal sent");
        Ok(json!({
            "workflow_id": arguments.workflow_id,
            "signal_name": arguments.signal_name,
            "status": "signal_sent",
        }))
    }
}

pub struct CancelWorkflow;

#[async_trait]
impl ToolHandler for CancelWorkflow {
    type Arguments = WorkflowTarget;

    async fn call(&self, context: &ToolContext, arguments: WorkflowTarget) -> Result<Value, ToolError> {
        context.temporal().cancel_workflow(&arguments.execution()).await?;
        info!(workflow_id = %arguments.workflow_id, "cancellation requested");
        Ok(json!({
            "workflow_id": arguments.workflow_id,
            "status": "cancel_requested",
        }))
    }
}

pub struct TerminateWorkflow;

#[async_trait]
impl ToolHandler for TerminateWorkflow {
    type Arguments = TerminateWorkflowArguments;

    async fn call(&self, context: &ToolContext, arguments: TerminateWorkflowArguments) -> Result<Value, ToolError> {
        context
            .temporal()
            .terminate_workflow(&arguments.execution(), &arguments.reason)
            .await?;
        info!(workflow_id = %arguments.workflow_id, reason = %arguments.reason, "workflow terminated");
        Ok(json!({
            "workflow_id": arguments.workflow_id,
            "reason": arguments.reason,
            "status": "terminated",
        }))
    }
}

/// Continue-as-new is decided by workflow code, so the tool only delivers the
/// signal the workflow listens for.
pub struct ContinueAsNew;

#[async_trait]
impl ToolHandler for ContinueAsNew {
    type Arguments = ContinueAsNewArguments;

    async fn call(&self, context: &ToolContext, arguments: ContinueAsNewArguments) -> Result<Value, ToolError> {
        let signal_name = arguments.signal_name();
        context
            .temporal()
            .signal_workflow(&arguments.execution(), signal_name, arguments.signal_args())
            .await?;
        info!(workflow_id = %arguments.workflow_id, signal = %signal_name, "continue-as-new requested");
        Ok(json!({
            "workflow_id": arguments.workflow_id,
            "signal_name": signal_name,
            "status": "continue_as_new_requested",
        }))
    }
}
