use async_trait::async_trait;
use serde_json::{Value, json};
use temporal_mcp_api::TemporalError;
use temporal_mcp_types::{HistoryEvent, StartWorkflowSpec, WorkflowOutcome};
use tracing::{debug, info};

use super::{
    arguments::{ListWorkflowsArguments, StartWorkflowArguments, WorkflowHistoryArguments, WorkflowResultArguments, WorkflowTarget},
    encode,
    pagination::{collect_window, fetch_page, page_payload},
};
use crate::{dispatcher::ToolContext, registry::ToolHandler, types::ToolError};

pub struct StartWorkflow;

#[async_trait]
impl ToolHandler for StartWorkflow {
    type Arguments = StartWorkflowArguments;

    async fn call(&self, context: &ToolContext, arguments: StartWorkflowArguments) -> Result<Value, ToolError> {
        let mut spec = StartWorkflowSpec::new(&arguments.workflow_id, &arguments.workflow_name, &arguments.task_queue)
            .with_input(Some(arguments.args.clone()));
        spec.execution_timeout = arguments.execution_timeout()?;
        spec.run_timeout = arguments.run_timeout()?;
        spec.task_timeout = arguments.task_timeout()?;
        spec.retry_policy = arguments.retry_policy.clone();

        let run_id = context.temporal().start_workflow(&spec).await.map_err(|error| match error {
            TemporalError::AlreadyExists { .. } => ToolError::WorkflowAlreadyExists {
                workflow_id: arguments.workflow_id.clone(),
            },
            other => other.into(),
        })?;
        info!(workflow_id = %arguments.workflow_id, %run_id, workflow_type = %arguments.workflow_name, "workflow started");
        Ok(json!({
            "workflow_id": arguments.workflow_id,
            "run_id": run_id,
            "workflow_name": arguments.workflow_name,
            "task_queue": arguments.task_queue,
            "namespace": context.temporal().namespace(),
            "status": "started",
        }))
    }
}

pub struct GetWorkflowResult;

#[async_trait]
impl ToolHandler for GetWorkflowResult {
    type Arguments = WorkflowResultArguments;

    async fn call(&self, context: &ToolContext, arguments: WorkflowResultArguments) -> Result<Value, ToolError> {
        let wait = arguments.timeout()?.unwrap_or(context.settings().result_timeout);
        let execution = arguments.execution();
        debug!(workflow_id = %execution.workflow_id, wait_secs = wait.as_secs(), "waiting for workflow result");

        let outcome = tokio::time::timeout(wait, context.temporal().await_workflow_outcome(&execution))
            .await
            .map_err(|_| {
                ToolError::timeout(format!(
                    "workflow '{}' did not complete within {} seconds",
                    execution.workflow_id,
                    wait.as_secs()
                ))
            })??;

        match outcome {
            WorkflowOutcome::Completed { run_id, result } => Ok(json!({
                "workflow_id": execution.workflow_id,
                "run_id": run_id,
                "result": result,
            })),
            WorkflowOutcome::Closed { status, reason, .. } => Err(ToolError::WorkflowFailed {
                workflow_id: execution.workflow_id,
                status,
                reason,
            }),
        }
    }
}

pub struct DescribeWorkflow;

#[async_trait]
impl ToolHandler for DescribeWorkflow {
    type Arguments = WorkflowTarget;

    async fn call(&self, context: &ToolContext, arguments: WorkflowTarget) -> Result<Value, ToolError> {
        let execution = context.temporal().describe_workflow(&arguments.execution()).await?;
        encode(&execution)
    }
}

pub struct GetWorkflowHistory;

#[async_trait]
impl ToolHandler for GetWorkflowHistory {
    type Arguments = WorkflowHistoryArguments;

    async fn call(&self, context: &ToolContext, arguments: WorkflowHistoryArguments) -> Result<Value, ToolError> {
        let limit = arguments.limit()?;
        let execution = arguments.execution();
        // One extra event tells whether the history was cut at `limit`.
        let mut events: Vec<HistoryEvent> = collect_window(0, limit.saturating_add(1), |page_size, token| {
            let execution = &execution;
            async move {
                context
                    .temporal()
                    .workflow_history(execution, page_size, token.as_deref())
                    .await
            }
        })
        .await?;
        let truncated = events.len() > limit;
        events.truncate(limit);
        Ok(json!({
            "workflow_id": execution.workflow_id,
            "run_id": execution.run_id,
            "count": events.len(),
            "truncated": truncated,
            "events": encode(&events)?,
        }))
    }
}

pub struct ListWorkflows;

#[async_trait]
impl ToolHandler for ListWorkflows {
    type Arguments = ListWorkflowsArguments;

    async fn call(&self, context: &ToolContext, arguments: ListWorkflowsArguments) -> Result<Value, ToolError> {
        let limit = arguments.page.limit()?;
        let skip = arguments.page.skip()?;
        let query = arguments.query.as_str();
        let page = fetch_page(skip, limit, |page_size, token| async move {
            context.temporal().list_workflows(query, page_size, token.as_deref()).await
        })
        .await?;
        let mut payload = page_payload("workflows", &page)?;
        if let Value::Object(fields) = &mut payload {
            fields.insert("query".to_string(), Value::String(arguments.query.clone()));
        }
        Ok(payload)
    }
}
