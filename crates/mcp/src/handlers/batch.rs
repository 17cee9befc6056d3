//! Batch tools: one listing, then the single-workflow operation per match.
//!
//! Items are processed with bounded concurrency through an order-preserving
//! buffered stream, so outcomes come back in listing order. A failing item is
//! recorded and the batch continues.

use std::future::Future;

use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use serde_json::Value;
use temporal_mcp_api::TemporalError;
use temporal_mcp_types::{BatchItemOutcome, BatchReport, WorkflowExecution, WorkflowExecutionRef};
use tracing::{info, warn};

use super::{
    arguments::{BatchSelection, BatchSignalArguments, BatchTerminateArguments},
    encode,
    pagination::collect_window,
};
use crate::{dispatcher::ToolContext, registry::ToolHandler, types::ToolError};

async fn run_batch<F, Fut>(context: &ToolContext, operation: &str, selection: &BatchSelection, apply: F) -> Result<Value, ToolError>
where
    F: Fn(WorkflowExecutionRef) -> Fut,
    Fut: Future<Output = Result<(), TemporalError>>,
{
    let limit = selection.limit()?;
    let query = selection.query.as_str();
    let targets: Vec<WorkflowExecution> = collect_window(0, limit, |page_size, token| async move {
        context.temporal().list_workflows(query, page_size, token.as_deref()).await
    })
    .await?;
    info!(operation, query, targets = targets.len(), "running batch");

    let outcomes: Vec<BatchItemOutcome> = stream::iter(targets)
        .map(|execution| {
            let target = WorkflowExecutionRef::new(execution.workflow_id, Some(execution.run_id));
            let pending = apply(target.clone());
            async move {
                match pending.await {
                    Ok(()) => BatchItemOutcome::succeeded(target.workflow_id, target.run_id),
                    Err(error) => {
                        let error = ToolError::from(error);
                        warn!(operation, workflow_id = %target.workflow_id, %error, "batch item failed");
                        BatchItemOutcome::failed(target.workflow_id, target.run_id, error.kind().as_str(), error.to_string())
                    }
                }
            }
        })
        .buffered(context.settings().batch_concurrency.max(1))
        .collect()
        .await;

    let report = BatchReport::new(operation, query, outcomes);
    info!(operation, succeeded = report.succeeded, failed = report.failed, "batch finished");
    encode(&report)
}

pub struct BatchSignal;

#[async_trait]
impl ToolHandler for BatchSignal {
    type Arguments = BatchSignalArguments;

    async fn call(&self, context: &ToolContext, arguments: BatchSignalArguments) -> Result<Value, ToolError> {
        let signal_name = arguments.signal_name.as_str();
        let payload = arguments.signal_args();
        run_batch(context, "signal", &arguments.selection, |target| async move {
            context.temporal().signal_workflow(&target, signal_name, payload).await
        })
        .await
    }
}

pub struct BatchCancel;

#[async_trait]
impl ToolHandler for BatchCancel {
    type Arguments = BatchSelection;

    async fn call(&self, context: &ToolContext, arguments: BatchSelection) -> Result<Value, ToolError> {
        run_batch(context, "cancel", &arguments, |target| async move {
            context.temporal().cancel_workflow(&target).await
        })
        .await
    }
}

pub struct BatchTerminate;

#[async_trait]
impl ToolHandler for BatchTerminate {
    type Arguments = BatchTerminateArguments;

    async fn call(&self, context: &ToolContext, arguments: BatchTerminateArguments) -> Result<Value, ToolError> {
        let reason = arguments.reason.as_str();
        run_batch(context, "terminate", &arguments.selection, |target| async move {
            context.temporal().terminate_workflow(&target, reason).await
        })
        .await
    }
}
