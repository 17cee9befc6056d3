//! Tool handlers and the static Temporal tool catalog.

pub mod arguments;
mod batch;
mod interaction;
mod pagination;
mod schedule;
mod workflow;

use rmcp::model::ToolAnnotations;
use serde::Serialize;
use serde_json::Value;

pub use batch::{BatchCancel, BatchSignal, BatchTerminate};
pub use interaction::{CancelWorkflow, ContinueAsNew, QueryWorkflow, SignalWorkflow, TerminateWorkflow};
pub use schedule::{CreateSchedule, DeleteSchedule, ListSchedules, PauseSchedule, TriggerSchedule, UnpauseSchedule};
pub use workflow::{DescribeWorkflow, GetWorkflowHistory, GetWorkflowResult, ListWorkflows, StartWorkflow};

use crate::{
    registry::{RegistryError, ToolDescriptor, ToolRegistry},
    types::ToolError,
};

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|error| ToolError::platform(format!("failed to encode reply: {error}")))
}

fn read_only() -> ToolAnnotations {
    ToolAnnotations::new().read_only(true).destructive(false).idempotent(true).open_world(true)
}

fn mutating(idempotent: bool) -> ToolAnnotations {
    ToolAnnotations::new().read_only(false).destructive(false).idempotent(idempotent).open_world(true)
}

fn destructive(idempotent: bool) -> ToolAnnotations {
    ToolAnnotations::new().read_only(false).destructive(true).idempotent(idempotent).open_world(true)
}

/// Every Temporal tool, in the order `tools/list` advertises them.
pub fn catalog() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "start_workflow",
            "Start a new workflow execution. Input: workflow_name, workflow_id, task_queue, args, optional timeouts in seconds and retry_policy. Returns workflow_id, run_id and status 'started'. Fails with workflow_already_exists when the id is in use by a running workflow.",
            StartWorkflow,
        )
        .annotate(mutating(false)),
        ToolDescriptor::new(
            "get_workflow_result",
            "Wait for a workflow to close and return its result. Optional run_id and timeout_seconds. Fails with workflow_failed when the workflow closes without completing and with timeout when it is still running after the wait.",
            GetWorkflowResult,
        )
        .annotate(read_only()),
        ToolDescriptor::new(
            "describe_workflow",
            "Describe a workflow execution: status (RUNNING, COMPLETED, FAILED, ...), type, task queue, timestamps and history length.",
            DescribeWorkflow,
        )
        .annotate(read_only()),
        ToolDescriptor::new(
            "get_workflow_history",
            "Return the event history of a workflow execution, oldest first, up to limit events (default 1000).",
            GetWorkflowHistory,
        )
        .annotate(read_only()),
        ToolDescriptor::new(
            "list_workflows",
            "List workflow executions matching a visibility query. Paginate with limit and skip; pass next_skip back as skip while has_more is true.",
            ListWorkflows,
        )
        .annotate(read_only()),
        ToolDescriptor::new(
            "query_workflow",
            "Run a query handler on a workflow and return query_result. Queries never change workflow state.",
            QueryWorkflow,
        )
        .annotate(read_only()),
        ToolDescriptor::new(
            "signal_workflow",
            "Send a signal with a payload to a running workflow.",
            SignalWorkflow,
        )
        .annotate(mutating(false)),
        ToolDescriptor::new(
            "cancel_workflow",
            "Request graceful cancellation of a running workflow. The workflow decides how to clean up.",
            CancelWorkflow,
        )
        .annotate(destructive(true)),
        ToolDescriptor::new(
            "terminate_workflow",
            "Terminate a running workflow immediately, recording reason in its history. No cleanup code runs.",
            TerminateWorkflow,
        )
        .annotate(destructive(false)),
        ToolDescriptor::new(
            "continue_as_new",
            "Ask a running workflow to continue as new by sending it a signal (default 'continue_as_new'). The workflow must handle the signal by restarting itself.",
            ContinueAsNew,
        )
        .annotate(mutating(false)),
        ToolDescriptor::new(
            "batch_signal",
            "Signal up to limit workflows matching a non-empty visibility query. Returns one outcome per targeted workflow; failures do not stop the batch.",
            BatchSignal,
        )
        .annotate(mutating(false)),
        ToolDescriptor::new(
            "batch_cancel",
            "Cancel up to limit workflows matching a non-empty visibility query. Returns one outcome per targeted workflow; failures do not stop the batch.",
            BatchCancel,
        )
        .annotate(destructive(false)),
        ToolDescriptor::new(
            "batch_terminate",
            "Terminate up to limit workflows matching a non-empty visibility query with the given reason. Returns one outcome per targeted workflow; failures do not stop the batch.",
            BatchTerminate,
        )
        .annotate(destructive(false)),
        ToolDescriptor::new(
            "create_schedule",
            "Create a cron schedule that starts workflow_name on task_queue on every tick. Fails with schedule_already_exists when schedule_id is taken.",
            CreateSchedule,
        )
        .annotate(mutating(false)),
        ToolDescriptor::new(
            "list_schedules",
            "List schedules with their paused state. Same limit/skip pagination as list_workflows.",
            ListSchedules,
        )
        .annotate(read_only()),
        ToolDescriptor::new("pause_schedule", "Pause a schedule with an optional note.", PauseSchedule).annotate(mutating(true)),
        ToolDescriptor::new("unpause_schedule", "Resume a paused schedule with an optional note.", UnpauseSchedule)
            .annotate(mutating(true)),
        ToolDescriptor::new(
            "delete_schedule",
            "Delete a schedule. Workflows it already started keep running.",
            DeleteSchedule,
        )
        .annotate(destructive(false)),
        ToolDescriptor::new(
            "trigger_schedule",
            "Start the schedule's workflow immediately, outside its cron cadence.",
            TriggerSchedule,
        )
        .annotate(mutating(false)),
    ]
}

impl ToolRegistry {
    /// Registry holding the full [`catalog`].
    pub fn temporal() -> Result<Self, RegistryError> {
        let mut registry = ToolRegistry::new();
        for descriptor in catalog() {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }
}
