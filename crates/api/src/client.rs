use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use temporal_mcp_types::{
    HistoryEvent, ListPage, NewSchedule, ScheduleSummary, StartWorkflowSpec, WorkflowExecution, WorkflowExecutionRef, WorkflowOutcome,
};

use crate::error::TemporalError;

pub type SharedTemporalClient = Arc<dyn TemporalClient>;

/// Operations the tool layer needs from a Temporal cluster.
///
/// Implementations are shared read-only across concurrent tool calls and
/// never retry on their own; every failure is returned to the caller.
#[async_trait]
pub trait TemporalClient: Send + Sync + 'static {
    fn namespace(&self) -> &str;

    /// Starts a workflow and returns the run id of the new execution.
    async fn start_workflow(&self, spec: &StartWorkflowSpec) -> Result<String, TemporalError>;

    async fn describe_workflow(&self, execution: &WorkflowExecutionRef) -> Result<WorkflowExecution, TemporalError>;

    /// One page of executions matching a visibility query (empty matches all).
    async fn list_workflows(
        &self,
        query: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<ListPage<WorkflowExecution>, TemporalError>;

    async fn workflow_history(
        &self,
        execution: &WorkflowExecutionRef,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<ListPage<HistoryEvent>, TemporalError>;

    /// Waits until the execution closes, following continue-as-new and retry chains.
    ///
    /// Resolves only once the workflow is closed; callers bound it with a deadline.
    async fn await_workflow_outcome(&self, execution: &WorkflowExecutionRef) -> Result<WorkflowOutcome, TemporalError>;

    async fn query_workflow(&self, execution: &WorkflowExecutionRef, query_name: &str, args: Option<&Value>) -> Result<Value, TemporalError>;

    async fn signal_workflow(&self, execution: &WorkflowExecutionRef, signal_name: &str, args: Option<&Value>) -> Result<(), TemporalError>;

    async fn cancel_workflow(&self, execution: &WorkflowExecutionRef) -> Result<(), TemporalError>;

    async fn terminate_workflow(&self, execution: &WorkflowExecutionRef, reason: &str) -> Result<(), TemporalError>;

    async fn create_schedule(&self, schedule: &NewSchedule) -> Result<(), TemporalError>;

    async fn list_schedules(&self, page_size: usize, page_token: Option<&str>) -> Result<ListPage<ScheduleSummary>, TemporalError>;

    async fn pause_schedule(&self, schedule_id: &str, note: &str) -> Result<(), TemporalError>;

    async fn unpause_schedule(&self, schedule_id: &str, note: &str) -> Result<(), TemporalError>;

    async fn delete_schedule(&self, schedule_id: &str) -> Result<(), TemporalError>;

    /// Starts the schedule's action immediately, outside its cron cadence.
    async fn trigger_schedule(&self, schedule_id: &str) -> Result<(), TemporalError>;
}
