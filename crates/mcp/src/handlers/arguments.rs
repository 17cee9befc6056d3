//! Typed tool arguments. Input schemas are derived from these structs.

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use temporal_mcp_types::{RetryPolicy, WorkflowExecutionRef};

use crate::{registry::ToolArguments, types::ToolError};

pub const MAX_PAGE_LIMIT: i64 = 1000;
pub const DEFAULT_LIST_LIMIT: i64 = 100;
pub const DEFAULT_HISTORY_LIMIT: i64 = 1000;

/// Checks `value` lies in `1..=max` and converts it.
fn bounded(parameter: &str, value: i64, max: i64) -> Result<usize, ToolError> {
    if !(1..=max).contains(&value) {
        return Err(ToolError::invalid_parameter(
            parameter,
            format!("must be between 1 and {max}, got {value}"),
        ));
    }
    usize::try_from(value).map_err(|error| ToolError::invalid_parameter(parameter, error.to_string()))
}

fn non_negative(parameter: &str, value: i64) -> Result<usize, ToolError> {
    usize::try_from(value).map_err(|_| ToolError::invalid_parameter(parameter, format!("must not be negative, got {value}")))
}

fn seconds(parameter: &str, value: Option<i64>) -> Result<Option<Duration>, ToolError> {
    match value {
        None => Ok(None),
        Some(secs) if secs > 0 => Ok(Some(Duration::from_secs(secs.unsigned_abs()))),
        Some(secs) => Err(ToolError::invalid_parameter(
            parameter,
            format!("must be a positive number of seconds, got {secs}"),
        )),
    }
}

fn not_blank(parameter: &str, value: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::invalid_parameter(parameter, "must not be empty"));
    }
    Ok(())
}

/// `args` of `null` means "no input"; anything else is passed through.
fn present(value: &Option<Value>) -> Option<&Value> {
    value.as_ref().filter(|value| !value.is_null())
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StartWorkflowArguments {
    #[schemars(description = "Workflow type name registered by the worker.")]
    pub workflow_name: String,
    #[schemars(description = "Business identifier of the new execution. Must not collide with a running workflow.")]
    pub workflow_id: String,
    #[schemars(description = "Task queue polled by the worker that hosts the workflow.")]
    pub task_queue: String,
    #[schemars(description = "Input passed to the workflow function as a single JSON payload.")]
    pub args: Value,
    #[schemars(description = "Optional limit for the whole execution chain, in seconds.")]
    pub execution_timeout_seconds: Option<i64>,
    #[schemars(description = "Optional limit for a single run, in seconds.")]
    pub run_timeout_seconds: Option<i64>,
    #[schemars(description = "Optional limit for a single workflow task, in seconds.")]
    pub task_timeout_seconds: Option<i64>,
    #[schemars(description = "Optional retry policy for the workflow.")]
    pub retry_policy: Option<RetryPolicy>,
}

impl StartWorkflowArguments {
    pub fn execution_timeout(&self) -> Result<Option<Duration>, ToolError> {
        seconds("execution_timeout_seconds", self.execution_timeout_seconds)
    }

    pub fn run_timeout(&self) -> Result<Option<Duration>, ToolError> {
        seconds("run_timeout_seconds", self.run_timeout_seconds)
    }

    pub fn task_timeout(&self) -> Result<Option<Duration>, ToolError> {
        seconds("task_timeout_seconds", self.task_timeout_seconds)
    }
}

impl ToolArguments for StartWorkflowArguments {
    fn validate(&self) -> Result<(), ToolError> {
        not_blank("workflow_name", &self.workflow_name)?;
        not_blank("workflow_id", &self.workflow_id)?;
        not_blank("task_queue", &self.task_queue)?;
        self.execution_timeout()?;
        self.run_timeout()?;
        self.task_timeout()?;
        Ok(())
    }
}

/// Arguments shared by every tool that addresses one execution.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkflowTarget {
    #[schemars(description = "Workflow identifier.")]
    pub workflow_id: String,
    #[schemars(description = "Optional run identifier. Defaults to the latest run.")]
    pub run_id: Option<String>,
}

impl WorkflowTarget {
    pub fn execution(&self) -> WorkflowExecutionRef {
        WorkflowExecutionRef::new(self.workflow_id.clone(), self.run_id.clone())
    }
}

impl ToolArguments for WorkflowTarget {
    fn validate(&self) -> Result<(), ToolError> {
        not_blank("workflow_id", &self.workflow_id)
    }
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkflowResultArguments {
    #[schemars(description = "Workflow identifier.")]
    pub workflow_id: String,
    #[schemars(description = "Optional run identifier. Defaults to the latest run.")]
    pub run_id: Option<String>,
    #[schemars(description = "How long to wait for the workflow to close, in seconds. Defaults to the server setting.")]
    pub timeout_seconds: Option<i64>,
}

impl WorkflowResultArguments {
    pub fn execution(&self) -> WorkflowExecutionRef {
        WorkflowExecutionRef::new(self.workflow_id.clone(), self.run_id.clone())
    }

    pub fn timeout(&self) -> Result<Option<Duration>, ToolError> {
        seconds("timeout_seconds", self.timeout_seconds)
    }
}

impl ToolArguments for WorkflowResultArguments {
    fn validate(&self) -> Result<(), ToolError> {
        not_blank("workflow_id", &self.workflow_id)?;
        self.timeout()?;
        Ok(())
    }
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkflowHistoryArguments {
    #[schemars(description = "Workflow identifier.")]
    pub workflow_id: String,
    #[schemars(description = "Optional run identifier. Defaults to the latest run.")]
    pub run_id: Option<String>,
    #[schemars(description = "Maximum number of events to return. Defaults to 1000.")]
    pub limit: Option<i64>,
}

impl WorkflowHistoryArguments {
    pub fn execution(&self) -> WorkflowExecutionRef {
        WorkflowExecutionRef::new(self.workflow_id.clone(), self.run_id.clone())
    }

    pub fn limit(&self) -> Result<usize, ToolError> {
        bounded("limit", self.limit.unwrap_or(DEFAULT_HISTORY_LIMIT), i64::from(u32::MAX))
    }
}

impl ToolArguments for WorkflowHistoryArguments {
    fn validate(&self) -> Result<(), ToolError> {
        not_blank("workflow_id", &self.workflow_id)?;
        self.limit()?;
        Ok(())
    }
}

/// Offset window over a listing.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PageArguments {
    #[schemars(description = "Maximum number of items to return (1-1000). Defaults to 100.")]
    pub limit: Option<i64>,
    #[schemars(description = "Number of items to skip. Use next_skip from the previous page. Defaults to 0.")]
    pub skip: Option<i64>,
}

impl PageArguments {
    pub fn limit(&self) -> Result<usize, ToolError> {
        bounded("limit", self.limit.unwrap_or(DEFAULT_LIST_LIMIT), MAX_PAGE_LIMIT)
    }

    pub fn skip(&self) -> Result<usize, ToolError> {
        non_negative("skip", self.skip.unwrap_or(0))
    }
}

impl ToolArguments for PageArguments {
    fn validate(&self) -> Result<(), ToolError> {
        self.limit()?;
        self.skip()?;
        Ok(())
    }
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ListWorkflowsArguments {
    #[schemars(
        description = "Visibility query, for example \"WorkflowType='OrderWorkflow' AND ExecutionStatus='Running'\". An empty string lists every workflow."
    )]
    pub query: String,
    #[serde(flatten)]
    pub page: PageArguments,
}

impl ToolArguments for ListWorkflowsArguments {
    fn validate(&self) -> Result<(), ToolError> {
        self.page.validate()
    }
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QueryWorkflowArguments {
    #[schemars(description = "Workflow identifier.")]
    pub workflow_id: String,
    #[schemars(description = "Name of the query handler defined by the workflow.")]
    pub query_name: String,
    #[schemars(description = "Optional run identifier. Defaults to the latest run.")]
    pub run_id: Option<String>,
    #[schemars(description = "Optional query arguments.")]
    pub args: Option<Value>,
}

impl QueryWorkflowArguments {
    pub fn execution(&self) -> WorkflowExecutionRef {
        WorkflowExecutionRef::new(self.workflow_id.clone(), self.run_id.clone())
    }

    pub fn query_args(&self) -> Option<&Value> {
        present(&self.args)
    }
}

impl ToolArguments for QueryWorkflowArguments {
    fn validate(&self) -> Result<(), ToolError> {
        not_blank("workflow_id", &self.workflow_id)?;
        not_blank("query_name", &self.query_name)
    }
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SignalWorkflowArguments {
    #[schemars(description = "Workflow identifier.")]
    pub workflow_id: String,
    #[schemars(description = "Name of the signal handler defined by the workflow.")]
    pub signal_name: String,
    #[schemars(description = "Signal payload.")]
    pub args: Value,
    #[schemars(description = "Optional run identifier. Defaults to the latest run.")]
    pub run_id: Option<String>,
}

impl SignalWorkflowArguments {
    pub fn execution(&self) -> WorkflowExecutionRef {
        WorkflowExecutionRef::new(self.workflow_id.clone(), self.run_id.clone())
    }
}

impl ToolArguments for SignalWorkflowArguments {
    fn validate(&self) -> Result<(), ToolError> {
        not_blank("workflow_id", &self.workflow_id)?;
        not_blank("signal_name", &self.signal_name)
    }
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TerminateWorkflowArguments {
    #[schemars(description = "Workflow identifier.")]
    pub workflow_id: String,
    #[schemars(description = "Reason recorded in the workflow history.")]
    pub reason: String,
    #[schemars(description = "Optional run identifier. Defaults to the latest run.")]
    pub run_id: Option<String>,
}

impl TerminateWorkflowArguments {
    pub fn execution(&self) -> WorkflowExecutionRef {
        WorkflowExecutionRef::new(self.workflow_id.clone(), self.run_id.clone())
    }
}

impl ToolArguments for TerminateWorkflowArguments {
    fn validate(&self) -> Result<(), ToolError> {
        not_blank("workflow_id", &self.workflow_id)
    }
}

pub const DEFAULT_CONTINUE_AS_NEW_SIGNAL: &str = "continue_as_new";

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContinueAsNewArguments {
    #[schemars(description = "Workflow identifier.")]
    pub workflow_id: String,
    #[schemars(description = "Signal the workflow handles by continuing as new. Defaults to \"continue_as_new\".")]
    pub signal_name: Option<String>,
    #[schemars(description = "Optional signal payload, typically the input of the next run.")]
    pub signal_args: Option<Value>,
    #[schemars(description = "Optional run identifier. Defaults to the latest run.")]
    pub run_id: Option<String>,
}

impl ContinueAsNewArguments {
    pub fn execution(&self) -> WorkflowExecutionRef {
        WorkflowExecutionRef::new(self.workflow_id.clone(), self.run_id.clone())
    }

    pub fn signal_name(&self) -> &str {
        self.signal_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_CONTINUE_AS_NEW_SIGNAL)
    }

    pub fn signal_args(&self) -> Option<&Value> {
        present(&self.signal_args)
    }
}

impl ToolArguments for ContinueAsNewArguments {
    fn validate(&self) -> Result<(), ToolError> {
        not_blank("workflow_id", &self.workflow_id)
    }
}

/// Selection shared by the batch tools.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BatchSelection {
    #[schemars(description = "Visibility query selecting the target workflows. Must not be empty.")]
    pub query: String,
    #[schemars(description = "Maximum number of workflows to operate on (1-1000).")]
    pub limit: i64,
}

impl BatchSelection {
    pub fn limit(&self) -> Result<usize, ToolError> {
        bounded("limit", self.limit, MAX_PAGE_LIMIT)
    }
}

impl ToolArguments for BatchSelection {
    fn validate(&self) -> Result<(), ToolError> {
        not_blank("query", &self.query)?;
        self.limit()?;
        Ok(())
    }
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BatchSignalArguments {
    #[serde(flatten)]
    pub selection: BatchSelection,
    #[schemars(description = "Signal sent to every selected workflow.")]
    pub signal_name: String,
    #[schemars(description = "Optional signal payload.")]
    pub args: Option<Value>,
}

impl BatchSignalArguments {
    pub fn signal_args(&self) -> Option<&Value> {
        present(&self.args)
    }
}

impl ToolArguments for BatchSignalArguments {
    fn validate(&self) -> Result<(), ToolError> {
        self.selection.validate()?;
        not_blank("signal_name", &self.signal_name)
    }
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BatchTerminateArguments {
    #[serde(flatten)]
    pub selection: BatchSelection,
    #[schemars(description = "Reason recorded in the history of every terminated workflow.")]
    pub reason: String,
}

impl ToolArguments for BatchTerminateArguments {
    fn validate(&self) -> Result<(), ToolError> {
        self.selection.validate()
    }
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreateScheduleArguments {
    #[schemars(description = "Identifier of the new schedule.")]
    pub schedule_id: String,
    #[schemars(description = "Cron expression, for example \"0 * * * *\".")]
    pub cron: String,
    #[schemars(description = "Workflow type started on every tick.")]
    pub workflow_name: String,
    #[schemars(description = "Task queue of the started workflows.")]
    pub task_queue: String,
    #[schemars(description = "Optional input passed to every started workflow.")]
    pub args: Option<Value>,
    #[schemars(description = "Workflow id prefix for started workflows. Defaults to \"<schedule_id>-workflow\".")]
    pub workflow_id: Option<String>,
}

impl CreateScheduleArguments {
    pub fn workflow_id(&self) -> String {
        match self.workflow_id.as_deref().filter(|id| !id.trim().is_empty()) {
            Some(id) => id.to_string(),
            None => format!("{}-workflow", self.schedule_id),
        }
    }

    pub fn workflow_args(&self) -> Option<Value> {
        present(&self.args).cloned()
    }
}

impl ToolArguments for CreateScheduleArguments {
    fn validate(&self) -> Result<(), ToolError> {
        not_blank("schedule_id", &self.schedule_id)?;
        not_blank("cron", &self.cron)?;
        not_blank("workflow_name", &self.workflow_name)?;
        not_blank("task_queue", &self.task_queue)
    }
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScheduleTarget {
    #[schemars(description = "Schedule identifier.")]
    pub schedule_id: String,
}

impl ToolArguments for ScheduleTarget {
    fn validate(&self) -> Result<(), ToolError> {
        not_blank("schedule_id", &self.schedule_id)
    }
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScheduleNoteArguments {
    #[schemars(description = "Schedule identifier.")]
    pub schedule_id: String,
    #[schemars(description = "Optional note recorded with the state change.")]
    pub note: Option<String>,
}

impl ScheduleNoteArguments {
    pub fn note_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.note.as_deref().filter(|note| !note.trim().is_empty()).unwrap_or(default)
    }
}

impl ToolArguments for ScheduleNoteArguments {
    fn validate(&self) -> Result<(), ToolError> {
        not_blank("schedule_id", &self.schedule_id)
    }
}
