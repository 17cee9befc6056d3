use std::{fmt, str::FromStr, time::Duration};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Prefix the Temporal API puts on every execution status enum value.
const STATUS_PREFIX: &str = "WORKFLOW_EXECUTION_STATUS_";

/// Lifecycle state of a workflow execution as reported by the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    #[default]
    Unspecified,
    Running,
    Completed,
    Failed,
    Canceled,
    Terminated,
    ContinuedAsNew,
    TimedOut,
}

impl WorkflowStatus {
    pub const ALL: [WorkflowStatus; 8] = [
        WorkflowStatus::Unspecified,
        WorkflowStatus::Running,
        WorkflowStatus::Completed,
        WorkflowStatus::Failed,
        WorkflowStatus::Canceled,
        WorkflowStatus::Terminated,
        WorkflowStatus::ContinuedAsNew,
        WorkflowStatus::TimedOut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Unspecified => "UNSPECIFIED",
            WorkflowStatus::Running => "RUNNING",
            WorkflowStatus::Completed => "COMPLETED",
            WorkflowStatus::Failed => "FAILED",
            WorkflowStatus::Canceled => "CANCELED",
            WorkflowStatus::Terminated => "TERMINATED",
            WorkflowStatus::ContinuedAsNew => "CONTINUED_AS_NEW",
            WorkflowStatus::TimedOut => "TIMED_OUT",
        }
    }

    /// Returns true once the execution can no longer make progress.
    pub fn is_closed(&self) -> bool {
        !matches!(self, WorkflowStatus::Running | WorkflowStatus::Unspecified)
    }

    /// Maps the wire spelling (`WORKFLOW_EXECUTION_STATUS_RUNNING`) onto a status.
    ///
    /// Unknown values collapse to [`WorkflowStatus::Unspecified`] so newer
    /// clusters never break describe/list responses.
    pub fn from_platform(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown workflow status '{value}'")]
pub struct UnknownWorkflowStatus {
    pub value: String,
}

impl FromStr for WorkflowStatus {
    type Err = UnknownWorkflowStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let normalized = trimmed.strip_prefix(STATUS_PREFIX).unwrap_or(trimmed).replace(['-', ' '], "_");
        WorkflowStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(&normalized) || camel_matches(status, &normalized))
            .ok_or_else(|| UnknownWorkflowStatus { value: value.to_string() })
    }
}

/// Visibility queries spell statuses in CamelCase (`ContinuedAsNew`).
fn camel_matches(status: &WorkflowStatus, candidate: &str) -> bool {
    let camel: String = status
        .as_str()
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_string() + &chars.as_str().to_ascii_lowercase(),
                None => String::new(),
            }
        })
        .collect();
    camel.eq_ignore_ascii_case(candidate)
}

/// Addresses a single workflow; without a run id the latest run is targeted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowExecutionRef {
    pub workflow_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl WorkflowExecutionRef {
    pub fn new(workflow_id: impl Into<String>, run_id: Option<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            run_id: run_id.filter(|run| !run.is_empty()),
        }
    }

    pub fn latest(workflow_id: impl Into<String>) -> Self {
        Self::new(workflow_id, None)
    }
}

/// Summary of one workflow execution, shared by describe and list replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowExecution {
    pub workflow_id: String,
    pub run_id: String,
    pub workflow_type: String,
    pub status: WorkflowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_queue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_length: Option<u64>,
}

/// One entry of a workflow's event history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub event_id: u64,
    /// Event type without the `EVENT_TYPE_` prefix, e.g. `WORKFLOW_EXECUTION_STARTED`.
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<DateTime<Utc>>,
}

/// Terminal result of waiting on a workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowOutcome {
    Completed { run_id: String, result: Value },
    /// The execution closed without completing (failed, canceled, terminated, timed out).
    Closed { run_id: String, status: WorkflowStatus, reason: String },
}

/// Retry behaviour attached to a started workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RetryPolicy {
    #[schemars(description = "Delay before the first retry, in seconds")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_interval_seconds: Option<f64>,
    #[schemars(description = "Multiplier applied to the interval after each retry")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_coefficient: Option<f64>,
    #[schemars(description = "Upper bound for the retry interval, in seconds")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_interval_seconds: Option<f64>,
    #[schemars(description = "Maximum number of attempts; 0 means unlimited")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_attempts: Option<u32>,
    #[schemars(description = "Application error types that must not be retried")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_retryable_error_types: Vec<String>,
}

/// Everything the cluster needs to start one workflow execution.
#[derive(Debug, Clone, PartialEq)]
pub struct StartWorkflowSpec {
    pub workflow_id: String,
    pub workflow_type: String,
    pub task_queue: String,
    /// Single payload handed to the workflow function; `None` starts it without input.
    pub input: Option<Value>,
    pub execution_timeout: Option<Duration>,
    pub run_timeout: Option<Duration>,
    pub task_timeout: Option<Duration>,
    pub retry_policy: Option<RetryPolicy>,
}

impl StartWorkflowSpec {
    pub fn new(workflow_id: impl Into<String>, workflow_type: impl Into<String>, task_queue: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            workflow_type: workflow_type.into(),
            task_queue: task_queue.into(),
            input: None,
            execution_timeout: None,
            run_timeout: None,
            task_timeout: None,
            retry_policy: None,
        }
    }

    pub fn with_input(mut self, input: Option<Value>) -> Self {
        self.input = input.filter(|value| !value.is_null());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_platform_and_visibility_spellings() {
        assert_eq!(WorkflowStatus::from_platform("WORKFLOW_EXECUTION_STATUS_RUNNING"), WorkflowStatus::Running);
        assert_eq!("ContinuedAsNew".parse::<WorkflowStatus>().unwrap(), WorkflowStatus::ContinuedAsNew);
        assert_eq!("timed_out".parse::<WorkflowStatus>().unwrap(), WorkflowStatus::TimedOut);
        assert_eq!(WorkflowStatus::from_platform("WORKFLOW_EXECUTION_STATUS_PAUSED"), WorkflowStatus::Unspecified);
    }

    #[test]
    fn status_serializes_in_screaming_case() {
        let value = serde_json::to_value(WorkflowStatus::ContinuedAsNew).unwrap();
        assert_eq!(value, serde_json::json!("CONTINUED_AS_NEW"));
        assert!(WorkflowStatus::Failed.is_closed());
        assert!(!WorkflowStatus::Running.is_closed());
    }

    #[test]
    fn empty_run_id_targets_latest_run() {
        let execution = WorkflowExecutionRef::new("order-1", Some(String::new()));
        assert_eq!(execution.run_id, None);
    }

    #[test]
    fn null_input_is_dropped() {
        let spec = StartWorkflowSpec::new("id", "Type", "queue").with_input(Some(Value::Null));
        assert!(spec.input.is_none());
    }
}
