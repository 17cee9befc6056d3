//! JSON shapes of the Temporal frontend HTTP API.
//!
//! The API speaks proto3 JSON: camelCase field names, 64-bit integers as
//! strings, durations as `"<seconds>s"`, enums as their full constant names,
//! and payload lists as plain JSON arrays.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use temporal_mcp_types::{HistoryEvent, RetryPolicy, ScheduleSummary, StartWorkflowSpec, WorkflowExecution, WorkflowStatus};

const EVENT_TYPE_PREFIX: &str = "EVENT_TYPE_";

pub(crate) const CLOSE_EVENT_FILTER: &str = "HISTORY_EVENT_FILTER_TYPE_CLOSE_EVENT";

#[derive(Debug, Serialize)]
pub(crate) struct Named<'a> {
    pub name: &'a str,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct NameOut {
    #[serde(default)]
    pub name: String,
}

/// Wraps an optional single argument into the payload list the API expects.
pub(crate) fn payloads(value: Option<&Value>) -> Option<Vec<&Value>> {
    value.filter(|value| !value.is_null()).map(|value| vec![value])
}

/// Collapses a decoded payload list back into one value.
pub(crate) fn single_payload(mut payloads: Vec<Value>) -> Value {
    match payloads.len() {
        0 => Value::Null,
        1 => payloads.remove(0),
        _ => Value::Array(payloads),
    }
}

pub(crate) fn proto_duration(duration: Duration) -> String {
    format!("{}s", duration.as_secs_f64())
}

fn seconds(value: Option<f64>) -> Option<String> {
    value.map(|secs| format!("{secs}s"))
}

fn int64_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }
    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(number)) => Ok(Some(number)),
        Some(Raw::Text(text)) => text.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExecutionRefIn<'a> {
    pub workflow_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RetryPolicyIn {
    #[serde(skip_serializing_if = "Option::is_none")]
    initial_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    backoff_coefficient: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    maximum_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    maximum_attempts: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    non_retryable_error_types: Vec<String>,
}

impl From<&RetryPolicy> for RetryPolicyIn {
    fn from(policy: &RetryPolicy) -> Self {
        Self {
            initial_interval: seconds(policy.initial_interval_seconds),
            backoff_coefficient: policy.backoff_coefficient,
            maximum_interval: seconds(policy.maximum_interval_seconds),
            maximum_attempts: policy.maximum_attempts,
            non_retryable_error_types: policy.non_retryable_error_types.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartWorkflowRequest<'a> {
    pub workflow_id: &'a str,
    pub workflow_type: Named<'a>,
    pub task_queue: Named<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Vec<&'a Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_execution_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_run_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_task_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicyIn>,
    pub identity: &'a str,
    pub request_id: String,
}

impl<'a> StartWorkflowRequest<'a> {
    pub fn new(spec: &'a StartWorkflowSpec, identity: &'a str, request_id: String) -> Self {
        Self {
            workflow_id: &spec.workflow_id,
            workflow_type: Named { name: &spec.workflow_type },
            task_queue: Named { name: &spec.task_queue },
            input: payloads(spec.input.as_ref()),
            workflow_execution_timeout: spec.execution_timeout.map(proto_duration),
            workflow_run_timeout: spec.run_timeout.map(proto_duration),
            workflow_task_timeout: spec.task_timeout.map(proto_duration),
            retry_policy: spec.retry_policy.as_ref().map(RetryPolicyIn::from),
            identity,
            request_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartWorkflowResponse {
    #[serde(default)]
    pub run_id: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExecutionOut {
    #[serde(default)]
    pub workflow_id: String,
    #[serde(default)]
    pub run_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExecutionInfoOut {
    #[serde(default)]
    pub execution: ExecutionOut,
    #[serde(default, rename = "type")]
    pub workflow_type: Option<NameOut>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub close_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub execution_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "int64_opt")]
    pub history_length: Option<u64>,
    #[serde(default)]
    pub task_queue: Option<String>,
}

impl From<ExecutionInfoOut> for WorkflowExecution {
    fn from(info: ExecutionInfoOut) -> Self {
        WorkflowExecution {
            workflow_id: info.execution.workflow_id,
            run_id: info.execution.run_id,
            workflow_type: info.workflow_type.map(|named| named.name).unwrap_or_default(),
            status: info
                .status
                .as_deref()
                .map(WorkflowStatus::from_platform)
                .unwrap_or_default(),
            task_queue: info.task_queue.filter(|queue| !queue.is_empty()),
            start_time: info.start_time,
            execution_time: info.execution_time,
            close_time: info.close_time,
            history_length: info.history_length,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DescribeWorkflowResponse {
    pub workflow_execution_info: ExecutionInfoOut,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListWorkflowsResponse {
    #[serde(default)]
    pub executions: Vec<ExecutionInfoOut>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct HistoryOut {
    #[serde(default)]
    pub events: Vec<HistoryEventOut>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GetHistoryResponse {
    #[serde(default)]
    pub history: HistoryOut,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FailureOut {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CloseAttributes {
    #[serde(default)]
    pub result: Vec<Value>,
    #[serde(default)]
    pub failure: Option<FailureOut>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub new_execution_run_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryEventOut {
    #[serde(default, deserialize_with = "int64_opt")]
    pub event_id: Option<u64>,
    #[serde(default)]
    pub event_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub workflow_execution_completed_event_attributes: Option<CloseAttributes>,
    #[serde(default)]
    pub workflow_execution_failed_event_attributes: Option<CloseAttributes>,
    #[serde(default)]
    pub workflow_execution_timed_out_event_attributes: Option<CloseAttributes>,
    #[serde(default)]
    pub workflow_execution_canceled_event_attributes: Option<CloseAttributes>,
    #[serde(default)]
    pub workflow_execution_terminated_event_attributes: Option<CloseAttributes>,
    #[serde(default)]
    pub workflow_execution_continued_as_new_event_attributes: Option<CloseAttributes>,
}

/// How a run ended, read from its close event.
#[derive(Debug, PartialEq)]
pub(crate) enum CloseEvent {
    Completed(Value),
    Closed {
        status: WorkflowStatus,
        reason: String,
        /// Run that continues this one (continue-as-new or retry).
        next_run_id: Option<String>,
    },
}

impl HistoryEventOut {
    pub fn event_type_name(&self) -> &str {
        self.event_type.strip_prefix(EVENT_TYPE_PREFIX).unwrap_or(&self.event_type)
    }

    pub fn close_event(self) -> Option<CloseEvent> {
        let next = |attributes: &CloseAttributes| attributes.new_execution_run_id.clone().filter(|run| !run.is_empty());
        if let Some(attributes) = self.workflow_execution_completed_event_attributes {
            return Some(CloseEvent::Completed(single_payload(attributes.result)));
        }
        if let Some(attributes) = self.workflow_execution_failed_event_attributes {
            let reason = attributes
                .failure
                .as_ref()
                .map(|failure| failure.message.clone())
                .unwrap_or_else(|| "workflow failed".to_string());
            return Some(CloseEvent::Closed {
                status: WorkflowStatus::Failed,
                next_run_id: next(&attributes),
                reason,
            });
        }
        if let Some(attributes) = self.workflow_execution_timed_out_event_attributes {
            return Some(CloseEvent::Closed {
                status: WorkflowStatus::TimedOut,
                next_run_id: next(&attributes),
                reason: "workflow timed out".to_string(),
            });
        }
        if self.workflow_execution_canceled_event_attributes.is_some() {
            return Some(CloseEvent::Closed {
                status: WorkflowStatus::Canceled,
                reason: "workflow canceled".to_string(),
                next_run_id: None,
            });
        }
        if let Some(attributes) = self.workflow_execution_terminated_event_attributes {
            return Some(CloseEvent::Closed {
                status: WorkflowStatus::Terminated,
                reason: attributes.reason.unwrap_or_else(|| "workflow terminated".to_string()),
                next_run_id: None,
            });
        }
        if let Some(attributes) = self.workflow_execution_continued_as_new_event_attributes {
            return Some(CloseEvent::Closed {
                status: WorkflowStatus::ContinuedAsNew,
                next_run_id: next(&attributes),
                reason: "workflow continued as new".to_string(),
            });
        }
        None
    }
}

impl From<HistoryEventOut> for HistoryEvent {
    fn from(event: HistoryEventOut) -> Self {
        HistoryEvent {
            event_id: event.event_id.unwrap_or_default(),
            event_type: event.event_type_name().to_string(),
            event_time: event.event_time,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryIn<'a> {
    pub query_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_args: Option<Vec<&'a Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryWorkflowRequest<'a> {
    pub execution: ExecutionRefIn<'a>,
    pub query: QueryIn<'a>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryRejectedOut {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryWorkflowResponse {
    #[serde(default)]
    pub query_result: Vec<Value>,
    #[serde(default)]
    pub query_rejected: Option<QueryRejectedOut>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignalWorkflowRequest<'a> {
    pub workflow_execution: ExecutionRefIn<'a>,
    pub signal_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Vec<&'a Value>>,
    pub identity: &'a str,
    pub request_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CancelWorkflowRequest<'a> {
    pub workflow_execution: ExecutionRefIn<'a>,
    pub identity: &'a str,
    pub request_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TerminateWorkflowRequest<'a> {
    pub workflow_execution: ExecutionRefIn<'a>,
    pub reason: &'a str,
    pub identity: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScheduleSpecIn<'a> {
    pub cron_string: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewWorkflowIn<'a> {
    pub workflow_id: &'a str,
    pub workflow_type: Named<'a>,
    pub task_queue: Named<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Vec<&'a Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScheduleActionIn<'a> {
    pub start_workflow: NewWorkflowIn<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScheduleStateIn {
    pub paused: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScheduleIn<'a> {
    pub spec: ScheduleSpecIn<'a>,
    pub action: ScheduleActionIn<'a>,
    pub state: ScheduleStateIn,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateScheduleRequest<'a> {
    pub schedule: ScheduleIn<'a>,
    pub identity: &'a str,
    pub request_id: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScheduleSpecOut {
    #[serde(default)]
    pub cron_string: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScheduleInfoOut {
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub workflow_type: Option<NameOut>,
    #[serde(default)]
    pub spec: Option<ScheduleSpecOut>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScheduleEntryOut {
    pub schedule_id: String,
    #[serde(default)]
    pub info: ScheduleInfoOut,
}

impl From<ScheduleEntryOut> for ScheduleSummary {
    fn from(entry: ScheduleEntryOut) -> Self {
        ScheduleSummary {
            schedule_id: entry.schedule_id,
            paused: entry.info.paused,
            note: entry.info.notes.filter(|note| !note.is_empty()),
            workflow_type: entry.info.workflow_type.map(|named| named.name).filter(|name| !name.is_empty()),
            cron_expressions: entry.info.spec.map(|spec| spec.cron_string).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListSchedulesResponse {
    #[serde(default)]
    pub schedules: Vec<ScheduleEntryOut>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TriggerImmediatelyIn {}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SchedulePatchIn<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unpause: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_immediately: Option<TriggerImmediatelyIn>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PatchScheduleRequest<'a> {
    pub patch: SchedulePatchIn<'a>,
    pub identity: &'a str,
    pub request_id: String,
}

/// Response bodies the client does not inspect.
#[derive(Debug, Deserialize)]
pub(crate) struct Ignored {}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn start_request_uses_proto_json_names() {
        let spec = StartWorkflowSpec {
            execution_timeout: Some(Duration::from_secs(90)),
            retry_policy: Some(RetryPolicy {
                maximum_attempts: Some(3),
                initial_interval_seconds: Some(1.5),
                ..Default::default()
            }),
            ..StartWorkflowSpec::new("order-1", "OrderWorkflow", "orders").with_input(Some(json!({"sku": "A1"})))
        };
        let body = serde_json::to_value(StartWorkflowRequest::new(&spec, "tester", "req-1".into())).unwrap();
        assert_eq!(
            body,
            json!({
                "workflowId": "order-1",
                "workflowType": {"name": "OrderWorkflow"},
                "taskQueue": {"name": "orders"},
                "input": [{"sku": "A1"}],
                "workflowExecutionTimeout": "90s",
                "retryPolicy": {"initialInterval": "1.5s", "maximumAttempts": 3},
                "identity": "tester",
                "requestId": "req-1"
            })
        );
    }

    #[test]
    fn execution_info_accepts_string_integers() {
        let info: ExecutionInfoOut = serde_json::from_value(json!({
            "execution": {"workflowId": "wf", "runId": "run"},
            "type": {"name": "Greeting"},
            "status": "WORKFLOW_EXECUTION_STATUS_COMPLETED",
            "historyLength": "11",
            "startTime": "2024-05-01T10:00:00.123Z",
            "taskQueue": "greetings"
        }))
        .unwrap();
        let execution = WorkflowExecution::from(info);
        assert_eq!(execution.status, WorkflowStatus::Completed);
        assert_eq!(execution.history_length, Some(11));
        assert_eq!(execution.task_queue.as_deref(), Some("greetings"));
    }

    #[test]
    fn close_event_reads_result_and_chains() {
        let completed: HistoryEventOut = serde_json::from_value(json!({
            "eventId": "12",
            "eventType": "EVENT_TYPE_WORKFLOW_EXECUTION_COMPLETED",
            "workflowExecutionCompletedEventAttributes": {"result": [{"x": 1}]}
        }))
        .unwrap();
        assert_eq!(completed.event_type_name(), "WORKFLOW_EXECUTION_COMPLETED");
        assert_eq!(completed.close_event(), Some(CloseEvent::Completed(json!({"x": 1}))));

        let continued: HistoryEventOut = serde_json::from_value(json!({
            "eventId": "5",
            "eventType": "EVENT_TYPE_WORKFLOW_EXECUTION_CONTINUED_AS_NEW",
            "workflowExecutionContinuedAsNewEventAttributes": {"newExecutionRunId": "run-2"}
        }))
        .unwrap();
        assert!(matches!(
            continued.close_event(),
            Some(CloseEvent::Closed { status: WorkflowStatus::ContinuedAsNew, next_run_id: Some(run), .. }) if run == "run-2"
        ));
    }

    #[test]
    fn schedule_patch_serializes_single_action() {
        let body = serde_json::to_value(SchedulePatchIn {
            trigger_immediately: Some(TriggerImmediatelyIn {}),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, json!({"triggerImmediately": {}}));
    }
}
