//! Deterministic in-process [`TemporalClient`] for tests.
//!
//! Workflows and schedules are kept in insertion order. Every trait call is
//! counted per operation name (the trait method name), failures can be injected
//! per operation and target, and result waits stay pending until a test closes
//! the workflow.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use serde_json::Value;
use temporal_mcp_types::{
    HistoryEvent, ListPage, NewSchedule, ScheduleSummary, StartWorkflowSpec, WorkflowExecution, WorkflowExecutionRef, WorkflowOutcome,
    WorkflowStatus,
};
use tokio::sync::Notify;

use crate::{client::TemporalClient, error::TemporalError};

/// Failure target matching every workflow or schedule id.
pub const ANY_TARGET: &str = "*";

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSignal {
    pub signal_name: String,
    pub args: Option<Value>,
}

#[derive(Debug, Clone)]
struct StoredWorkflow {
    execution: WorkflowExecution,
    outcome: Option<WorkflowOutcome>,
    signals: Vec<RecordedSignal>,
    query_results: HashMap<String, Value>,
    history: Vec<HistoryEvent>,
}

#[derive(Debug, Clone)]
struct StoredSchedule {
    summary: ScheduleSummary,
    action: StartWorkflowSpec,
    triggered: usize,
}

#[derive(Debug, Default)]
struct MemoryState {
    workflows: Vec<StoredWorkflow>,
    schedules: Vec<StoredSchedule>,
    failures: HashMap<(String, String), TemporalError>,
    calls: HashMap<String, usize>,
    next_run: u64,
}

impl MemoryState {
    fn next_run_id(&mut self) -> String {
        self.next_run += 1;
        format!("run-{}", self.next_run)
    }

    fn find(&mut self, execution: &WorkflowExecutionRef) -> Result<&mut StoredWorkflow, TemporalError> {
        let found = match &execution.run_id {
            Some(run_id) => self
                .workflows
                .iter_mut()
                .find(|stored| stored.execution.workflow_id == execution.workflow_id && &stored.execution.run_id == run_id),
            None => self
                .workflows
                .iter_mut()
                .rev()
                .find(|stored| stored.execution.workflow_id == execution.workflow_id),
        };
        found.ok_or_else(|| TemporalError::not_found(format!("workflow execution '{}' not found", execution.workflow_id)))
    }

    fn find_open(&mut self, execution: &WorkflowExecutionRef) -> Result<&mut StoredWorkflow, TemporalError> {
        let stored = self.find(execution)?;
        if stored.execution.status.is_closed() {
            return Err(TemporalError::not_found("workflow execution already completed"));
        }
        Ok(stored)
    }

    fn schedule(&mut self, schedule_id: &str) -> Result<&mut StoredSchedule, TemporalError> {
        self.schedules
            .iter_mut()
            .find(|stored| stored.summary.schedule_id == schedule_id)
            .ok_or_else(|| TemporalError::not_found(format!("schedule '{schedule_id}' not found")))
    }

    fn insert_workflow(&mut self, spec: &StartWorkflowSpec) -> String {
        let run_id = self.next_run_id();
        let execution = WorkflowExecution {
            workflow_id: spec.workflow_id.clone(),
            run_id: run_id.clone(),
            workflow_type: spec.workflow_type.clone(),
            status: WorkflowStatus::Running,
            task_queue: Some(spec.task_queue.clone()),
            start_time: None,
            execution_time: None,
            close_time: None,
            history_length: Some(1),
        };
        self.workflows.push(StoredWorkflow {
            execution,
            outcome: None,
            signals: Vec::new(),
            query_results: HashMap::new(),
            history: vec![event(1, "WORKFLOW_EXECUTION_STARTED")],
        });
        run_id
    }
}

fn event(event_id: u64, event_type: &str) -> HistoryEvent {
    HistoryEvent {
        event_id,
        event_type: event_type.to_string(),
        event_time: None,
    }
}

fn close(stored: &mut StoredWorkflow, outcome: WorkflowOutcome) {
    let (status, event_type) = match &outcome {
        WorkflowOutcome::Completed { .. } => (WorkflowStatus::Completed, "WORKFLOW_EXECUTION_COMPLETED".to_string()),
        WorkflowOutcome::Closed { status, .. } => (*status, format!("WORKFLOW_EXECUTION_{}", status.as_str())),
    };
    let next_id = stored.history.len() as u64 + 1;
    stored.history.push(event(next_id, &event_type));
    stored.execution.status = status;
    stored.execution.history_length = Some(stored.history.len() as u64);
    stored.outcome = Some(outcome);
}

#[derive(Debug)]
pub struct InMemoryTemporal {
    namespace: String,
    state: Mutex<MemoryState>,
    closed: Notify,
}

impl Default for InMemoryTemporal {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTemporal {
    pub fn new() -> Self {
        Self {
            namespace: "default".to_string(),
            state: Mutex::new(MemoryState::default()),
            closed: Notify::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Counts the call and returns an injected failure, if any.
    fn begin(&self, operation: &str, target: &str) -> Result<MutexGuard<'_, MemoryState>, TemporalError> {
        let mut state = self.state();
        *state.calls.entry(operation.to_string()).or_default() += 1;
        let injected = state
            .failures
            .get(&(operation.to_string(), target.to_string()))
            .or_else(|| state.failures.get(&(operation.to_string(), ANY_TARGET.to_string())))
            .cloned();
        match injected {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }

    /// Adds a running workflow and returns its run id.
    pub fn seed_workflow(&self, workflow_id: &str, workflow_type: &str) -> String {
        self.state().insert_workflow(&StartWorkflowSpec::new(workflow_id, workflow_type, "default"))
    }

    /// Adds a schedule that starts `workflow_type` on `cron`.
    pub fn seed_schedule(&self, schedule_id: &str, workflow_type: &str, cron: &str) {
        let action = StartWorkflowSpec::new(format!("{schedule_id}-workflow"), workflow_type, "default");
        self.state().schedules.push(StoredSchedule {
            summary: ScheduleSummary {
                schedule_id: schedule_id.to_string(),
                paused: false,
                note: None,
                workflow_type: Some(workflow_type.to_string()),
                cron_expressions: vec![cron.to_string()],
            },
            action,
            triggered: 0,
        });
    }

    /// Completes the latest run of `workflow_id`; returns false when absent or closed.
    pub fn complete_workflow(&self, workflow_id: &str, result: Value) -> bool {
        self.finish(workflow_id, |run_id| WorkflowOutcome::Completed { run_id, result })
    }

    /// Closes the latest run with a non-completed status such as `FAILED`.
    pub fn close_workflow(&self, workflow_id: &str, status: WorkflowStatus, reason: &str) -> bool {
        self.finish(workflow_id, |run_id| WorkflowOutcome::Closed {
            run_id,
            status,
            reason: reason.to_string(),
        })
    }

    fn finish(&self, workflow_id: &str, outcome: impl FnOnce(String) -> WorkflowOutcome) -> bool {
        let closed = {
            let mut state = self.state();
            match state.find_open(&WorkflowExecutionRef::latest(workflow_id)) {
                Ok(stored) => {
                    let run_id = stored.execution.run_id.clone();
                    close(stored, outcome(run_id));
                    true
                }
                Err(_) => false,
            }
        };
        if closed {
            self.closed.notify_waiters();
        }
        closed
    }

    /// Makes every future `operation` call on `target` fail with `error`.
    ///
    /// `target` is a workflow or schedule id, `""` for listings, or [`ANY_TARGET`].
    pub fn inject_failure(&self, operation: &str, target: &str, error: TemporalError) {
        self.state().failures.insert((operation.to_string(), target.to_string()), error);
    }

    pub fn set_query_result(&self, workflow_id: &str, query_name: &str, result: Value) {
        if let Ok(stored) = self.state().find(&WorkflowExecutionRef::latest(workflow_id)) {
            stored.query_results.insert(query_name.to_string(), result);
        }
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.state().calls.get(operation).copied().unwrap_or_default()
    }

    pub fn total_calls(&self) -> usize {
        self.state().calls.values().sum()
    }

    pub fn signals(&self, workflow_id: &str) -> Vec<RecordedSignal> {
        self.state()
            .find(&WorkflowExecutionRef::latest(workflow_id))
            .map(|stored| stored.signals.clone())
            .unwrap_or_default()
    }

    pub fn workflow(&self, workflow_id: &str) -> Option<WorkflowExecution> {
        self.state()
            .find(&WorkflowExecutionRef::latest(workflow_id))
            .ok()
            .map(|stored| stored.execution.clone())
    }

    pub fn schedule(&self, schedule_id: &str) -> Option<ScheduleSummary> {
        self.state().schedule(schedule_id).ok().map(|stored| stored.summary.clone())
    }

    pub fn trigger_count(&self, schedule_id: &str) -> usize {
        self.state().schedule(schedule_id).map(|stored| stored.triggered).unwrap_or_default()
    }

    fn outcome(&self, execution: &WorkflowExecutionRef) -> Result<Option<WorkflowOutcome>, TemporalError> {
        Ok(self.state().find(execution)?.outcome.clone())
    }
}

/// Supports the subset of visibility queries tests use:
/// `Key = 'value'` clauses joined by `AND` over `WorkflowId`, `WorkflowType`,
/// `TaskQueue` and `ExecutionStatus`.
fn matches_query(execution: &WorkflowExecution, query: &str) -> Result<bool, TemporalError> {
    if query.trim().is_empty() {
        return Ok(true);
    }
    for clause in query.split(" AND ") {
        let (key, value) = clause
            .split_once('=')
            .ok_or_else(|| TemporalError::invalid_argument(format!("unsupported query clause '{}'", clause.trim())))?;
        let value = value.trim().trim_matches(|c| c == '\'' || c == '"');
        let matched = match key.trim() {
            "WorkflowId" => execution.workflow_id == value,
            "WorkflowType" => execution.workflow_type == value,
            "TaskQueue" => execution.task_queue.as_deref() == Some(value),
            "ExecutionStatus" => value.parse::<WorkflowStatus>().is_ok_and(|status| status == execution.status),
            other => return Err(TemporalError::invalid_argument(format!("unknown search attribute '{other}'"))),
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn offset_page<T: Clone>(items: &[T], page_size: usize, page_token: Option<&str>) -> Result<ListPage<T>, TemporalError> {
    let start = match page_token {
        Some(token) => token
            .parse::<usize>()
            .map_err(|_| TemporalError::invalid_argument(format!("invalid page token '{token}'")))?,
        None => 0,
    };
    let page_size = page_size.max(1);
    let end = (start + page_size).min(items.len());
    let page = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();
    let next = (end < items.len()).then(|| end.to_string());
    Ok(ListPage::new(page, next))
}

#[async_trait]
impl TemporalClient for InMemoryTemporal {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn start_workflow(&self, spec: &StartWorkflowSpec) -> Result<String, TemporalError> {
        let mut state = self.begin("start_workflow", &spec.workflow_id)?;
        let running = state
            .workflows
            .iter()
            .any(|stored| stored.execution.workflow_id == spec.workflow_id && !stored.execution.status.is_closed());
        if running {
            return Err(TemporalError::already_exists(format!(
                "workflow execution '{}' is already running",
                spec.workflow_id
            )));
        }
        Ok(state.insert_workflow(spec))
    }

    async fn describe_workflow(&self, execution: &WorkflowExecutionRef) -> Result<WorkflowExecution, TemporalError> {
        let mut state = self.begin("describe_workflow", &execution.workflow_id)?;
        Ok(state.find(execution)?.execution.clone())
    }

    async fn list_workflows(
        &self,
        query: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<ListPage<WorkflowExecution>, TemporalError> {
        let state = self.begin("list_workflows", "")?;
        let mut matching = Vec::new();
        for stored in &state.workflows {
            if matches_query(&stored.execution, query)? {
                matching.push(stored.execution.clone());
            }
        }
        offset_page(&matching, page_size, page_token)
    }

    async fn workflow_history(
        &self,
        execution: &WorkflowExecutionRef,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<ListPage<HistoryEvent>, TemporalError> {
        let mut state = self.begin("workflow_history", &execution.workflow_id)?;
        let history = state.find(execution)?.history.clone();
        offset_page(&history, page_size, page_token)
    }

    async fn await_workflow_outcome(&self, execution: &WorkflowExecutionRef) -> Result<WorkflowOutcome, TemporalError> {
        drop(self.begin("await_workflow_outcome", &execution.workflow_id)?);
        loop {
            let notified = self.closed.notified();
            if let Some(outcome) = self.outcome(execution)? {
                return Ok(outcome);
            }
            notified.await;
        }
    }

    async fn query_workflow(&self, execution: &WorkflowExecutionRef, query_name: &str, _args: Option<&Value>) -> Result<Value, TemporalError> {
        let mut state = self.begin("query_workflow", &execution.workflow_id)?;
        let stored = state.find(execution)?;
        stored
            .query_results
            .get(query_name)
            .cloned()
            .ok_or_else(|| TemporalError::invalid_argument(format!("unknown queryType {query_name}")))
    }

    async fn signal_workflow(&self, execution: &WorkflowExecutionRef, signal_name: &str, args: Option<&Value>) -> Result<(), TemporalError> {
        let mut state = self.begin("signal_workflow", &execution.workflow_id)?;
        state.find_open(execution)?.signals.push(RecordedSignal {
            signal_name: signal_name.to_string(),
            args: args.cloned(),
        });
        Ok(())
    }

    async fn cancel_workflow(&self, execution: &WorkflowExecutionRef) -> Result<(), TemporalError> {
        {
            let mut state = self.begin("cancel_workflow", &execution.workflow_id)?;
            let stored = state.find_open(execution)?;
            let run_id = stored.execution.run_id.clone();
            close(
                stored,
                WorkflowOutcome::Closed {
                    run_id,
                    status: WorkflowStatus::Canceled,
                    reason: "workflow canceled".to_string(),
                },
            );
        }
        self.closed.notify_waiters();
        Ok(())
    }

    async fn terminate_workflow(&self, execution: &WorkflowExecutionRef, reason: &str) -> Result<(), TemporalError> {
        {
            let mut state = self.begin("terminate_workflow", &execution.workflow_id)?;
            let stored = state.find_open(execution)?;
            let run_id = stored.execution.run_id.clone();
            close(
                stored,
                WorkflowOutcome::Closed {
                    run_id,
                    status: WorkflowStatus::Terminated,
                    reason: reason.to_string(),
                },
            );
        }
        self.closed.notify_waiters();
        Ok(())
    }

    async fn create_schedule(&self, schedule: &NewSchedule) -> Result<(), TemporalError> {
        let mut state = self.begin("create_schedule", &schedule.schedule_id)?;
        if state.schedule(&schedule.schedule_id).is_ok() {
            return Err(TemporalError::already_exists(format!("schedule '{}' already exists", schedule.schedule_id)));
        }
        state.schedules.push(StoredSchedule {
            summary: ScheduleSummary {
                schedule_id: schedule.schedule_id.clone(),
                paused: false,
                note: None,
                workflow_type: Some(schedule.action.workflow_type.clone()),
                cron_expressions: schedule.cron_expressions.clone(),
            },
            action: schedule.action.clone(),
            triggered: 0,
        });
        Ok(())
    }

    async fn list_schedules(&self, page_size: usize, page_token: Option<&str>) -> Result<ListPage<ScheduleSummary>, TemporalError> {
        let state = self.begin("list_schedules", "")?;
        let summaries: Vec<ScheduleSummary> = state.schedules.iter().map(|stored| stored.summary.clone()).collect();
        offset_page(&summaries, page_size, page_token)
    }

    async fn pause_schedule(&self, schedule_id: &str, note: &str) -> Result<(), TemporalError> {
        let mut state = self.begin("pause_schedule", schedule_id)?;
        let stored = state.schedule(schedule_id)?;
        stored.summary.paused = true;
        stored.summary.note = Some(note.to_string());
        Ok(())
    }

    async fn unpause_schedule(&self, schedule_id: &str, note: &str) -> Result<(), TemporalError> {
        let mut state = self.begin("unpause_schedule", schedule_id)?;
        let stored = state.schedule(schedule_id)?;
        stored.summary.paused = false;
        stored.summary.note = Some(note.to_string());
        Ok(())
    }

    async fn delete_schedule(&self, schedule_id: &str) -> Result<(), TemporalError> {
        let mut state = self.begin("delete_schedule", schedule_id)?;
        state.schedule(schedule_id)?;
        state.schedules.retain(|stored| stored.summary.schedule_id != schedule_id);
        Ok(())
    }

    async fn trigger_schedule(&self, schedule_id: &str) -> Result<(), TemporalError> {
        let mut state = self.begin("trigger_schedule", schedule_id)?;
        let stored = state.schedule(schedule_id)?;
        stored.triggered += 1;
        let mut action = stored.action.clone();
        action.workflow_id = format!("{}-{}", action.workflow_id, stored.triggered);
        state.insert_workflow(&action);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn result_wait_resolves_after_completion() {
        let temporal = std::sync::Arc::new(InMemoryTemporal::new());
        temporal.seed_workflow("wf-1", "Greeting");

        let waiter = {
            let temporal = temporal.clone();
            tokio::spawn(async move { temporal.await_workflow_outcome(&WorkflowExecutionRef::latest("wf-1")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        assert!(temporal.complete_workflow("wf-1", json!({"x": 1})));
        let outcome = waiter.await.unwrap().unwrap();
        assert!(matches!(outcome, WorkflowOutcome::Completed { result, .. } if result == json!({"x": 1})));
    }

    #[tokio::test]
    async fn query_filters_by_type_and_status() {
        let temporal = InMemoryTemporal::new();
        temporal.seed_workflow("a", "Order");
        temporal.seed_workflow("b", "Invoice");
        temporal.seed_workflow("c", "Order");
        temporal.close_workflow("c", WorkflowStatus::Failed, "boom");

        let page = temporal
            .list_workflows("WorkflowType = 'Order' AND ExecutionStatus = 'Running'", 10, None)
            .await
            .unwrap();
        let ids: Vec<_> = page.items.iter().map(|execution| execution.workflow_id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);

        let error = temporal.list_workflows("CustomField = 1", 10, None).await.unwrap_err();
        assert!(matches!(error, TemporalError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn injected_failures_are_counted_and_targeted() {
        let temporal = InMemoryTemporal::new();
        temporal.seed_workflow("a", "Order");
        temporal.seed_workflow("b", "Order");
        temporal.inject_failure("signal_workflow", "b", TemporalError::connection("reset"));

        temporal
            .signal_workflow(&WorkflowExecutionRef::latest("a"), "go", None)
            .await
            .unwrap();
        let error = temporal
            .signal_workflow(&WorkflowExecutionRef::latest("b"), "go", None)
            .await
            .unwrap_err();
        assert!(error.is_retryable());
        assert_eq!(temporal.call_count("signal_workflow"), 2);
        assert_eq!(temporal.signals("a").len(), 1);
    }

    #[tokio::test]
    async fn pages_follow_offset_tokens() {
        let temporal = InMemoryTemporal::new();
        for id in ["a", "b", "c"] {
            temporal.seed_workflow(id, "Order");
        }
        let first = temporal.list_workflows("", 2, None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        let second = temporal
            .list_workflows("", 2, first.next_page_token.as_deref())
            .await
            .unwrap();
        assert_eq!(second.items.len(), 1);
        assert!(second.is_last());
    }
}
