use std::{sync::Arc, time::Duration};

use serde_json::{Value, json};
use temporal_mcp::{Dispatcher, ErrorKind, ToolCallRequest, ToolContext, ToolRegistry, ToolReply};
use temporal_mcp_api::{InMemoryTemporal, ServerSettings, TemporalError};
use temporal_mcp_types::WorkflowStatus;
use tokio_util::sync::CancellationToken;

fn dispatcher(temporal: &Arc<InMemoryTemporal>) -> Dispatcher {
    let registry = Arc::new(ToolRegistry::temporal().expect("catalog registers"));
    Dispatcher::new(registry, ToolContext::new(temporal.clone(), ServerSettings::default()))
}

async fn call(dispatcher: &Dispatcher, tool: &str, arguments: Value) -> ToolReply {
    let request = ToolCallRequest::from_value(tool, arguments).expect("object arguments");
    dispatcher.dispatch(request, &CancellationToken::new()).await
}

fn success(reply: ToolReply) -> Value {
    match reply {
        ToolReply::Success { success } => success,
        ToolReply::Failure(failure) => panic!("expected success, got {failure:?}"),
    }
}

fn seed_orders(temporal: &InMemoryTemporal, count: usize) {
    for index in 1..=count {
        temporal.seed_workflow(&format!("order-{index}"), "Order");
    }
}

#[tokio::test]
async fn start_describe_complete_result() {
    let temporal = Arc::new(InMemoryTemporal::new());
    let dispatcher = dispatcher(&temporal);

    let started = success(
        call(
            &dispatcher,
            "start_workflow",
            json!({
                "workflow_name": "Greeting",
                "workflow_id": "greet-1",
                "task_queue": "greetings",
                "args": {"name": "Ada"},
            }),
        )
        .await,
    );
    assert_eq!(started["status"], "started");
    assert_eq!(started["workflow_id"], "greet-1");
    let run_id = started["run_id"].as_str().unwrap().to_string();

    let described = success(call(&dispatcher, "describe_workflow", json!({"workflow_id": "greet-1"})).await);
    assert_eq!(described["status"], "RUNNING");
    assert_eq!(described["workflow_type"], "Greeting");
    assert_eq!(described["run_id"], run_id);

    let waiting = tokio::spawn({
        let dispatcher = dispatcher.clone();
        async move { call(&dispatcher, "get_workflow_result", json!({"workflow_id": "greet-1", "timeout_seconds": 10})).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(temporal.complete_workflow("greet-1", json!({"x": 1})));

    let result = success(waiting.await.unwrap());
    assert_eq!(result["result"], json!({"x": 1}));
    assert_eq!(result["run_id"], run_id);

    let described = success(call(&dispatcher, "describe_workflow", json!({"workflow_id": "greet-1"})).await);
    assert_eq!(described["status"], "COMPLETED");
}

#[tokio::test]
async fn starting_a_running_id_reports_collision() {
    let temporal = Arc::new(InMemoryTemporal::new());
    temporal.seed_workflow("greet-1", "Greeting");
    let dispatcher = dispatcher(&temporal);

    let reply = call(
        &dispatcher,
        "start_workflow",
        json!({"workflow_name": "Greeting", "workflow_id": "greet-1", "task_queue": "q", "args": []}),
    )
    .await;
    assert_eq!(reply.error_kind(), Some(ErrorKind::WorkflowAlreadyExists));
    assert_eq!(reply.to_value()["tool"], "start_workflow");
}

#[tokio::test]
async fn missing_parameter_never_reaches_the_platform() {
    let temporal = Arc::new(InMemoryTemporal::new());
    let dispatcher = dispatcher(&temporal);

    let reply = call(
        &dispatcher,
        "start_workflow",
        json!({"workflow_name": "Greeting", "workflow_id": "greet-1", "args": {}}),
    )
    .await;
    let value = reply.to_value();
    assert_eq!(value["error"], "missing_parameter");
    assert!(value["message"].as_str().unwrap().contains("task_queue"));
    assert_eq!(temporal.total_calls(), 0);
}

#[tokio::test]
async fn unknown_tool_is_reported() {
    let temporal = Arc::new(InMemoryTemporal::new());
    let reply = call(&dispatcher(&temporal), "drop_namespace", json!({})).await;
    assert_eq!(reply.error_kind(), Some(ErrorKind::UnknownTool));
    assert_eq!(temporal.total_calls(), 0);
}

#[tokio::test]
async fn invalid_batch_size_is_rejected_before_listing() {
    let temporal = Arc::new(InMemoryTemporal::new());
    seed_orders(&temporal, 2);
    let dispatcher = dispatcher(&temporal);

    for limit in [json!(0), json!(-5), json!("ten")] {
        let reply = call(
            &dispatcher,
            "batch_terminate",
            json!({"query": "WorkflowType='Order'", "limit": limit, "reason": "cleanup"}),
        )
        .await;
        assert_eq!(reply.error_kind(), Some(ErrorKind::InvalidParameter), "limit {limit}");
    }
    let reply = call(&dispatcher, "batch_cancel", json!({"query": "  ", "limit": 5})).await;
    assert_eq!(reply.error_kind(), Some(ErrorKind::InvalidParameter));
    assert_eq!(temporal.total_calls(), 0);
}

#[tokio::test]
async fn batch_reports_every_item_despite_failures() {
    let temporal = Arc::new(InMemoryTemporal::new());
    seed_orders(&temporal, 5);
    temporal.seed_workflow("invoice-1", "Invoice");
    temporal.inject_failure("terminate_workflow", "order-2", TemporalError::not_found("workflow not found"));
    temporal.inject_failure("terminate_workflow", "order-4", TemporalError::connection("connection reset"));
    let dispatcher = dispatcher(&temporal);

    let report = success(
        call(
            &dispatcher,
            "batch_terminate",
            json!({"query": "WorkflowType='Order'", "limit": 10, "reason": "cleanup"}),
        )
        .await,
    );
    assert_eq!(report["total"], 5);
    assert_eq!(report["succeeded"], 3);
    assert_eq!(report["failed"], 2);

    let outcomes = report["outcomes"].as_array().unwrap();
    let ids: Vec<_> = outcomes.iter().map(|outcome| outcome["workflow_id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["order-1", "order-2", "order-3", "order-4", "order-5"]);
    assert_eq!(outcomes[1]["status"], "failed");
    assert_eq!(outcomes[1]["error"]["kind"], "not_found");
    assert_eq!(outcomes[3]["error"]["kind"], "connection_error");
    assert_eq!(outcomes[4]["status"], "succeeded");

    assert_eq!(temporal.call_count("terminate_workflow"), 5);
    assert_eq!(temporal.workflow("order-5").unwrap().status, WorkflowStatus::Terminated);
    assert_eq!(temporal.workflow("order-2").unwrap().status, WorkflowStatus::Running);
    assert_eq!(temporal.workflow("invoice-1").unwrap().status, WorkflowStatus::Running);
}

#[tokio::test]
async fn batch_limit_caps_targets() {
    let temporal = Arc::new(InMemoryTemporal::new());
    seed_orders(&temporal, 5);
    let dispatcher = dispatcher(&temporal);

    let report = success(
        call(
            &dispatcher,
            "batch_signal",
            json!({"query": "WorkflowType='Order'", "limit": 3, "signal_name": "refresh", "args": {"force": true}}),
        )
        .await,
    );
    assert_eq!(report["total"], 3);
    assert_eq!(temporal.signals("order-3").len(), 1);
    assert_eq!(temporal.signals("order-3")[0].args, Some(json!({"force": true})));
    assert!(temporal.signals("order-4").is_empty());
}

#[tokio::test]
async fn workflow_pages_concatenate() {
    let temporal = Arc::new(InMemoryTemporal::new());
    seed_orders(&temporal, 5);
    let dispatcher = dispatcher(&temporal);

    let first = success(call(&dispatcher, "list_workflows", json!({"query": "", "limit": 2, "skip": 0})).await);
    let second = success(call(&dispatcher, "list_workflows", json!({"query": "", "limit": 2, "skip": 2})).await);
    let both = success(call(&dispatcher, "list_workflows", json!({"query": "", "limit": 4, "skip": 0})).await);

    assert_eq!(first["has_more"], true);
    assert_eq!(first["next_skip"], 2);
    let mut joined = first["workflows"].as_array().unwrap().clone();
    joined.extend(second["workflows"].as_array().unwrap().iter().cloned());
    assert_eq!(&joined, both["workflows"].as_array().unwrap());

    let tail = success(call(&dispatcher, "list_workflows", json!({"query": "", "limit": 2, "skip": 4})).await);
    assert_eq!(tail["count"], 1);
    assert_eq!(tail["has_more"], false);
    assert_eq!(tail["next_skip"], Value::Null);
}

#[tokio::test]
async fn schedule_pages_concatenate() {
    let temporal = Arc::new(InMemoryTemporal::new());
    for index in 1..=5 {
        temporal.seed_schedule(&format!("nightly-{index}"), "Report", "0 2 * * *");
    }
    let dispatcher = dispatcher(&temporal);

    let first = success(call(&dispatcher, "list_schedules", json!({"limit": 2})).await);
    let second = success(call(&dispatcher, "list_schedules", json!({"limit": 2, "skip": 2})).await);
    let both = success(call(&dispatcher, "list_schedules", json!({"limit": 4, "skip": 0})).await);

    let mut joined = first["schedules"].as_array().unwrap().clone();
    joined.extend(second["schedules"].as_array().unwrap().iter().cloned());
    assert_eq!(&joined, both["schedules"].as_array().unwrap());
    assert_eq!(both["next_skip"], 4);
}

#[tokio::test]
async fn result_wait_times_out() {
    let temporal = Arc::new(InMemoryTemporal::new());
    temporal.seed_workflow("stuck", "Forever");
    let dispatcher = dispatcher(&temporal);

    let reply = call(&dispatcher, "get_workflow_result", json!({"workflow_id": "stuck", "timeout_seconds": 1})).await;
    let value = reply.to_value();
    assert_eq!(value["error"], "timeout");
    assert_eq!(value["retryable"], true);
}

#[tokio::test]
async fn failed_workflow_result_names_the_status() {
    let temporal = Arc::new(InMemoryTemporal::new());
    temporal.seed_workflow("charge-1", "Charge");
    temporal.close_workflow("charge-1", WorkflowStatus::Failed, "card declined");
    let dispatcher = dispatcher(&temporal);

    let value = call(&dispatcher, "get_workflow_result", json!({"workflow_id": "charge-1"})).await.to_value();
    assert_eq!(value["error"], "workflow_failed");
    let message = value["message"].as_str().unwrap();
    assert!(message.contains("FAILED"));
    assert!(message.contains("card declined"));
}

#[tokio::test]
async fn cancellation_aborts_the_handler() {
    let temporal = Arc::new(InMemoryTemporal::new());
    temporal.seed_workflow("stuck", "Forever");
    let dispatcher = dispatcher(&temporal);
    let token = CancellationToken::new();

    tokio::spawn({
        let token = token.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        }
    });
    let request = ToolCallRequest::from_value("get_workflow_result", json!({"workflow_id": "stuck", "timeout_seconds": 30})).unwrap();
    let reply = dispatcher.dispatch(request, &token).await;
    assert_eq!(reply.error_kind(), Some(ErrorKind::Cancelled));
}

#[tokio::test]
async fn interaction_tools_reach_the_workflow() {
    let temporal = Arc::new(InMemoryTemporal::new());
    temporal.seed_workflow("cart-1", "Cart");
    temporal.set_query_result("cart-1", "items", json!(["apple"]));
    let dispatcher = dispatcher(&temporal);

    let queried = success(call(&dispatcher, "query_workflow", json!({"workflow_id": "cart-1", "query_name": "items"})).await);
    assert_eq!(queried["query_result"], json!(["apple"]));

    let signalled = success(
        call(
            &dispatcher,
            "signal_workflow",
            json!({"workflow_id": "cart-1", "signal_name": "add", "args": {"item": "pear"}}),
        )
        .await,
    );
    assert_eq!(signalled["status"], "signal_sent");

    let continued = success(call(&dispatcher, "continue_as_new", json!({"workflow_id": "cart-1"})).await);
    assert_eq!(continued["signal_name"], "continue_as_new");
    let signals = temporal.signals("cart-1");
    assert_eq!(signals.len(), 2);
    assert_eq!(signals[0].args, Some(json!({"item": "pear"})));
    assert_eq!(signals[1].signal_name, "continue_as_new");
    assert_eq!(signals[1].args, None);

    let cancelled = success(call(&dispatcher, "cancel_workflow", json!({"workflow_id": "cart-1"})).await);
    assert_eq!(cancelled["status"], "cancel_requested");
    assert_eq!(temporal.workflow("cart-1").unwrap().status, WorkflowStatus::Canceled);

    let reply = call(&dispatcher, "terminate_workflow", json!({"workflow_id": "cart-1", "reason": "done"})).await;
    assert_eq!(reply.error_kind(), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn history_is_cut_at_the_limit() {
    let temporal = Arc::new(InMemoryTemporal::new());
    temporal.seed_workflow("greet-1", "Greeting");
    temporal.complete_workflow("greet-1", json!("hi"));
    let dispatcher = dispatcher(&temporal);

    let history = success(call(&dispatcher, "get_workflow_history", json!({"workflow_id": "greet-1", "limit": 1})).await);
    assert_eq!(history["count"], 1);
    assert_eq!(history["truncated"], true);
    assert_eq!(history["events"][0]["event_type"], "WORKFLOW_EXECUTION_STARTED");

    let history = success(call(&dispatcher, "get_workflow_history", json!({"workflow_id": "greet-1"})).await);
    assert_eq!(history["count"], 2);
    assert_eq!(history["truncated"], false);
}

#[tokio::test]
async fn schedule_lifecycle() {
    let temporal = Arc::new(InMemoryTemporal::new());
    let dispatcher = dispatcher(&temporal);
    let create = json!({
        "schedule_id": "nightly",
        "cron": "0 2 * * *",
        "workflow_name": "Report",
        "task_queue": "reports",
    });

    let created = success(call(&dispatcher, "create_schedule", create.clone()).await);
    assert_eq!(created["workflow_id"], "nightly-workflow");
    let duplicate = call(&dispatcher, "create_schedule", create).await;
    assert_eq!(duplicate.error_kind(), Some(ErrorKind::ScheduleAlreadyExists));

    let paused = success(call(&dispatcher, "pause_schedule", json!({"schedule_id": "nightly"})).await);
    assert_eq!(paused["status"], "paused");
    let summary = temporal.schedule("nightly").unwrap();
    assert!(summary.paused);
    assert_eq!(summary.note.as_deref(), Some("Paused via MCP"));

    success(call(&dispatcher, "unpause_schedule", json!({"schedule_id": "nightly", "note": "back on"})).await);
    let summary = temporal.schedule("nightly").unwrap();
    assert!(!summary.paused);
    assert_eq!(summary.note.as_deref(), Some("back on"));

    let triggered = success(call(&dispatcher, "trigger_schedule", json!({"schedule_id": "nightly"})).await);
    assert_eq!(triggered["status"], "triggered");
    assert_eq!(temporal.trigger_count("nightly"), 1);

    let deleted = success(call(&dispatcher, "delete_schedule", json!({"schedule_id": "nightly"})).await);
    assert_eq!(deleted["status"], "deleted");
    assert!(temporal.schedule("nightly").is_none());
    let again = call(&dispatcher, "delete_schedule", json!({"schedule_id": "nightly"})).await;
    assert_eq!(again.error_kind(), Some(ErrorKind::NotFound));
}
