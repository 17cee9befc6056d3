use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use temporal_mcp_api::{ConfigError, ConnectionConfig, ConnectionOverrides, TemporalClient, TemporalError, connect};
use temporal_mcp_types::{NewSchedule, StartWorkflowSpec, WorkflowExecutionRef, WorkflowOutcome, WorkflowStatus};

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    path: String,
    query: String,
    namespace_header: Option<String>,
    body: Value,
}

type Log = Arc<Mutex<Vec<Recorded>>>;

/// Minimal stand-in for the Temporal frontend HTTP API.
async fn fake_temporal(State(log): State<Log>, method: Method, uri: Uri, headers: HeaderMap, body: String) -> Response {
    let path = uri.path().to_string();
    log.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().unwrap_or_default().to_string(),
        namespace_header: headers
            .get("temporal-namespace")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });

    let route = path.trim_start_matches("/api/v1/namespaces/default");
    match (method, route) {
        (Method::POST, "/workflows/dup") => (
            StatusCode::CONFLICT,
            Json(json!({"code": 6, "message": "Workflow execution is already running"})),
        )
            .into_response(),
        (Method::POST, "/workflows/orders%2F1") => Json(json!({"runId": "run-42", "started": true})).into_response(),
        (Method::GET, "/workflows/missing") => (
            StatusCode::NOT_FOUND,
            Json(json!({"code": 5, "message": "workflow not found for ID: missing"})),
        )
            .into_response(),
        (Method::GET, "/workflows/orders%2F1") => Json(json!({
            "workflowExecutionInfo": {
                "execution": {"workflowId": "orders/1", "runId": "run-42"},
                "type": {"name": "OrderWorkflow"},
                "status": "WORKFLOW_EXECUTION_STATUS_RUNNING",
                "historyLength": "3",
                "taskQueue": "orders"
            }
        }))
        .into_response(),
        (Method::GET, "/workflows/orders%2F1/history") => Json(json!({
            "history": {"events": [{
                "eventId": "9",
                "eventType": "EVENT_TYPE_WORKFLOW_EXECUTION_COMPLETED",
                "workflowExecutionCompletedEventAttributes": {"result": [{"x": 1}]}
            }]},
            "nextPageToken": ""
        }))
        .into_response(),
        (Method::GET, "/workflows") => Json(json!({
            "executions": [
                {"execution": {"workflowId": "a", "runId": "r1"}, "type": {"name": "Order"}, "status": "WORKFLOW_EXECUTION_STATUS_COMPLETED"}
            ],
            "nextPageToken": "CiQ="
        }))
        .into_response(),
        (Method::POST, "/workflows/orders%2F1/signal/approve") => Json(json!({})).into_response(),
        (Method::POST, "/workflows/orders%2F1/terminate") => Json(json!({})).into_response(),
        (Method::POST, "/schedules/nightly") => Json(json!({"conflictToken": "AA=="})).into_response(),
        (Method::POST, "/schedules/nightly/patch") => Json(json!({})).into_response(),
        (Method::GET, "/schedules") => Json(json!({
            "schedules": [{
                "scheduleId": "nightly",
                "info": {"paused": true, "notes": "Paused via MCP", "workflowType": {"name": "Report"}, "spec": {"cronString": ["0 2 * * *"]}}
            }]
        }))
        .into_response(),
        (Method::DELETE, "/schedules/nightly") => Json(json!({})).into_response(),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "upstream unavailable").into_response(),
    }
}

async fn start_fake() -> (SocketAddr, Log) {
    let log: Log = Arc::default();
    let app = Router::new().fallback(fake_temporal).with_state(log.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (address, log)
}

fn local_config(address: SocketAddr) -> ConnectionConfig {
    ConnectionConfig::resolve_with(
        ConnectionOverrides {
            host: Some(format!("127.0.0.1:{}", address.port())),
            http_port: Some(address.port()),
            ..Default::default()
        },
        |_| None,
    )
    .unwrap()
}

#[tokio::test]
async fn start_workflow_posts_proto_json() {
    let (address, log) = start_fake().await;
    let client = connect(&local_config(address)).unwrap();

    let spec = StartWorkflowSpec::new("orders/1", "OrderWorkflow", "orders").with_input(Some(json!({"sku": "A1"})));
    let run_id = client.start_workflow(&spec).await.unwrap();
    assert_eq!(run_id, "run-42");

    let recorded = log.lock().unwrap()[0].clone();
    assert_eq!(recorded.method, Method::POST);
    assert_eq!(recorded.path, "/api/v1/namespaces/default/workflows/orders%2F1");
    assert_eq!(recorded.namespace_header.as_deref(), Some("default"));
    assert_eq!(recorded.body["workflowType"]["name"], "OrderWorkflow");
    assert_eq!(recorded.body["taskQueue"]["name"], "orders");
    assert_eq!(recorded.body["input"], json!([{"sku": "A1"}]));
}

#[tokio::test]
async fn duplicate_start_is_already_exists() {
    let (address, _log) = start_fake().await;
    let client = connect(&local_config(address)).unwrap();
    let error = client
        .start_workflow(&StartWorkflowSpec::new("dup", "OrderWorkflow", "orders"))
        .await
        .unwrap_err();
    assert!(matches!(error, TemporalError::AlreadyExists { .. }));
}

#[tokio::test]
async fn describe_maps_status_and_errors() {
    let (address, log) = start_fake().await;
    let client = connect(&local_config(address)).unwrap();

    let execution = client
        .describe_workflow(&WorkflowExecutionRef::new("orders/1", Some("run-42".into())))
        .await
        .unwrap();
    assert_eq!(execution.status, WorkflowStatus::Running);
    assert_eq!(execution.workflow_type, "OrderWorkflow");
    assert_eq!(execution.history_length, Some(3));
    assert!(log.lock().unwrap()[0].query.contains("execution.runId=run-42"));

    let error = client
        .describe_workflow(&WorkflowExecutionRef::latest("missing"))
        .await
        .unwrap_err();
    assert!(matches!(error, TemporalError::NotFound { message } if message.contains("missing")));
}

#[tokio::test]
async fn await_outcome_long_polls_close_event() {
    let (address, log) = start_fake().await;
    let client = connect(&local_config(address)).unwrap();

    let outcome = client
        .await_workflow_outcome(&WorkflowExecutionRef::new("orders/1", Some("run-42".into())))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        WorkflowOutcome::Completed {
            run_id: "run-42".into(),
            result: json!({"x": 1}),
        }
    );
    let query = log.lock().unwrap()[0].query.clone();
    assert!(query.contains("waitNewEvent=true"));
    assert!(query.contains("HISTORY_EVENT_FILTER_TYPE_CLOSE_EVENT"));
}

#[tokio::test]
async fn list_carries_query_and_token() {
    let (address, log) = start_fake().await;
    let client = connect(&local_config(address)).unwrap();

    let page = client.list_workflows("WorkflowType='Order'", 5, None).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].status, WorkflowStatus::Completed);
    assert_eq!(page.next_page_token.as_deref(), Some("CiQ="));
    let query = log.lock().unwrap()[0].query.clone();
    assert!(query.contains("pageSize=5"));
    assert!(query.contains("query=WorkflowType"));
}

#[tokio::test]
async fn signal_and_terminate_send_execution_reference() {
    let (address, log) = start_fake().await;
    let client = connect(&local_config(address)).unwrap();
    let execution = WorkflowExecutionRef::latest("orders/1");

    client
        .signal_workflow(&execution, "approve", Some(&json!({"by": "ops"})))
        .await
        .unwrap();
    client.terminate_workflow(&execution, "cleanup").await.unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log[0].body["workflowExecution"]["workflowId"], "orders/1");
    assert_eq!(log[0].body["input"], json!([{"by": "ops"}]));
    assert!(log[0].body["workflowExecution"].get("runId").is_none());
    assert_eq!(log[1].body["reason"], "cleanup");
}

#[tokio::test]
async fn schedule_lifecycle_requests() {
    let (address, log) = start_fake().await;
    let client = connect(&local_config(address)).unwrap();

    client
        .create_schedule(&NewSchedule {
            schedule_id: "nightly".into(),
            cron_expressions: vec!["0 2 * * *".into()],
            action: StartWorkflowSpec::new("nightly-workflow", "Report", "reports"),
        })
        .await
        .unwrap();
    client.pause_schedule("nightly", "Paused via MCP").await.unwrap();
    client.trigger_schedule("nightly").await.unwrap();
    let page = client.list_schedules(10, None).await.unwrap();
    client.delete_schedule("nightly").await.unwrap();

    assert!(page.is_last());
    assert!(page.items[0].paused);
    assert_eq!(page.items[0].cron_expressions, vec!["0 2 * * *".to_string()]);

    let log = log.lock().unwrap();
    assert_eq!(log[0].body["schedule"]["spec"]["cronString"], json!(["0 2 * * *"]));
    assert_eq!(log[0].body["schedule"]["action"]["startWorkflow"]["workflowId"], "nightly-workflow");
    assert_eq!(log[1].body["patch"], json!({"pause": "Paused via MCP"}));
    assert_eq!(log[2].body["patch"], json!({"triggerImmediately": {}}));
    assert_eq!(log[4].method, Method::DELETE);
}

#[tokio::test]
async fn unexpected_status_is_platform_error() {
    let (address, _log) = start_fake().await;
    let client = connect(&local_config(address)).unwrap();
    let error = client.cancel_workflow(&WorkflowExecutionRef::latest("orders/1")).await.unwrap_err();
    assert!(matches!(error, TemporalError::Platform { status: 503, .. }));
    assert!(!error.is_retryable());
}

#[tokio::test]
async fn unreachable_cluster_is_connection_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let client = connect(&local_config(address)).unwrap();
    let error = client.check_health().await.unwrap_err();
    assert!(matches!(error, TemporalError::Connection { .. }));
    assert!(error.is_retryable());
}

#[test]
fn malformed_client_certificate_is_configuration_error() {
    let directory = tempfile::tempdir().unwrap();
    let cert_path = directory.path().join("client.pem");
    let key_path = directory.path().join("client.key");
    std::fs::write(&cert_path, "not a certificate").unwrap();
    std::fs::write(&key_path, "not a key").unwrap();

    let config = ConnectionConfig::resolve_with(
        ConnectionOverrides {
            tls_cert: Some(cert_path),
            tls_key: Some(key_path),
            ..Default::default()
        },
        |_| None,
    )
    .unwrap();
    assert!(config.tls_enabled);
    assert!(matches!(connect(&config), Err(ConfigError::InvalidCredential { .. })));
}

#[test]
fn missing_client_certificate_file_is_configuration_error() {
    let directory = tempfile::tempdir().unwrap();
    let config = ConnectionConfig::resolve_with(
        ConnectionOverrides {
            tls_cert: Some(directory.path().join("absent.pem")),
            tls_key: Some(directory.path().join("absent.key")),
            ..Default::default()
        },
        |_| None,
    )
    .unwrap();
    assert!(matches!(
        connect(&config),
        Err(ConfigError::ReadCredential {
            what: "client certificate",
            ..
        })
    ));
}
