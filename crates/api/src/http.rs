//! [`TemporalClient`] over the Temporal frontend HTTP API.

use std::{fs, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{
    Client, Identity, Method, RequestBuilder,
    header::{self, HeaderMap, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use temporal_mcp_types::{
    HistoryEvent, ListPage, NewSchedule, ScheduleSummary, StartWorkflowSpec, WorkflowExecution, WorkflowExecutionRef, WorkflowOutcome,
};
use tracing::{debug, info};
use url::Url;

use crate::{
    client::TemporalClient,
    config::{ClientCertificate, ConfigError, ConnectionConfig},
    error::TemporalError,
    wire::{
        self, CLOSE_EVENT_FILTER, CancelWorkflowRequest, CloseEvent, CreateScheduleRequest, DescribeWorkflowResponse, ExecutionRefIn,
        GetHistoryResponse, Ignored, ListSchedulesResponse, ListWorkflowsResponse, Named, NewWorkflowIn, PatchScheduleRequest,
        QueryIn, QueryWorkflowRequest, QueryWorkflowResponse, ScheduleActionIn, ScheduleIn, SchedulePatchIn, ScheduleSpecIn,
        ScheduleStateIn, SignalWorkflowRequest, StartWorkflowRequest, StartWorkflowResponse, TerminateWorkflowRequest,
        TriggerImmediatelyIn,
    },
};

const NAMESPACE_HEADER: &str = "temporal-namespace";
const USER_AGENT: &str = concat!("temporal-mcp/", env!("CARGO_PKG_VERSION"));

/// Per-request bound for history long polls; the server answers before this.
pub const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(75);

/// Builds the shared client handle from resolved settings.
///
/// The HTTP client connects lazily, so an unreachable cluster surfaces as a
/// connection error on the first tool call rather than here.
pub fn connect(config: &ConnectionConfig) -> Result<TemporalHttpClient, ConfigError> {
    TemporalHttpClient::connect(config)
}

#[derive(Debug, Clone)]
pub struct TemporalHttpClient {
    http: Client,
    base_url: Url,
    namespace: String,
    identity: String,
}

impl TemporalHttpClient {
    pub fn connect(config: &ConnectionConfig) -> Result<Self, ConfigError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let namespace_value = HeaderValue::from_str(&config.namespace).map_err(|error| ConfigError::InvalidValue {
            name: crate::config::NAMESPACE_ENV,
            value: config.namespace.clone(),
            reason: error.to_string(),
        })?;
        default_headers.insert(NAMESPACE_HEADER, namespace_value);
        if let Some(api_key) = &config.api_key {
            let mut authorization =
                HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| ConfigError::InvalidCredential {
                    message: "API key contains characters that are not valid in a header".to_string(),
                })?;
            authorization.set_sensitive(true);
            default_headers.insert(header::AUTHORIZATION, authorization);
        }

        let mut builder = Client::builder()
            .default_headers(default_headers)
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout);
        if config.tls_enabled {
            builder = builder.https_only(true);
        }
        if let Some(certificate) = &config.client_certificate {
            builder = builder.identity(load_identity(certificate)?);
        }
        let http = builder.build().map_err(|error| ConfigError::Client {
            message: error.to_string(),
        })?;

        let base_url = config.http_base_url()?;
        info!(
            host = %config.host,
            namespace = %config.namespace,
            endpoint = %base_url,
            tls = config.tls_enabled,
            tls_decision = %config.tls_decision,
            api_key = config.api_key.is_some(),
            mtls = config.client_certificate.is_some(),
            "configured Temporal connection"
        );
        Ok(Self::with_client(http, base_url, config.namespace.clone()))
    }

    /// Wraps an already configured `reqwest::Client`.
    pub fn with_client(http: Client, base_url: Url, namespace: impl Into<String>) -> Self {
        Self {
            http,
            base_url,
            namespace: namespace.into(),
            identity: format!("{USER_AGENT}@{}", std::process::id()),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Cheap reachability probe (describe namespace).
    pub async fn check_health(&self) -> Result<(), TemporalError> {
        let url = self.url(&[])?;
        let _: Ignored = self.execute(self.request(Method::GET, url)).await?;
        Ok(())
    }

    /// `/api/v1/namespaces/{namespace}/{segments...}` with each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, TemporalError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TemporalError::invalid_argument(format!("'{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "v1", "namespaces", self.namespace.as_str()])
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "temporal request");
        self.http.request(method, url)
    }

    fn post<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> RequestBuilder {
        self.request(Method::POST, url).json(body)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, TemporalError> {
        let response = request.send().await.map_err(TemporalError::from_transport)?;
        let status = response.status();
        let body = response.text().await.map_err(TemporalError::from_transport)?;
        if !status.is_success() {
            let error = TemporalError::from_response(status.as_u16(), &body);
            debug!(status = status.as_u16(), %error, "temporal request failed");
            return Err(error);
        }
        let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
        serde_json::from_str(body).map_err(|error| TemporalError::decode(error.to_string()))
    }

    fn request_id(&self, scope: &str) -> String {
        format!("{scope}-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default())
    }

    /// Long-polls the close event of one run.
    async fn wait_for_close(&self, workflow_id: &str, run_id: &str) -> Result<CloseEvent, TemporalError> {
        let mut page_token: Option<String> = None;
        loop {
            let url = self.url(&["workflows", workflow_id, "history"])?;
            let mut params = vec![
                ("execution.runId", run_id.to_string()),
                ("waitNewEvent", "true".to_string()),
                ("historyEventFilterType", CLOSE_EVENT_FILTER.to_string()),
            ];
            if let Some(token) = &page_token {
                params.push(("nextPageToken", token.clone()));
            }
            let response: GetHistoryResponse = self
                .execute(self.request(Method::GET, url).query(&params).timeout(LONG_POLL_TIMEOUT))
                .await?;
            if let Some(close) = response.history.events.into_iter().find_map(|event| event.close_event()) {
                return Ok(close);
            }
            page_token = response.next_page_token.filter(|token| !token.is_empty());
        }
    }
}

fn load_identity(certificate: &ClientCertificate) -> Result<Identity, ConfigError> {
    let mut pem = fs::read(&certificate.cert_path).map_err(|source| ConfigError::ReadCredential {
        what: "client certificate",
        path: certificate.cert_path.clone(),
        source,
    })?;
    let key = fs::read(&certificate.key_path).map_err(|source| ConfigError::ReadCredential {
        what: "client key",
        path: certificate.key_path.clone(),
        source,
    })?;
    if !pem.ends_with(b"\n") {
        pem.push(b'\n');
    }
    pem.extend_from_slice(&key);
    Identity::from_pem(&pem).map_err(|error| ConfigError::InvalidCredential {
        message: error.to_string(),
    })
}

fn execution_ref(execution: &WorkflowExecutionRef) -> ExecutionRefIn<'_> {
    ExecutionRefIn {
        workflow_id: &execution.workflow_id,
        run_id: execution.run_id.as_deref(),
    }
}

#[async_trait]
impl TemporalClient for TemporalHttpClient {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn start_workflow(&self, spec: &StartWorkflowSpec) -> Result<String, TemporalError> {
        let url = self.url(&["workflows", &spec.workflow_id])?;
        let body = StartWorkflowRequest::new(spec, &self.identity, self.request_id(&spec.workflow_id));
        let response: StartWorkflowResponse = self.execute(self.post(url, &body)).await?;
        Ok(response.run_id)
    }

    async fn describe_workflow(&self, execution: &WorkflowExecutionRef) -> Result<WorkflowExecution, TemporalError> {
        let url = self.url(&["workflows", &execution.workflow_id])?;
        let mut request = self.request(Method::GET, url);
        if let Some(run_id) = &execution.run_id {
            request = request.query(&[("execution.runId", run_id)]);
        }
        let response: DescribeWorkflowResponse = self.execute(request).await?;
        Ok(response.workflow_execution_info.into())
    }

    async fn list_workflows(
        &self,
        query: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<ListPage<WorkflowExecution>, TemporalError> {
        let url = self.url(&["workflows"])?;
        let mut params = vec![("pageSize", page_size.to_string())];
        if !query.trim().is_empty() {
            params.push(("query", query.to_string()));
        }
        if let Some(token) = page_token {
            params.push(("nextPageToken", token.to_string()));
        }
        let response: ListWorkflowsResponse = self.execute(self.request(Method::GET, url).query(&params)).await?;
        Ok(ListPage::new(
            response.executions.into_iter().map(WorkflowExecution::from).collect(),
            response.next_page_token,
        ))
    }

    async fn workflow_history(
        &self,
        execution: &WorkflowExecutionRef,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<ListPage<HistoryEvent>, TemporalError> {
        let url = self.url(&["workflows", &execution.workflow_id, "history"])?;
        let mut params = vec![("maximumPageSize", page_size.to_string())];
        if let Some(run_id) = &execution.run_id {
            params.push(("execution.runId", run_id.clone()));
        }
        if let Some(token) = page_token {
            params.push(("nextPageToken", token.to_string()));
        }
        let response: GetHistoryResponse = self.execute(self.request(Method::GET, url).query(&params)).await?;
        Ok(ListPage::new(
            response.history.events.into_iter().map(HistoryEvent::from).collect(),
            response.next_page_token,
        ))
    }

    async fn await_workflow_outcome(&self, execution: &WorkflowExecutionRef) -> Result<WorkflowOutcome, TemporalError> {
        let mut run_id = match &execution.run_id {
            Some(run_id) => run_id.clone(),
            None => self.describe_workflow(execution).await?.run_id,
        };
        loop {
            match self.wait_for_close(&execution.workflow_id, &run_id).await? {
                CloseEvent::Completed(result) => return Ok(WorkflowOutcome::Completed { run_id, result }),
                CloseEvent::Closed {
                    status,
                    next_run_id: Some(next_run_id),
                    ..
                } => {
                    debug!(workflow_id = %execution.workflow_id, %status, %run_id, %next_run_id, "following next run");
                    run_id = next_run_id;
                }
                CloseEvent::Closed { status, reason, .. } => {
                    return Ok(WorkflowOutcome::Closed { run_id, status, reason });
                }
            }
        }
    }

    async fn query_workflow(&self, execution: &WorkflowExecutionRef, query_name: &str, args: Option<&Value>) -> Result<Value, TemporalError> {
        let url = self.url(&["workflows", &execution.workflow_id, "query", query_name])?;
        let body = QueryWorkflowRequest {
            execution: execution_ref(execution),
            query: QueryIn {
                query_type: query_name,
                query_args: wire::payloads(args),
            },
        };
        let response: QueryWorkflowResponse = self.execute(self.post(url, &body)).await?;
        if let Some(rejected) = response.query_rejected {
            let status = rejected.status.unwrap_or_else(|| "unknown".to_string());
            return Err(TemporalError::invalid_argument(format!("query rejected, workflow status {status}")));
        }
        Ok(wire::single_payload(response.query_result))
    }

    async fn signal_workflow(&self, execution: &WorkflowExecutionRef, signal_name: &str, args: Option<&Value>) -> Result<(), TemporalError> {
        let url = self.url(&["workflows", &execution.workflow_id, "signal", signal_name])?;
        let body = SignalWorkflowRequest {
            workflow_execution: execution_ref(execution),
            signal_name,
            input: wire::payloads(args),
            identity: &self.identity,
            request_id: self.request_id(signal_name),
        };
        let _: Ignored = self.execute(self.post(url, &body)).await?;
        Ok(())
    }

    async fn cancel_workflow(&self, execution: &WorkflowExecutionRef) -> Result<(), TemporalError> {
        let url = self.url(&["workflows", &execution.workflow_id, "cancel"])?;
        let body = CancelWorkflowRequest {
            workflow_execution: execution_ref(execution),
            identity: &self.identity,
            request_id: self.request_id("cancel"),
        };
        let _: Ignored = self.execute(self.post(url, &body)).await?;
        Ok(())
    }

    async fn terminate_workflow(&self, execution: &WorkflowExecutionRef, reason: &str) -> Result<(), TemporalError> {
        let url = self.url(&["workflows", &execution.workflow_id, "terminate"])?;
        let body = TerminateWorkflowRequest {
            workflow_execution: execution_ref(execution),
            reason,
            identity: &self.identity,
        };
        let _: Ignored = self.execute(self.post(url, &body)).await?;
        Ok(())
    }

    async fn create_schedule(&self, schedule: &NewSchedule) -> Result<(), TemporalError> {
        let url = self.url(&["schedules", &schedule.schedule_id])?;
        let action = &schedule.action;
        let body = CreateScheduleRequest {
            schedule: ScheduleIn {
                spec: ScheduleSpecIn {
                    cron_string: &schedule.cron_expressions,
                },
                action: ScheduleActionIn {
                    start_workflow: NewWorkflowIn {
                        workflow_id: &action.workflow_id,
                        workflow_type: Named {
                            name: &action.workflow_type,
                        },
                        task_queue: Named { name: &action.task_queue },
                        input: wire::payloads(action.input.as_ref()),
                    },
                },
                state: ScheduleStateIn { paused: false },
            },
            identity: &self.identity,
            request_id: self.request_id(&schedule.schedule_id),
        };
        let _: Ignored = self.execute(self.post(url, &body)).await?;
        Ok(())
    }

    async fn list_schedules(&self, page_size: usize, page_token: Option<&str>) -> Result<ListPage<ScheduleSummary>, TemporalError> {
        let url = self.url(&["schedules"])?;
        let mut params = vec![("maximumPageSize", page_size.to_string())];
        if let Some(token) = page_token {
            params.push(("nextPageToken", token.to_string()));
        }
        let response: ListSchedulesResponse = self.execute(self.request(Method::GET, url).query(&params)).await?;
        Ok(ListPage::new(
            response.schedules.into_iter().map(ScheduleSummary::from).collect(),
            response.next_page_token,
        ))
    }

    async fn pause_schedule(&self, schedule_id: &str, note: &str) -> Result<(), TemporalError> {
        self.patch_schedule(
            schedule_id,
            SchedulePatchIn {
                pause: Some(note),
                ..Default::default()
            },
        )
        .await
    }

    async fn unpause_schedule(&self, schedule_id: &str, note: &str) -> Result<(), TemporalError> {
        self.patch_schedule(
            schedule_id,
            SchedulePatchIn {
                unpause: Some(note),
                ..Default::default()
            },
        )
        .await
    }

    async fn delete_schedule(&self, schedule_id: &str) -> Result<(), TemporalError> {
        let url = self.url(&["schedules", schedule_id])?;
        let request = self.request(Method::DELETE, url).query(&[("identity", self.identity.as_str())]);
        let _: Ignored = self.execute(request).await?;
        Ok(())
    }

    async fn trigger_schedule(&self, schedule_id: &str) -> Result<(), TemporalError> {
        self.patch_schedule(
            schedule_id,
            SchedulePatchIn {
                trigger_immediately: Some(TriggerImmediatelyIn {}),
                ..Default::default()
            },
        )
        .await
    }
}

impl TemporalHttpClient {
    async fn patch_schedule(&self, schedule_id: &str, patch: SchedulePatchIn<'_>) -> Result<(), TemporalError> {
        let url = self.url(&["schedules", schedule_id, "patch"])?;
        let body = PatchScheduleRequest {
            patch,
            identity: &self.identity,
            request_id: self.request_id(schedule_id),
        };
        let _: Ignored = self.execute(self.post(url, &body)).await?;
        Ok(())
    }
}
