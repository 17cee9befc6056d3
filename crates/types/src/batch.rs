use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchItemStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemError {
    /// Stable error kind, the same vocabulary single-workflow tools report.
    pub kind: String,
    pub message: String,
}

/// Result of applying a batch operation to one workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemOutcome {
    pub workflow_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub status: BatchItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<BatchItemError>,
}

impl BatchItemOutcome {
    pub fn succeeded(workflow_id: impl Into<String>, run_id: Option<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            run_id,
            status: BatchItemStatus::Succeeded,
            error: None,
        }
    }

    pub fn failed(workflow_id: impl Into<String>, run_id: Option<String>, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            run_id,
            status: BatchItemStatus::Failed,
            error: Some(BatchItemError {
                kind: kind.into(),
                message: message.into(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == BatchItemStatus::Succeeded
    }
}

/// Per-item report of a batch operation, in listing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub operation: String,
    pub query: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<BatchItemOutcome>,
}

impl BatchReport {
    pub fn new(operation: impl Into<String>, query: impl Into<String>, outcomes: Vec<BatchItemOutcome>) -> Self {
        let succeeded = outcomes.iter().filter(|outcome| outcome.is_success()).count();
        Self {
            operation: operation.into(),
            query: query.into(),
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            outcomes,
        }
    }
}
