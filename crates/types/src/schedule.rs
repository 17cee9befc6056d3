use serde::{Deserialize, Serialize};

use crate::workflow::StartWorkflowSpec;

/// Listing entry for a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub schedule_id: String,
    pub paused: bool,
    /// Note recorded with the last pause or unpause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cron_expressions: Vec<String>,
}

/// A cron schedule that starts `action` on every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSchedule {
    pub schedule_id: String,
    pub cron_expressions: Vec<String>,
    pub action: StartWorkflowSpec,
}
