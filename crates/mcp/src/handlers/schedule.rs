use async_trait::async_trait;
use serde_json::{Value, json};
use temporal_mcp_api::TemporalError;
use temporal_mcp_types::{NewSchedule, StartWorkflowSpec};
use tracing::info;

use super::{
    arguments::{CreateScheduleArguments, PageArguments, ScheduleNoteArguments, ScheduleTarget},
    pagination::{fetch_page, page_payload},
};
use crate::{dispatcher::ToolContext, registry::ToolHandler, types::ToolError};

pub const DEFAULT_PAUSE_NOTE: &str = "Paused via MCP";
pub const DEFAULT_UNPAUSE_NOTE: &str = "Unpaused via MCP";

fn schedule_reply(schedule_id: &str, status: &str) -> Value {
    json!({
        "schedule_id": schedule_id,
        "status": status,
    })
}

pub struct CreateSchedule;

#[async_trait]
impl ToolHandler for CreateSchedule {
    type Arguments = CreateScheduleArguments;

    async fn call(&self, context: &ToolContext, arguments: CreateScheduleArguments) -> Result<Value, ToolError> {
        let workflow_id = arguments.workflow_id();
        let action = StartWorkflowSpec::new(&workflow_id, &arguments.workflow_name, &arguments.task_queue)
            .with_input(arguments.workflow_args());
        let schedule = NewSchedule {
            schedule_id: arguments.schedule_id.clone(),
            cron_expressions: vec![arguments.cron.trim().to_string()],
            action,
        };
        context.temporal().create_schedule(&schedule).await.map_err(|error| match error {
            TemporalError::AlreadyExists { .. } => ToolError::ScheduleAlreadyExists {
                schedule_id: arguments.schedule_id.clone(),
            },
            other => other.into(),
        })?;
        info!(schedule_id = %arguments.schedule_id, cron = %arguments.cron, "schedule created");
        Ok(json!({
            "schedule_id": arguments.schedule_id,
            "cron": arguments.cron,
            "workflow_name": arguments.workflow_name,
            "workflow_id": workflow_id,
            "task_queue": arguments.task_queue,
            "status": "created",
        }))
    }
}

pub struct ListSchedules;

#[async_trait]
impl ToolHandler for ListSchedules {
    type Arguments = PageArguments;

    async fn call(&self, context: &ToolContext, arguments: PageArguments) -> Result<Value, ToolError> {
        let page = fetch_page(arguments.skip()?, arguments.limit()?, |page_size, token| async move {
            context.temporal().list_schedules(page_size, token.as_deref()).await
        })
        .await?;
        page_payload("schedules", &page)
    }
}

pub struct PauseSchedule;

#[async_trait]
impl ToolHandler for PauseSchedule {
    type Arguments = ScheduleNoteArguments;

    async fn call(&self, context: &ToolContext, arguments: ScheduleNoteArguments) -> Result<Value, ToolError> {
        let note = arguments.note_or(DEFAULT_PAUSE_NOTE);
        context.temporal().pause_schedule(&arguments.schedule_id, note).await?;
        info!(schedule_id = %arguments.schedule_id, "schedule paused");
        let mut reply = schedule_reply(&arguments.schedule_id, "paused");
        reply["note"] = Value::String(note.to_string());
        Ok(reply)
    }
}

pub struct UnpauseSchedule;

#[async_trait]
impl ToolHandler for UnpauseSchedule {
    type Arguments = ScheduleNoteArguments;

    async fn call(&self, context: &ToolContext, arguments: ScheduleNoteArguments) -> Result<Value, ToolError> {
        let note = arguments.note_or(DEFAULT_UNPAUSE_NOTE);
        context.temporal().unpause_schedule(&arguments.schedule_id, note).await?;
        info!(schedule_id = %arguments.schedule_id, "schedule unpaused");
        let mut reply = schedule_reply(&arguments.schedule_id, "unpaused");
        reply["note"] = Value::String(note.to_string());
        Ok(reply)
    }
}

pub struct DeleteSchedule;

#[async_trait]
impl ToolHandler for DeleteSchedule {
    type Arguments = ScheduleTarget;

    async fn call(&self, context: &ToolContext, arguments: ScheduleTarget) -> Result<Value, ToolError> {
        context.temporal().delete_schedule(&arguments.schedule_id).await?;
        info!(schedule_id = %arguments.schedule_id, "schedule deleted");
        Ok(schedule_reply(&arguments.schedule_id, "deleted"))
    }
}

pub struct TriggerSchedule;

#[async_trait]
impl ToolHandler for TriggerSchedule {
    type Arguments = ScheduleTarget;

    async fn call(&self, context: &ToolContext, arguments: ScheduleTarget) -> Result<Value, ToolError> {
        context.temporal().trigger_schedule(&arguments.schedule_id).await?;
        info!(schedule_id = %arguments.schedule_id, "schedule triggered");
        Ok(schedule_reply(&arguments.schedule_id, "triggered"))
    }
}
