//! Data model shared by the Temporal client layer and the MCP tool surface.
//!
//! Everything here is plain data: identifiers are passed through unchanged and
//! nothing is persisted.

pub mod batch;
pub mod page;
pub mod schedule;
pub mod workflow;

pub use batch::{BatchItemError, BatchItemOutcome, BatchItemStatus, BatchReport};
pub use page::{ListPage, Page};
pub use schedule::{NewSchedule, ScheduleSummary};
pub use workflow::{
    HistoryEvent, RetryPolicy, StartWorkflowSpec, UnknownWorkflowStatus, WorkflowExecution, WorkflowExecutionRef,
    WorkflowOutcome, WorkflowStatus,
};
