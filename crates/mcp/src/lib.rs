//! Model Context Protocol (MCP) tool surface for Temporal.
//!
//! Tool calls flow through [`TemporalMcpServer`] into the [`Dispatcher`], which
//! resolves the tool in the [`ToolRegistry`], validates the typed arguments and
//! runs the handler against a shared [`temporal_mcp_api::TemporalClient`].
//! Replies are always a [`ToolReply`]: a success payload or a structured error.

pub mod dispatcher;
pub mod handlers;
pub mod registry;
pub mod server;
pub mod types;

pub use dispatcher::{Dispatcher, ToolCallRequest, ToolContext};
pub use registry::{RegistryError, ToolArguments, ToolDescriptor, ToolHandler, ToolRegistry};
pub use server::{McpHttpServer, RunningMcpHttpServer, TemporalMcpServer, resolve_bind_address, serve_stdio};
pub use types::{ErrorKind, ToolError, ToolFailure, ToolReply};
