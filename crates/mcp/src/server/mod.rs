mod core;
mod http;
mod stdio;

pub use core::TemporalMcpServer;
pub use http::{DEFAULT_BIND_ADDRESS, MCP_PATH, McpHttpServer, RunningMcpHttpServer, resolve_bind_address};
pub use stdio::serve_stdio;
