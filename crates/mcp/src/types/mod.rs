pub mod errors;
pub mod reply;

pub use errors::{ErrorKind, ToolError};
pub use reply::{ToolFailure, ToolReply};
