/// Logging layer: subscriber setup and the per-run log context.
pub mod context;
pub mod init;

pub use context::{LogContext, RunLog, TOOL_TARGET, ancestor_filter, disable_propagation};
pub use init::{LogConfig, LogFormat, init_logging};
