//! llama-server process management: launch arguments, supervision, shutdown.

mod launch;
mod shutdown;
mod supervisor;

pub use launch::{DEFAULT_BINARY, DEFAULT_STARTUP_TIMEOUT, FlagValue, ServerLaunch};
pub use shutdown::{GRACE_PERIOD, kill, terminate};
pub use supervisor::{ServerStatus, ServerSupervisor, SupervisorError};
