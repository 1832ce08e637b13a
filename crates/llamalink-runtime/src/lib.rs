//! Runtime layer for llamalink: everything that performs I/O.
//!
//! - [`transport`]: HTTP GET/POST and line-framed streaming
//! - [`health`]: health probe and readiness wait loop
//! - [`server`]: llama-server launch arguments and process supervision
//! - [`router`]: model registry, load and unload with status polling
//! - [`api`]: typed facade over the server endpoints
//! - [`classify`]: chunk stream to event stream adapter

pub mod api;
pub mod classify;
pub mod health;
pub mod router;
pub mod server;
pub mod transport;

pub use api::{Generation, LlamaApi, Token};
pub use classify::{EventStream, classify, classify_with};
pub use health::{HealthStatus, HealthWait, probe, wait_for_health};
pub use router::{ModelRouter, PollOptions, RouterError, TransitionOutcome, TransitionProgress};
pub use server::{FlagValue, ServerLaunch, ServerStatus, ServerSupervisor, SupervisorError};
pub use transport::{ChunkStream, Payload, Transport, TransportError};
