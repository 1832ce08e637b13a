//! Lifecycle supervision of a single llama-server child process.

use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::launch::ServerLaunch;
use super::shutdown::{self, GRACE_PERIOD};
use crate::health::{DEFAULT_POLL_INTERVAL, wait_for_health};
use crate::transport::{Transport, TransportError};

/// Errors raised by [`ServerSupervisor`].
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The binary is not on `PATH` (or the explicit path does not exist).
    #[error("{binary} not found on PATH; install llama.cpp or pass an explicit path")]
    BinaryNotFound { binary: String },

    #[error("Server is already running (pid {pid:?})")]
    AlreadyRunning { pid: Option<u32> },

    /// Spawning failed. Not retried.
    #[error("Failed to spawn {}: {source}", .binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to stop server: {0}")]
    Shutdown(#[source] io::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Stopped,
    /// Spawned, not yet seen healthy.
    Starting,
    Ready,
    /// Spawn failed, or the process exited on its own.
    Failed,
}

impl ServerStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal state. The child handle only exists in states that own a process.
#[derive(Debug, Default)]
enum ProcessState {
    #[default]
    Stopped,
    Starting(Child),
    Ready(Child),
    Failed { exit: Option<ExitStatus> },
}

impl ProcessState {
    const fn status(&self) -> ServerStatus {
        match self {
            Self::Stopped => ServerStatus::Stopped,
            Self::Starting(_) => ServerStatus::Starting,
            Self::Ready(_) => ServerStatus::Ready,
            Self::Failed { .. } => ServerStatus::Failed,
        }
    }

    const fn child(&self) -> Option<&Child> {
        match self {
            Self::Starting(child) | Self::Ready(child) => Some(child),
            Self::Stopped | Self::Failed { .. } => None,
        }
    }

    fn child_mut(&mut self) -> Option<&mut Child> {
        match self {
            Self::Starting(child) | Self::Ready(child) => Some(child),
            Self::Stopped | Self::Failed { .. } => None,
        }
    }

    fn take_child(&mut self) -> Option<Child> {
        match std::mem::take(self) {
            Self::Starting(child) | Self::Ready(child) => Some(child),
            other => {
                *self = other;
                None
            }
        }
    }
}

/// Sole owner of the llama-server child process.
///
/// The process is spawned detached in its own process group with stdio
/// silenced, so it outlives the supervisor unless stopped explicitly.
#[derive(Debug)]
pub struct ServerSupervisor {
    launch: ServerLaunch,
    transport: Transport,
    state: ProcessState,
}

impl ServerSupervisor {
    /// Supervisor with a transport pointed at the launch's host and port.
    pub fn new(launch: ServerLaunch) -> Result<Self, SupervisorError> {
        let transport = Transport::new(launch.endpoint())?;
        Ok(Self::with_transport(launch, transport))
    }

    /// Supervisor probing health through an existing transport.
    #[must_use]
    pub fn with_transport(launch: ServerLaunch, transport: Transport) -> Self {
        Self {
            launch,
            transport,
            state: ProcessState::Stopped,
        }
    }

    #[must_use]
    pub const fn transport(&self) -> &Transport {
        &self.transport
    }

    #[must_use]
    pub const fn launch_config(&self) -> &ServerLaunch {
        &self.launch
    }

    /// Pid of the owned process, if any.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.state.child().and_then(Child::id)
    }

    /// Exit status of a process that died on its own.
    #[must_use]
    pub const fn exit_status(&self) -> Option<ExitStatus> {
        match self.state {
            ProcessState::Failed { exit } => exit,
            _ => None,
        }
    }

    /// Current state. Reaps the child first if it exited on its own.
    pub fn status(&mut self) -> ServerStatus {
        self.reap();
        self.state.status()
    }

    /// Whether a live process is owned.
    pub fn is_running(&mut self) -> bool {
        matches!(
            self.status(),
            ServerStatus::Starting | ServerStatus::Ready
        )
    }

    /// Spawn the server and return immediately.
    ///
    /// Fails without spawning when the binary cannot be found or a process
    /// is already owned.
    pub fn start(&mut self) -> Result<(), SupervisorError> {
        if self.is_running() {
            return Err(SupervisorError::AlreadyRunning { pid: self.pid() });
        }

        let binary = self
            .launch
            .resolve_binary()
            .ok_or_else(|| SupervisorError::BinaryNotFound {
                binary: self.launch.binary_name().to_string(),
            })?;
        let args = self.launch.args();
        debug!(binary = %binary.display(), ?args, "Spawning llama-server");

        let mut command = Command::new(&binary);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        #[cfg(unix)]
        command.process_group(0);

        match command.spawn() {
            Ok(child) => {
                info!(pid = ?child.id(), port = self.launch.port_number(), "llama-server started");
                self.state = ProcessState::Starting(child);
                Ok(())
            }
            Err(source) => {
                warn!(binary = %binary.display(), error = %source, "Failed to spawn llama-server");
                self.state = ProcessState::Failed { exit: None };
                Err(SupervisorError::Spawn { binary, source })
            }
        }
    }

    /// Poll `/health` until healthy or `timeout` elapses.
    ///
    /// On timeout the process is left running; the caller decides whether
    /// to kill it. Without an owned process this simply reports whether a
    /// server is answering at the endpoint.
    pub async fn await_ready(&mut self, timeout: Duration) -> bool {
        self.reap();
        if self.state.status() == ServerStatus::Failed {
            return false;
        }

        let wait = wait_for_health(&self.transport, DEFAULT_POLL_INTERVAL, timeout).await;
        self.reap();

        if wait.ready {
            self.state = match std::mem::take(&mut self.state) {
                ProcessState::Starting(child) => ProcessState::Ready(child),
                other => other,
            };
        }
        wait.ready && self.state.status() != ServerStatus::Failed
    }

    /// Start and wait for readiness; stop the process if it never becomes ready.
    pub async fn launch(&mut self, timeout: Duration) -> Result<bool, SupervisorError> {
        self.start()?;
        if self.await_ready(timeout).await {
            return Ok(true);
        }
        warn!(?timeout, "llama-server not ready in time, stopping it");
        self.stop().await?;
        Ok(false)
    }

    /// Stop the owned process (if any), then launch with a new configuration.
    pub async fn restart(
        &mut self,
        launch: ServerLaunch,
        timeout: Duration,
    ) -> Result<bool, SupervisorError> {
        self.stop().await?;
        self.transport.update_endpoint(|endpoint| {
            let target = launch.endpoint();
            endpoint.host = target.host;
            endpoint.port = target.port;
        });
        self.launch = launch;
        self.launch(timeout).await
    }

    /// Terminate gracefully. Returns `false` when nothing was owned.
    pub async fn stop(&mut self) -> Result<bool, SupervisorError> {
        let Some(mut child) = self.state.take_child() else {
            return Ok(false);
        };
        let pid = child.id();
        let status = shutdown::terminate(&mut child, GRACE_PERIOD)
            .await
            .map_err(SupervisorError::Shutdown)?;
        info!(?pid, %status, "llama-server stopped");
        Ok(true)
    }

    /// Kill immediately. Returns `false` when nothing was owned.
    pub async fn kill(&mut self) -> Result<bool, SupervisorError> {
        let Some(mut child) = self.state.take_child() else {
            return Ok(false);
        };
        let pid = child.id();
        let status = shutdown::kill(&mut child)
            .await
            .map_err(SupervisorError::Shutdown)?;
        info!(?pid, %status, "llama-server killed");
        Ok(true)
    }

    /// Move to `Failed` if the owned process has exited.
    fn reap(&mut self) {
        let Some(child) = self.state.child_mut() else {
            return;
        };
        match child.try_wait() {
            Ok(Some(exit)) => {
                warn!(%exit, "llama-server exited on its own");
                self.state = ProcessState::Failed { exit: Some(exit) };
            }
            Ok(None) => {}
            Err(e) => debug!(error = %e, "Could not poll llama-server process"),
        }
    }
}
