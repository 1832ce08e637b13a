//! CLI error type and exit-code mapping.

use llamalink_core::{EndpointError, SettingsError};
use llamalink_runtime::{RouterError, SupervisorError, TransportError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Bad arguments or a request the server API does not allow.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Nothing is listening, or the server is not ready.
    #[error("Server unavailable: {0}")]
    Unavailable(String),

    /// The server answered with an error status.
    #[error("{0}")]
    Server(String),

    /// The server answered with something we could not decode.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl CliError {
    /// Exit code following sysexits.h where a category fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Server(_) => 1,
            Self::Arguments(_) => 2,    // EX_USAGE
            Self::Unavailable(_) => 69, // EX_UNAVAILABLE
            Self::Process(_) => 71,     // EX_OSERR
            Self::Io(_) => 74,          // EX_IOERR
            Self::Protocol(_) => 76,    // EX_PROTOCOL
            Self::Config(_) => 78,      // EX_CONFIG
        }
    }
}

impl From<TransportError> for CliError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Unavailable { .. } => Self::Unavailable(err.to_string()),
            TransportError::Http { .. } | TransportError::Request(_) => {
                Self::Server(err.to_string())
            }
            TransportError::Protocol { .. }
            | TransportError::UnexpectedResponse { .. }
            | TransportError::Serialize(_) => Self::Protocol(err.to_string()),
            TransportError::StreamNotAllowed { .. } | TransportError::StreamRequired { .. } => {
                Self::Arguments(err.to_string())
            }
        }
    }
}

impl From<RouterError> for CliError {
    fn from(err: RouterError) -> Self {
        match err {
            RouterError::Transport(e) => e.into(),
            RouterError::UnknownModel { .. } => Self::Arguments(err.to_string()),
            RouterError::Timeout { .. } => Self::Unavailable(err.to_string()),
            RouterError::LoadFailed { .. } => Self::Server(err.to_string()),
        }
    }
}

impl From<SupervisorError> for CliError {
    fn from(err: SupervisorError) -> Self {
        match err {
            SupervisorError::Transport(e) => e.into(),
            SupervisorError::BinaryNotFound { .. } => Self::Config(err.to_string()),
            SupervisorError::AlreadyRunning { .. }
            | SupervisorError::Spawn { .. }
            | SupervisorError::Shutdown(_) => Self::Process(err.to_string()),
        }
    }
}

impl From<EndpointError> for CliError {
    fn from(err: EndpointError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Arguments(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}
