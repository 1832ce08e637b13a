//! llama-server launch configuration and argv rendering.

use std::path::PathBuf;
use std::time::Duration;

use llamalink_core::Endpoint;
use llamalink_core::endpoint::{DEFAULT_HOST, DEFAULT_PORT};

/// Name of the server binary looked up on `PATH`.
pub const DEFAULT_BINARY: &str = "llama-server";

/// Default time to wait for the server to become healthy after spawning.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(60);

/// Value of a launch flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    /// `true` renders `--flag`, `false` renders nothing.
    Switch(bool),
    /// Renders `--flag value`.
    Value(String),
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        Self::Switch(value)
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

macro_rules! flag_value_from_display {
    ($($ty:ty),*) => {
        $(impl From<$ty> for FlagValue {
            fn from(value: $ty) -> Self {
                Self::Value(value.to_string())
            }
        })*
    };
}

flag_value_from_display!(u16, u32, u64, i32, i64, f32, f64);

/// Everything needed to spawn llama-server.
///
/// Flags keep insertion order. Keys are written without the leading `--`;
/// `host` and `port` are owned by the launch itself and ignored in the map.
///
/// ```rust,ignore
/// let launch = ServerLaunch::new()
///     .port(8081)
///     .flag("models-dir", "/srv/models")
///     .flag("metrics", true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLaunch {
    binary: String,
    host: String,
    port: u16,
    flags: Vec<(String, FlagValue)>,
}

impl Default for ServerLaunch {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerLaunch {
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            flags: Vec::new(),
        }
    }

    /// Binary name or path. Bare names are resolved on `PATH`.
    #[must_use]
    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set a flag. Setting the same key twice replaces the earlier value in place.
    #[must_use]
    pub fn flag(mut self, key: impl Into<String>, value: impl Into<FlagValue>) -> Self {
        let key = key.into().trim_start_matches('-').to_string();
        let value = value.into();
        match self.flags.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.flags.push((key, value)),
        }
        self
    }

    #[must_use]
    pub fn binary_name(&self) -> &str {
        &self.binary
    }

    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub const fn port_number(&self) -> u16 {
        self.port
    }

    /// Locate the binary: an explicit path is used as-is when it exists,
    /// a bare name is searched on `PATH`.
    pub fn resolve_binary(&self) -> Option<PathBuf> {
        which::which(&self.binary).ok()
    }

    /// Arguments after the program name: `--host`, `--port`, then each flag.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--host".to_string(),
            self.host.clone(),
            "--port".to_string(),
            self.port.to_string(),
        ];

        for (key, value) in &self.flags {
            if key == "host" || key == "port" {
                continue;
            }
            match value {
                FlagValue::Switch(true) => args.push(format!("--{key}")),
                FlagValue::Switch(false) => {}
                FlagValue::Value(v) => {
                    args.push(format!("--{key}"));
                    args.push(v.clone());
                }
            }
        }

        args
    }

    /// Endpoint a client should use to reach this server.
    ///
    /// A wildcard bind address is reached through loopback.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        let mut endpoint = Endpoint::local(self.port);
        if !matches!(self.host.as_str(), "0.0.0.0" | "::" | "") {
            endpoint.host.clone_from(&self.host);
        }
        endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_and_port_come_first() {
        let args = ServerLaunch::new().port(9000).args();
        assert_eq!(args, vec!["--host", "127.0.0.1", "--port", "9000"]);
    }

    #[test]
    fn test_flag_rendering() {
        let args = ServerLaunch::new()
            .flag("models-dir", "/srv/models")
            .flag("metrics", true)
            .flag("no-webui", false)
            .flag("ctx-size", 8192u32)
            .args();

        assert_eq!(
            &args[4..],
            &[
                "--models-dir",
                "/srv/models",
                "--metrics",
                "--ctx-size",
                "8192"
            ]
        );
    }

    #[test]
    fn test_host_and_port_keys_are_ignored() {
        let args = ServerLaunch::new()
            .port(8081)
            .flag("port", 1234u16)
            .flag("--host", "10.0.0.1")
            .args();
        assert_eq!(args, vec!["--host", "127.0.0.1", "--port", "8081"]);
    }

    #[test]
    fn test_repeated_flag_replaces_value() {
        let args = ServerLaunch::new()
            .flag("threads", 4u32)
            .flag("metrics", true)
            .flag("threads", 8u32)
            .args();
        assert_eq!(&args[4..], &["--threads", "8", "--metrics"]);
    }

    #[test]
    fn test_endpoint_for_wildcard_bind() {
        let launch = ServerLaunch::new().host("0.0.0.0").port(8090);
        assert_eq!(launch.endpoint().base_url(), "http://127.0.0.1:8090");

        let launch = ServerLaunch::new().host("localhost").port(8090);
        assert_eq!(launch.endpoint().base_url(), "http://localhost:8090");
    }

    #[test]
    fn test_missing_binary_does_not_resolve() {
        let launch = ServerLaunch::new().binary("llamalink-no-such-binary-x9");
        assert!(launch.resolve_binary().is_none());
    }
}
