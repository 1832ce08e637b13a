//! CLI bootstrap: turns global arguments into configured clients.

use std::time::Duration;

use llamalink_core::{ClientSettings, Endpoint, validate_settings};
use llamalink_runtime::{LlamaApi, ModelRouter, PollOptions, Transport};

use crate::error::CliError;
use crate::parser::Cli;

/// Resolved configuration shared by all handlers.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub endpoint: Endpoint,
    pub settings: ClientSettings,
}

impl CliContext {
    pub fn transport(&self) -> Result<Transport, CliError> {
        Ok(Transport::new(self.endpoint.clone())?)
    }

    pub fn api(&self) -> Result<LlamaApi, CliError> {
        Ok(LlamaApi::new(self.transport()?, self.settings.clone()))
    }

    /// Router client; `wait_timeout` bounds load/unload polling.
    pub fn router(&self, wait_timeout: Option<Duration>) -> Result<ModelRouter, CliError> {
        let mut poll = PollOptions::default();
        if let Some(limit) = wait_timeout {
            poll = poll.with_timeout(limit);
        }
        Ok(ModelRouter::new(self.transport()?).with_poll_options(poll))
    }
}

/// Build the context from parsed arguments (which already include the
/// `OPENAI_BASE_URL` / `OPENAI_API_KEY` environment fallbacks).
pub fn bootstrap(cli: &Cli) -> Result<CliContext, CliError> {
    let mut endpoint = Endpoint::from_env_values(cli.base_url.as_deref(), cli.api_key.as_deref())?;
    if let Some(secs) = cli.timeout {
        endpoint = endpoint.with_timeout(Duration::from_secs(secs));
    }

    let mut settings = ClientSettings::with_defaults();
    settings.model.clone_from(&cli.model);
    validate_settings(&settings)?;

    tracing::debug!(url = %endpoint.base_url(), auth = endpoint.has_bearer(), "Resolved endpoint");
    Ok(CliContext { endpoint, settings })
}
