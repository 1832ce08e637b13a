//! Health command handler.

use std::time::Duration;

use llamalink_runtime::HealthStatus;
use llamalink_runtime::health::{DEFAULT_POLL_INTERVAL, probe, wait_for_health};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Probe once, or poll for up to `wait` seconds. Prints the health body and
/// fails with an "unavailable" exit code when the server is not healthy.
pub async fn execute(ctx: &CliContext, wait: Option<u64>) -> Result<(), CliError> {
    let transport = ctx.transport()?;
    let status = match wait {
        Some(secs) => {
            let outcome =
                wait_for_health(&transport, DEFAULT_POLL_INTERVAL, Duration::from_secs(secs))
                    .await;
            outcome.last
        }
        None => probe(&transport).await,
    };

    println!("{}", serde_json::to_string_pretty(&status.to_body())?);
    match status {
        HealthStatus::Healthy => Ok(()),
        HealthStatus::Unhealthy { message, .. } | HealthStatus::Unavailable { message } => {
            Err(CliError::Unavailable(message))
        }
    }
}
