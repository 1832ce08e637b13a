//! Serve command handler.
//!
//! Launches llama-server, waits for it to become healthy, then keeps it
//! running until Ctrl+C.

use std::time::Duration;

use llamalink_runtime::{FlagValue, ServerLaunch, ServerSupervisor};
use tracing::{info, warn};

use crate::commands::ServeArgs;
use crate::error::CliError;

pub async fn execute(args: ServeArgs) -> Result<(), CliError> {
    let launch = build_launch(&args)?;
    let mut supervisor = ServerSupervisor::new(launch)?;
    let timeout = Duration::from_secs(args.startup_timeout);

    println!(
        "Starting {} on {}:{}",
        args.binary, args.host, args.port
    );
    if !supervisor.launch(timeout).await? {
        return Err(CliError::Unavailable(format!(
            "llama-server did not become healthy within {}s",
            args.startup_timeout
        )));
    }
    println!(
        "Server ready at {}. Press Ctrl+C to stop.",
        supervisor.transport().endpoint().base_url()
    );

    let interrupted = tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            true
        }
        () = watch_exit(&mut supervisor) => false,
    };

    if interrupted {
        info!("Interrupted, stopping llama-server");
        supervisor.stop().await?;
        println!("Server stopped.");
        Ok(())
    } else {
        let code = supervisor.exit_status().and_then(|s| s.code());
        warn!(?code, "llama-server exited unexpectedly");
        Err(CliError::Process(format!(
            "llama-server exited unexpectedly (code {})",
            code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
        )))
    }
}

/// Resolves once the supervised process is no longer running.
async fn watch_exit(supervisor: &mut ServerSupervisor) {
    while supervisor.is_running() {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

fn build_launch(args: &ServeArgs) -> Result<ServerLaunch, CliError> {
    let mut launch = ServerLaunch::new()
        .binary(args.binary.as_str())
        .host(args.host.as_str())
        .port(args.port);

    if let Some(path) = &args.model_path {
        launch = launch.flag("model", path.to_string_lossy().into_owned());
    }
    if let Some(dir) = &args.models_dir {
        launch = launch.flag("models-dir", dir.to_string_lossy().into_owned());
    }
    if let Some(ctx_size) = args.ctx_size {
        launch = launch.flag("ctx-size", ctx_size);
    }
    for raw in &args.flags {
        let (name, value) = parse_flag(raw)?;
        launch = launch.flag(name, value);
    }
    Ok(launch)
}

/// `NAME` is a switch; `NAME=VALUE` carries a value. Leading dashes are allowed.
fn parse_flag(raw: &str) -> Result<(String, FlagValue), CliError> {
    let (name, value) = match raw.split_once('=') {
        Some((name, value)) => (name, FlagValue::from(value)),
        None => (raw, FlagValue::Switch(true)),
    };
    let name = name.trim().trim_start_matches('-');
    if name.is_empty() {
        return Err(CliError::Arguments(format!("Invalid flag '{raw}'")));
    }
    Ok((name.to_string(), value))
}
