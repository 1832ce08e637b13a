//! Router-mode model commands.

use std::collections::BTreeMap;
use std::time::Duration;

use llamalink_core::ModelRecord;
use llamalink_runtime::{ModelRouter, TransitionOutcome, TransitionProgress};

use crate::bootstrap::CliContext;
use crate::commands::ModelsCommand;
use crate::error::CliError;
use crate::presentation::{format_optional, print_separator, truncate_string};

pub async fn execute(ctx: &CliContext, command: ModelsCommand) -> Result<(), CliError> {
    match command {
        ModelsCommand::List => list(&ctx.router(None)?).await,
        ModelsCommand::Status => status(&ctx.router(None)?).await,
        ModelsCommand::Load { id, wait_timeout } => {
            let router = ctx.router(wait_timeout.map(Duration::from_secs))?;
            println!("Loading {id}...");
            let outcome = router.load_with_progress(&id, print_progress).await?;
            report(&id, "loaded", &outcome)
        }
        ModelsCommand::Unload { id, wait_timeout } => {
            let router = ctx.router(wait_timeout.map(Duration::from_secs))?;
            println!("Unloading {id}...");
            let outcome = router.unload_with_progress(&id, print_progress).await?;
            report(&id, "unloaded", &outcome)
        }
        ModelsCommand::Args { id } => {
            let args = ctx.router(None)?.args_by_id().await?;
            for (model, argv) in select(args, id.as_deref())? {
                println!("{model}: {}", argv.join(" "));
            }
            Ok(())
        }
        ModelsCommand::Preset { id } => {
            let presets = ctx.router(None)?.presets_by_id().await?;
            for (model, preset) in select(presets, id.as_deref())? {
                let preset = if preset.is_empty() { "--" } else { &preset };
                println!("{model}: {preset}");
            }
            Ok(())
        }
        ModelsCommand::Info { slot } => {
            let record = ctx.api()?.model_record(slot).await?;
            print_info(&record);
            Ok(())
        }
    }
}

fn print_info(record: &ModelRecord) {
    for (label, value) in info_rows(record) {
        println!("{label:<14} {value}");
    }
}

fn info_rows(record: &ModelRecord) -> Vec<(&'static str, String)> {
    vec![
        ("Model name", format_optional(record.model_name().as_ref(), "--")),
        ("Model path", record.model_path().display().to_string()),
        ("Vocab size", format_optional(record.vocab_size().as_ref(), "--")),
        ("Max seq len", format_optional(record.max_seq_len().as_ref(), "--")),
        ("Max embed len", format_optional(record.max_embed_len().as_ref(), "--")),
    ]
}

async fn list(router: &ModelRouter) -> Result<(), CliError> {
    let ids = router.list_ids().await?;
    if ids.is_empty() {
        println!("No models known to the server.");
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}

async fn status(router: &ModelRouter) -> Result<(), CliError> {
    let records = router.records().await?;
    if records.is_empty() {
        println!("No models known to the server.");
        return Ok(());
    }

    println!("{:<40} {:<10} Path", "Model", "Status");
    print_separator(90);
    for record in records {
        let status = if record.status.failed {
            format!("{} (failed)", record.status.value)
        } else {
            record.status.value.to_string()
        };
        println!(
            "{:<40} {:<10} {}",
            truncate_string(&record.id, 39),
            status,
            record.path.as_deref().unwrap_or("--")
        );
    }
    Ok(())
}

fn print_progress(progress: TransitionProgress) {
    println!(
        "  {} ({:.1}s, poll {})",
        progress.status,
        progress.elapsed.as_secs_f64(),
        progress.polls
    );
}

fn report(id: &str, target: &str, outcome: &TransitionOutcome) -> Result<(), CliError> {
    match outcome {
        TransitionOutcome::AlreadyInState(_) => {
            println!("{id} is already {target}");
            Ok(())
        }
        TransitionOutcome::Reached { waited, .. } => {
            println!("{id} {target} in {:.1}s", waited.as_secs_f64());
            Ok(())
        }
        TransitionOutcome::NotAcknowledged(body) => Err(CliError::Server(format!(
            "Server did not accept the request for {id}: {body}"
        ))),
    }
}

/// Narrow a per-model map to one id, or keep all of it.
fn select<V>(
    mut map: BTreeMap<String, V>,
    id: Option<&str>,
) -> Result<BTreeMap<String, V>, CliError> {
    let Some(id) = id else {
        return Ok(map);
    };
    match map.remove(id) {
        Some(value) => Ok(BTreeMap::from([(id.to_string(), value)])),
        None => Err(CliError::Arguments(format!(
            "Unknown model '{id}'. Available: {}",
            map.keys().cloned().collect::<Vec<_>>().join(", ")
        ))),
    }
}
