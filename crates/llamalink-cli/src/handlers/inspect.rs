//! Read-only server queries: props, metrics, tokenize, detokenize, embed.

use llamalink_runtime::Token;
use serde_json::Value;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::format_optional;

pub async fn props(ctx: &CliContext) -> Result<(), CliError> {
    let props = ctx.api()?.props(ctx.settings.model.as_deref()).await?;
    println!(
        "Model:        {}",
        format_optional(props.model_path.as_ref(), "--")
    );
    println!("Context size: {}", format_optional(props.n_ctx.as_ref(), "--"));
    println!("Sleeping:     {}", props.is_sleeping);
    if let Some(template) = props.chat_template.as_deref() {
        println!("Chat template:\n{template}");
    }
    Ok(())
}

pub async fn metrics(ctx: &CliContext) -> Result<(), CliError> {
    let metrics = ctx.api()?.metrics(ctx.settings.model.as_deref()).await?;
    if metrics.is_empty() {
        println!("No metrics reported. Is the server running with --metrics?");
        return Ok(());
    }
    for (name, value) in metrics.iter() {
        match value.labels() {
            Some(labels) if !labels.is_empty() => {
                let rendered: Vec<String> = labels.iter().map(|(k, v)| format!("{k}={v}")).collect();
                println!("{name}{{{}}} {}", rendered.join(","), value.value());
            }
            _ => println!("{name} {}", value.value()),
        }
    }
    Ok(())
}

pub async fn tokenize(
    ctx: &CliContext,
    text: &str,
    pieces: bool,
    no_special: bool,
) -> Result<(), CliError> {
    let tokens = ctx.api()?.tokenize(text, !no_special, pieces).await?;
    for token in &tokens {
        match token {
            Token::Id(id) => println!("{id}"),
            Token::WithPiece { id, piece } => println!("{id}\t{}", render_piece(piece)),
        }
    }
    Ok(())
}

pub async fn detokenize(ctx: &CliContext, ids: Vec<i64>) -> Result<(), CliError> {
    let tokens: Vec<Token> = ids.into_iter().map(Token::Id).collect();
    println!("{}", ctx.api()?.detokenize(&tokens).await?);
    Ok(())
}

pub async fn embed(ctx: &CliContext, inputs: &[String]) -> Result<(), CliError> {
    let response = ctx.api()?.embeddings(inputs).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Pieces are strings, or byte arrays when not valid UTF-8.
fn render_piece(piece: &Value) -> String {
    match piece {
        Value::String(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}
