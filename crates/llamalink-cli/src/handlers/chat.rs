//! Chat command handler: one turn, streamed and rendered as events.

use futures_util::StreamExt;
use llamalink_core::{
    ChatMessage, SamplingParams, StreamClassifier, ToolCallBoundary, TurnAssembler,
    validate_settings,
};
use llamalink_runtime::Generation;
use serde_json::Value;
use tracing::debug;

use crate::bootstrap::CliContext;
use crate::commands::ChatArgs;
use crate::error::CliError;
use crate::presentation::EventRenderer;

pub async fn execute(ctx: &CliContext, args: ChatArgs) -> Result<(), CliError> {
    let mut api = ctx.api()?;
    let mut sampling = sampling_from(&args);
    sampling.merge_with(&api.settings().sampling);
    api.settings_mut().sampling = sampling;
    validate_settings(api.settings())?;

    let tools = match &args.tools {
        Some(path) => Some(load_tools(&std::fs::read_to_string(path)?)?),
        None => None,
    };
    let messages = build_messages(&args);

    if args.no_stream {
        api.settings_mut().stream = Some(false);
        let Generation::Complete(body) = api.chat_completion(&messages, tools).await? else {
            return Err(CliError::Protocol(
                "expected a complete response".to_string(),
            ));
        };
        print_complete(&body, args.json)?;
        return Ok(());
    }

    let boundary = if args.balanced_braces {
        ToolCallBoundary::BalancedBraces
    } else {
        ToolCallBoundary::TrailingBrace
    };
    let mut classifier = StreamClassifier::with_boundary(boundary);
    if args.think_tags {
        classifier = classifier.with_think_tags();
    }
    let mut events = api.chat_events(&messages, tools, classifier).await?;

    let mut renderer = EventRenderer::terminal();
    let mut assembler = TurnAssembler::new();
    while let Some(event) = events.next().await {
        let event = event?;
        renderer.render(&event)?;
        assembler.push(&event);
    }
    renderer.finish()?;

    let turn = assembler.finish();
    debug!(
        content = turn.content.as_ref().map_or(0, String::len),
        tool_calls = turn.tool_calls.len(),
        "Turn complete"
    );
    if args.json {
        println!("{}", serde_json::to_string_pretty(&turn.messages())?);
    }
    Ok(())
}

fn sampling_from(args: &ChatArgs) -> SamplingParams {
    SamplingParams {
        temperature: args.temperature,
        top_p: args.top_p,
        max_tokens: args.max_tokens,
        seed: args.seed,
        stop: args.stop.clone(),
        ..SamplingParams::default()
    }
}

fn build_messages(args: &ChatArgs) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &args.system {
        messages.push(ChatMessage::system(system.as_str()));
    }
    messages.push(ChatMessage::user(args.prompt.as_str()));
    messages
}

/// A tools file holds a JSON array of OpenAI-style tool definitions.
fn load_tools(raw: &str) -> Result<Vec<Value>, CliError> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Array(tools) => Ok(tools),
        _ => Err(CliError::Arguments(
            "tools file must contain a JSON array".to_string(),
        )),
    }
}

fn print_complete(body: &Value, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(body)?);
        return Ok(());
    }
    let message = &body["choices"][0]["message"];
    if let Some(content) = message["content"].as_str() {
        println!("{content}");
    }
    if let Some(calls) = message["tool_calls"].as_array() {
        for call in calls {
            println!(
                "[tool call] {}({})",
                call["function"]["name"].as_str().unwrap_or("?"),
                call["function"]["arguments"].as_str().unwrap_or("")
            );
        }
    }
    Ok(())
}
