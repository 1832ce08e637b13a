//! Root CLI structure with global options.

use clap::Parser;

use crate::commands::Commands;

/// Client for a local OpenAI-compatible llama-server.
#[derive(Parser, Debug)]
#[command(name = "llamalink")]
#[command(about = "Run and talk to a local llama-server")]
#[command(version)]
pub struct Cli {
    /// Server base URL (default: http://127.0.0.1:8080)
    #[arg(long = "base-url", env = "OPENAI_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// API key sent as a bearer token
    #[arg(
        long = "api-key",
        env = "OPENAI_API_KEY",
        global = true,
        hide_env_values = true
    )]
    pub api_key: Option<String>,

    /// Timeout for non-streaming requests, in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Model identifier sent with requests (router mode)
    #[arg(short = 'm', long = "model", global = true)]
    pub model: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
