//! Subcommands and their arguments.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use llamalink_runtime::server::{DEFAULT_BINARY, DEFAULT_STARTUP_TIMEOUT};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch llama-server and supervise it until Ctrl+C
    Serve(ServeArgs),

    /// Probe the server's health
    Health {
        /// Keep polling for up to this many seconds
        #[arg(long)]
        wait: Option<u64>,
    },

    /// Inspect and control models in router mode
    Models {
        #[command(subcommand)]
        command: ModelsCommand,
    },

    /// Show server properties (/props)
    Props,

    /// Show decoded Prometheus metrics (requires --metrics on the server)
    Metrics,

    /// Tokenize text
    Tokenize {
        text: String,
        /// Include the text piece of each token
        #[arg(long)]
        pieces: bool,
        /// Do not insert special tokens (BOS)
        #[arg(long)]
        no_special: bool,
    },

    /// Convert token ids back to text
    Detokenize {
        #[arg(required = true)]
        tokens: Vec<i64>,
    },

    /// Compute embeddings for one or more inputs
    Embed {
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// Send one chat turn and render the response
    Chat(ChatArgs),
}

#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// List model ids known to the router
    List,
    /// Show the status of every model
    Status,
    /// Load a model and wait until it is loaded
    Load {
        id: String,
        /// Give up after this many seconds
        #[arg(long)]
        wait_timeout: Option<u64>,
    },
    /// Unload a model and wait until it is unloaded
    Unload {
        id: String,
        /// Give up after this many seconds
        #[arg(long)]
        wait_timeout: Option<u64>,
    },
    /// Show the launch arguments of a model (or all models)
    Args { id: Option<String> },
    /// Show the preset of a model (or all models)
    Preset { id: Option<String> },
    /// Show path and GGUF metadata of a served model
    Info {
        /// Position in the `/v1/models` listing
        #[arg(long, default_value_t = 0)]
        slot: usize,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// llama-server binary name or path
    #[arg(long, env = "LLAMA_SERVER_BIN", default_value = DEFAULT_BINARY)]
    pub binary: String,

    /// Interface to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// GGUF model file to serve (omit for router mode)
    #[arg(long = "gguf")]
    pub model_path: Option<PathBuf>,

    /// Directory of models for router mode
    #[arg(long)]
    pub models_dir: Option<PathBuf>,

    /// Context size
    #[arg(short = 'c', long)]
    pub ctx_size: Option<u32>,

    /// Extra llama-server flag, as NAME or NAME=VALUE (repeatable)
    #[arg(long = "flag", value_name = "NAME[=VALUE]")]
    pub flags: Vec<String>,

    /// Seconds to wait for the server to become healthy
    #[arg(long, default_value_t = DEFAULT_STARTUP_TIMEOUT.as_secs())]
    pub startup_timeout: u64,
}

#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    /// User message
    pub prompt: String,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Wait for the full response instead of streaming
    #[arg(long)]
    pub no_stream: bool,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,

    #[arg(long)]
    pub top_p: Option<f32>,

    /// Maximum tokens to generate (-1 for unlimited)
    #[arg(long)]
    pub max_tokens: Option<i32>,

    #[arg(long)]
    pub seed: Option<i64>,

    /// Stop sequence (repeatable)
    #[arg(long)]
    pub stop: Vec<String>,

    /// JSON file with an array of tool definitions
    #[arg(long)]
    pub tools: Option<PathBuf>,

    /// Complete tool calls on balanced braces instead of a trailing `}`
    #[arg(long)]
    pub balanced_braces: bool,

    /// Treat `<think>...</think>` in content as reasoning
    /// (servers started with `--reasoning-format none`)
    #[arg(long)]
    pub think_tags: bool,

    /// Print the assembled turn as JSON after streaming
    #[arg(long)]
    pub json: bool,
}
