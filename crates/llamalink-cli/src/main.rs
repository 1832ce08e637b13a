//! CLI entry point - the composition root.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use llamalink_cli::{Cli, CliError, Commands, bootstrap, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap reads env fallbacks
    dotenvy::dotenv().ok();

    let mut cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command.take() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    if let Err(err) = dispatch(&cli, command).await {
        tracing::debug!(error = ?err, "Command failed");
        eprintln!("Error: {err}");
        std::process::exit(err.exit_code());
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: &Cli, command: Commands) -> Result<(), CliError> {
    let ctx = || bootstrap(cli);
    match command {
        // `serve` talks to the process it spawns, not to --base-url
        Commands::Serve(args) => handlers::serve::execute(args).await,
        Commands::Health { wait } => handlers::health::execute(&ctx()?, wait).await,
        Commands::Models { command } => handlers::models::execute(&ctx()?, command).await,
        Commands::Props => handlers::inspect::props(&ctx()?).await,
        Commands::Metrics => handlers::inspect::metrics(&ctx()?).await,
        Commands::Tokenize {
            text,
            pieces,
            no_special,
        } => handlers::inspect::tokenize(&ctx()?, &text, pieces, no_special).await,
        Commands::Detokenize { tokens } => handlers::inspect::detokenize(&ctx()?, tokens).await,
        Commands::Embed { inputs } => handlers::inspect::embed(&ctx()?, &inputs).await,
        Commands::Chat(args) => handlers::chat::execute(&ctx()?, args).await,
    }
}
