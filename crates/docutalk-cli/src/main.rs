//! DocuTalk command-line client.
//!
//! Binary name: `docutalk`
//!
//! Parses CLI arguments, sets up tracing, resolves the data directory,
//! configuration and bearer token, then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use docutalk_observe::tracing_setup::{init_tracing, shutdown_tracing, LogFormat, TracingOptions};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,docutalk=debug",
        _ => "trace",
    };
    init_tracing(&TracingOptions {
        default_filter: filter.to_string(),
        format: if cli.json { LogFormat::Json } else { LogFormat::Pretty },
        enable_otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Completions and login don't need a token
    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(*shell, &mut cmd, "docutalk", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Login => return cli::login::login(cli.json).await,
        _ => {}
    }

    let state = AppState::init().await?;

    match cli.command {
        Commands::Chat { chatbot, premium } => {
            cli::chat::loop_runner::run_chat_loop(&state, chatbot.as_deref(), premium).await?;
        }
        Commands::Create {
            files,
            premium,
            yes,
            icon_out,
        } => {
            cli::create::create_chatbot(&state, &files, premium, yes, icon_out.as_deref(), cli.json)
                .await?;
        }
        Commands::Bots => cli::bots::list_bots(&state, cli.json).await?,
        Commands::Credits => cli::credits::show_credits(&state, cli.json).await?,
        Commands::Completions { .. } | Commands::Login => unreachable!("handled above"),
    }

    Ok(())
}
