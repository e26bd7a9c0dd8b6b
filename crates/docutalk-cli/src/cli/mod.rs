//! CLI command definitions for the `docutalk` binary.

pub mod bots;
pub mod chat;
pub mod create;
pub mod credits;
pub mod format;
pub mod login;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat with chatbots built from your documents.
#[derive(Parser)]
#[command(name = "docutalk", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat with one of your chatbots.
    Chat {
        /// Chatbot id or title. Prompts for a choice when omitted.
        chatbot: Option<String>,

        /// Ask with the premium model.
        #[arg(long)]
        premium: bool,
    },

    /// Create a chatbot from PDF documents.
    Create {
        /// PDF files to upload.
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,

        /// Build with the premium model.
        #[arg(long)]
        premium: bool,

        /// Skip the confirmation prompt after the estimate.
        #[arg(short, long)]
        yes: bool,

        /// Write the generated icon to this file.
        #[arg(long)]
        icon_out: Option<PathBuf>,
    },

    /// List the chatbots you have access to.
    #[command(alias = "ls")]
    Bots,

    /// Show remaining credits for the current period.
    Credits,

    /// Save a bearer token to the data directory.
    Login,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
