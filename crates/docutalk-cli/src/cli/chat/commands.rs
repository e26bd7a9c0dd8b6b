//! Slash command parsing for the chat loop.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    Help,
    /// Clear the terminal screen.
    Clear,
    Exit,
    /// Forget the conversation and start over with the welcome message.
    New,
    /// Show the transcript of the current conversation.
    History,
    /// Ask which documents the last reply came from.
    Sources,
    Credits,
    /// Switch between the standard and premium model.
    Premium,
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let cmd = trimmed
        .split_whitespace()
        .next()
        .unwrap_or(trimmed)
        .to_lowercase();

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/new" | "/reset" => Some(ChatCommand::New),
        "/history" => Some(ChatCommand::History),
        "/sources" | "/src" => Some(ChatCommand::Sources),
        "/credits" => Some(ChatCommand::Credits),
        "/premium" => Some(ChatCommand::Premium),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// Print the help text listing all available commands.
pub fn print_help() {
    let rows = [
        ("/help", "Show this help message"),
        ("/clear", "Clear the screen"),
        ("/new", "Start a new conversation"),
        ("/history", "Show this conversation"),
        ("/sources", "Identify the sources of the last answer"),
        ("/credits", "Show remaining credits"),
        ("/premium", "Toggle the premium model"),
        ("/exit", "End the chat session"),
    ];

    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    for (name, help) in rows {
        println!("  {:<10} {help}", style(name).cyan());
    }
    println!();
    println!("  {}", style("Ctrl+D to exit").dim());
    println!();
}
