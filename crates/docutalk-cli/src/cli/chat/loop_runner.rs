//! Main chat loop orchestration.
//!
//! Resolves the chatbot from the user's catalog, prints the banner and
//! welcome message, then reads input until the user leaves. Each message
//! goes through `ChatService::send_message`; the reply is printed as it
//! streams in and followed by a footer with timing and credits.

use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::Result;
use console::style;
use dialoguer::Select;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use docutalk_types::account::{ChatbotSummary, UserProfile};
use docutalk_types::conversation::Author;
use docutalk_types::error::ClientError;
use docutalk_types::stream::StreamEvent;

use crate::cli::credits::ensure_credits;
use crate::cli::format::{format_duration, styled_credits, truncate};
use crate::state::{AppState, ConcreteChatService};

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::ChatRenderer;

/// Find a chatbot by id, or by title ignoring case.
pub fn find_chatbot<'a>(profile: &'a UserProfile, query: &str) -> Option<&'a ChatbotSummary> {
    profile.chatbot(query).or_else(|| {
        profile
            .chatbots
            .iter()
            .find(|c| c.title.eq_ignore_ascii_case(query))
    })
}

fn select_chatbot(profile: &UserProfile, query: Option<&str>) -> Result<ChatbotSummary> {
    if profile.chatbots.is_empty() {
        anyhow::bail!("You have no chatbots yet. Create one with: docutalk create <file.pdf>...");
    }

    if let Some(query) = query {
        return find_chatbot(profile, query)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No chatbot matches '{query}'. See: docutalk bots"));
    }

    let titles: Vec<&str> = profile.chatbots.iter().map(|c| c.title.as_str()).collect();
    let index = Select::new()
        .with_prompt("Choose a chatbot")
        .items(&titles)
        .default(0)
        .interact()?;
    Ok(profile.chatbots[index].clone())
}

fn display_name(profile: &UserProfile) -> &str {
    if !profile.friendly_name.is_empty() {
        &profile.friendly_name
    } else if !profile.first_name.is_empty() {
        &profile.first_name
    } else {
        &profile.email
    }
}

fn thinking_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Run the interactive chat loop.
pub async fn run_chat_loop(state: &AppState, chatbot: Option<&str>, premium: bool) -> Result<()> {
    let profile = state.load_account().await?;
    let chatbot = select_chatbot(&profile, chatbot)?;
    let mut premium = premium;
    let mut service = state.chat_service(&chatbot, display_name(&profile), premium);

    print_welcome_banner(&chatbot, service.model());

    let renderer = ChatRenderer::new();
    print_welcome(&renderer, &service);

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut chat_input, _writer) = ChatInput::new(prompt)
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        match chat_input.read_line().await {
            InputEvent::Eof => {
                println!("\n  {}", style("Session ended.").dim());
                break;
            }
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                continue;
            }
            InputEvent::Message(text) => {
                if text.is_empty() {
                    continue;
                }

                if let Some(cmd) = commands::parse(&text) {
                    match cmd {
                        ChatCommand::Help => commands::print_help(),
                        ChatCommand::Clear => chat_input.clear(),
                        ChatCommand::Exit => {
                            println!("\n  {}", style("Session ended.").dim());
                            break;
                        }
                        ChatCommand::New => {
                            service.clear_conversation();
                            println!();
                            println!("  {} New conversation.", style("*").cyan().bold());
                            print_welcome(&renderer, &service);
                        }
                        ChatCommand::History => print_history(&service, &chatbot),
                        ChatCommand::Sources => identify_sources(state, &renderer, &mut service, &chatbot).await,
                        ChatCommand::Credits => {
                            println!();
                            println!(
                                "  {}  {}",
                                style("Credits:").bold(),
                                styled_credits(&state.ledger.snapshot())
                            );
                            println!();
                        }
                        ChatCommand::Premium => {
                            premium = !premium;
                            service.set_model(state.model(premium));
                            println!();
                            println!(
                                "  {} Now using {}",
                                style("*").cyan().bold(),
                                style(service.model()).yellow()
                            );
                            println!();
                        }
                        ChatCommand::Unknown(name) => {
                            println!(
                                "\n  {} Unknown command: {}. Type /help for available commands.\n",
                                style("?").yellow().bold(),
                                style(name).dim()
                            );
                        }
                    }
                    continue;
                }

                if let Err(e) = ensure_credits(&state.ledger) {
                    println!("\n  {} {e}\n", style("!").yellow().bold());
                    continue;
                }

                ask(state, &renderer, &mut service, &chatbot, &text).await;
            }
        }
    }

    chat_input.flush();
    info!(
        chatbot_id = %chatbot.id,
        messages = service.transcript().messages().len(),
        "chat session ended"
    );
    Ok(())
}

fn print_welcome(renderer: &ChatRenderer, service: &ConcreteChatService) {
    if let Some(welcome) = service.transcript().messages().first() {
        println!("  {}", renderer.render_final(&welcome.text).trim());
        println!();
    }
}

/// Send one message and stream the reply to stdout.
async fn ask(
    state: &AppState,
    renderer: &ChatRenderer,
    service: &mut ConcreteChatService,
    chatbot: &ChatbotSummary,
    text: &str,
) {
    let estimate = match service.estimate_duration().await {
        Ok(secs) => format!("thinking... (about {})", format_duration(secs)),
        Err(e) => {
            debug!(error = %e, "ask estimate unavailable");
            "thinking...".to_string()
        }
    };
    let spinner = thinking_spinner(estimate);
    let started = Instant::now();
    let model = service.model().to_string();

    let mut typing = false;
    let mut failure: Option<ClientError> = None;
    {
        let stream = service.send_message(text);
        futures_util::pin_mut!(stream);
        while let Some(event) = stream.next().await {
            match event {
                Ok(StreamEvent::TextDelta { content }) => {
                    if !typing {
                        spinner.finish_and_clear();
                        typing = true;
                        print!("\n  {} ", style(&chatbot.title).cyan().bold());
                        let _ = std::io::stdout().flush();
                    }
                    renderer.print_streaming_token(&content);
                }
                Ok(StreamEvent::CreditNotice(notice)) => {
                    debug!(consumed_credits = notice.consumed_credits, "ask credits");
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
    }

    if !typing {
        spinner.finish_and_clear();
    }

    if let Some(e) = failure {
        if typing {
            println!();
        }
        eprintln!("\n  {} {e}", style("!").red().bold());
        eprintln!("  {}", style("Type a message to retry, /exit to quit.").dim());
        println!();
        return;
    }

    println!();
    renderer.print_stats_footer(started.elapsed(), &model, &state.ledger.snapshot());
    println!();
}

async fn identify_sources(
    state: &AppState,
    renderer: &ChatRenderer,
    service: &mut ConcreteChatService,
    chatbot: &ChatbotSummary,
) {
    if let Err(e) = ensure_credits(&state.ledger) {
        println!("\n  {} {e}\n", style("!").yellow().bold());
        return;
    }

    let spinner = thinking_spinner("looking up sources...".to_string());
    let result = service.identify_sources().await;
    spinner.finish_and_clear();

    match result {
        Ok(answer) => {
            println!();
            println!("  {}", style(&chatbot.title).cyan().bold());
            println!("{}", renderer.render_final(&answer.answer));
        }
        Err(ClientError::NoConversation) => {
            println!(
                "\n  {} Ask a question first, then use /sources.\n",
                style("i").blue().bold()
            );
        }
        Err(e) => {
            eprintln!("\n  {} {e}\n", style("!").red().bold());
        }
    }
}

fn print_history(service: &ConcreteChatService, chatbot: &ChatbotSummary) {
    println!();
    for message in service.transcript().messages() {
        let label = match message.author {
            Author::User => style("You").green().bold(),
            Author::Assistant => style(chatbot.title.as_str()).cyan().bold(),
        };
        println!(
            "  {} {}",
            label,
            truncate(&message.text.replace('\n', " "), 100)
        );
    }
    println!();
}
