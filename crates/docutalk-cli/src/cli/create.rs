//! `docutalk create`: build a chatbot from PDF documents.
//!
//! Reads the files, shows the server estimate, asks for confirmation, then
//! follows the creation stream with a four-step progress bar.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use base64::Engine as _;
use console::style;
use dialoguer::Confirm;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};

use docutalk_types::creation::{
    ChatbotDraft, CreationEvent, CreationPayload, CreationStage, DocumentUpload, StageTransition,
};

use crate::state::AppState;

use super::credits::ensure_credits;
use super::format::{format_duration, styled_credits};

/// Run the whole creation flow for `files`.
pub async fn create_chatbot(
    state: &AppState,
    files: &[PathBuf],
    premium: bool,
    yes: bool,
    icon_out: Option<&Path>,
    json: bool,
) -> Result<()> {
    state.load_account().await?;
    ensure_credits(&state.ledger)?;

    let documents = read_documents(files).await?;
    let mut service = state.creation_service(premium);

    let spinner = spinner("estimating...");
    let estimate = service.estimate(&documents).await;
    spinner.finish_and_clear();
    let estimate = estimate.context("Could not estimate chatbot creation")?;

    if !json {
        println!();
        println!(
            "  {} {} document{}, {} page{}",
            style("*").cyan().bold(),
            documents.len(),
            if documents.len() == 1 { "" } else { "s" },
            estimate.total_pages,
            if estimate.total_pages == 1 { "" } else { "s" }
        );
        println!(
            "  {}  {}",
            style("Estimated duration:").bold(),
            format_duration(estimate.estimated_duration)
        );
        println!();
    }

    if !yes && !json {
        let proceed = Confirm::new()
            .with_prompt("Create the chatbot?")
            .default(true)
            .interact()?;
        if !proceed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let bar = stage_bar(json);
    {
        let stream = service.start_creation(documents);
        futures_util::pin_mut!(stream);
        while let Some(event) = stream.next().await {
            match event {
                Ok(event) => report(&bar, &event),
                Err(e) => {
                    bar.abandon_with_message("creation failed");
                    return Err(e).context("Chatbot creation failed");
                }
            }
        }
    }

    let draft = service.progress().draft().clone();
    if !service.progress().is_finalized() {
        bar.abandon_with_message("stream ended early");
        anyhow::bail!("Creation stream ended before the chatbot was saved");
    }
    bar.finish_and_clear();

    if let (Some(path), Some(icon)) = (icon_out, draft.icon.as_deref()) {
        write_icon(path, icon).await?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&draft)?);
    } else {
        print_summary(&draft, icon_out);
        println!(
            "  {}  {}",
            style("Credits:").bold(),
            styled_credits(&state.ledger.snapshot())
        );
        println!();
    }
    Ok(())
}

/// Load files as uploads. The content type comes from the extension; the
/// service rejects anything that isn't a PDF.
async fn read_documents(files: &[PathBuf]) -> Result<Vec<DocumentUpload>> {
    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        documents.push(document_from(path, bytes));
    }
    Ok(documents)
}

fn document_from(path: &Path, bytes: Vec<u8>) -> DocumentUpload {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    DocumentUpload {
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        content_type: if is_pdf {
            DocumentUpload::PDF_CONTENT_TYPE.to_string()
        } else {
            "application/octet-stream".to_string()
        },
        bytes,
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn stage_bar(hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(u64::from(CreationStage::Finalized.step()));
    if let Ok(style) =
        ProgressStyle::default_bar().template("  {bar:30.cyan/blue} {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_message("reading documents...");
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn report(bar: &ProgressBar, event: &CreationEvent) {
    match event {
        CreationEvent::Stage {
            payload,
            transition: StageTransition::Advanced { to, .. },
        } => {
            bar.set_position(u64::from(to.step()));
            bar.set_message(stage_message(payload));
        }
        CreationEvent::Stage {
            transition: StageTransition::Duplicate { current },
            ..
        } => tracing::debug!(stage = %current, "ignored repeated creation stage"),
        CreationEvent::CreditNotice(notice) => {
            tracing::debug!(consumed_credits = notice.consumed_credits, "creation credits")
        }
        CreationEvent::UnknownStagePayload { .. } => {}
    }
}

fn stage_message(payload: &CreationPayload) -> String {
    match payload {
        CreationPayload::Identity { title, .. } => format!("named \"{title}\", drawing icon..."),
        CreationPayload::Icon { .. } => "icon ready, writing prompts...".to_string(),
        CreationPayload::Prompts { suggested } => {
            format!("{} prompts ready, saving...", suggested.len())
        }
        CreationPayload::Finalized { .. } => "done".to_string(),
    }
}

/// Decode the base64 PNG icon and write it to `path`.
async fn write_icon(path: &Path, icon: &str) -> Result<()> {
    let bytes = decode_icon(icon)?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write icon to {}", path.display()))
}

fn decode_icon(icon: &str) -> Result<Vec<u8>> {
    let raw = icon
        .strip_prefix("data:image/png;base64,")
        .unwrap_or(icon)
        .trim();
    base64::engine::general_purpose::STANDARD
        .decode(raw)
        .context("Icon is not valid base64")
}

fn print_summary(draft: &ChatbotDraft, icon_out: Option<&Path>) {
    println!();
    println!(
        "  {} {}",
        style("✓").green().bold(),
        style(draft.title.as_deref().unwrap_or("Untitled chatbot")).cyan().bold()
    );
    if let Some(description) = &draft.description {
        println!("  {}", style(description).dim());
    }
    println!();
    if !draft.suggested_prompts.is_empty() {
        println!("  {}", style("Suggested prompts:").bold());
        for prompt in &draft.suggested_prompts {
            println!("    {} {prompt}", style("-").dim());
        }
        println!();
    }
    if let Some(id) = &draft.chatbot_id {
        println!("  {}  {}", style("Id:").bold(), style(id).dim());
        println!(
            "  {}  {}",
            style("Chat:").bold(),
            style(format!("docutalk chat {id}")).yellow()
        );
    }
    if let (Some(path), Some(_)) = (icon_out, &draft.icon) {
        println!("  {}  {}", style("Icon:").bold(), style(path.display()).dim());
    }
    println!();
}
