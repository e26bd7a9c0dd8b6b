//! `docutalk bots`: the chatbot catalog from the user profile.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use docutalk_types::account::ChatbotSummary;

use crate::state::AppState;

use super::format::truncate;

/// List the chatbots the user owns or can access.
pub async fn list_bots(state: &AppState, json: bool) -> Result<()> {
    let profile = state.load_account().await?;
    let bots = &profile.chatbots;

    if json {
        println!("{}", serde_json::to_string_pretty(bots)?);
        return Ok(());
    }

    if bots.is_empty() {
        println!();
        println!(
            "  {} No chatbots yet. Create one with: {}",
            style("i").blue().bold(),
            style("docutalk create <file.pdf>...").yellow()
        );
        println!();
        return Ok(());
    }

    println!();
    println!("{}", build_table(bots));
    println!();
    println!(
        "  {} chatbot{}",
        style(bots.len()).bold(),
        if bots.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

fn build_table(bots: &[ChatbotSummary]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Title").fg(Color::White),
        Cell::new("Id").fg(Color::White),
        Cell::new("Access").fg(Color::White),
        Cell::new("Role").fg(Color::White),
        Cell::new("Description").fg(Color::White),
    ]);

    for bot in bots {
        let access = match bot.access.as_str() {
            "public" => Cell::new("● public").fg(Color::Green),
            "private" => Cell::new("○ private").fg(Color::Yellow),
            other => Cell::new(other).fg(Color::DarkGrey),
        };
        table.add_row(vec![
            Cell::new(&bot.title).fg(Color::Cyan),
            Cell::new(&bot.id).fg(Color::DarkGrey),
            access,
            Cell::new(&bot.user_role),
            Cell::new(truncate(&bot.description, 50)),
        ]);
    }

    table
}
