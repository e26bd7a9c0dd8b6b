//! Terminal output for chat replies.
//!
//! Streamed tokens are printed raw as they arrive. Complete messages (the
//! welcome text and source answers) are rendered as markdown with
//! `termimad`.

use std::io::Write;
use std::time::Duration;

use termimad::crossterm::style::Color;
use termimad::MadSkin;

use docutalk_core::credits::CreditSnapshot;

use crate::cli::format::styled_credits;

pub struct ChatRenderer {
    skin: MadSkin,
}

impl ChatRenderer {
    pub fn new() -> Self {
        let mut skin = MadSkin::default_dark();
        skin.bold.set_fg(Color::Cyan);
        skin.headers[0].set_fg(Color::Cyan);
        skin.headers[1].set_fg(Color::Cyan);
        skin.inline_code.set_fg(Color::Yellow);
        Self { skin }
    }

    /// Render a complete markdown message for the terminal.
    pub fn render_final(&self, markdown: &str) -> String {
        self.skin.term_text(markdown).to_string()
    }

    pub fn print_streaming_token(&self, token: &str) {
        print!("{token}");
        let _ = std::io::stdout().flush();
    }

    /// Footer after a reply: `| 3.4s · model · 1263 / 2500 credits`
    pub fn print_stats_footer(&self, elapsed: Duration, model: &str, credits: &CreditSnapshot) {
        let footer = format!(
            "\n  {} {:.1}s {} {} {} {} {}",
            console::style("|").dim(),
            console::style(elapsed.as_secs_f64()).dim(),
            console::style("\u{00b7}").dim(),
            console::style(model).dim(),
            console::style("\u{00b7}").dim(),
            styled_credits(credits),
            console::style("credits").dim(),
        );
        println!("{footer}");
    }
}

impl Default for ChatRenderer {
    fn default() -> Self {
        Self::new()
    }
}
