//! Welcome banner shown when a chat starts.

use console::style;

use docutalk_types::account::ChatbotSummary;

/// Print the chatbot title, description, model and suggested prompts.
pub fn print_welcome_banner(chatbot: &ChatbotSummary, model: &str) {
    println!();
    println!("  {} {}", style("📄").bold(), style(&chatbot.title).cyan().bold());
    if !chatbot.description.is_empty() {
        println!("  {}", style(&chatbot.description).dim());
    }
    println!();
    println!("  {}  {}", style("Model:").bold(), style(model).dim());

    if !chatbot.suggested_prompts.is_empty() {
        println!();
        println!("  {}", style("Try asking:").bold());
        for prompt in &chatbot.suggested_prompts {
            println!("    {} {}", style("›").cyan(), prompt);
        }
    }

    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}
