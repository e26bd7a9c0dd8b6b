//! Interactive chat with one chatbot.
//!
//! Streams replies token by token, renders the welcome message and source
//! answers as markdown, and offers slash commands for conversation control.
//! Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
