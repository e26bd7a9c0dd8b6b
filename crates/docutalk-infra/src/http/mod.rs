//! HTTP implementation of the `ChatbotBackend` port.

pub mod client;
pub mod types;

pub use client::HttpBackend;
