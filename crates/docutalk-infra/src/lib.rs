//! Infrastructure layer for DocuTalk.
//!
//! Contains the `reqwest` implementation of the `ChatbotBackend` port from
//! `docutalk-core`, plus data directory resolution, `config.toml` loading
//! and bearer token storage.

pub mod auth;
pub mod config;
pub mod http;
