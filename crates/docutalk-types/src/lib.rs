//! Shared domain types for the DocuTalk client.
//!
//! This crate contains the data shapes exchanged between the decoders, the
//! session services and the HTTP backend: stream events, creation payloads,
//! conversation identity, account data, configuration and error enums.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod account;
pub mod config;
pub mod conversation;
pub mod creation;
pub mod error;
pub mod stream;
