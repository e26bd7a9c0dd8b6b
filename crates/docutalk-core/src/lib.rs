//! Client core for DocuTalk.
//!
//! Holds the incremental stream decoders, the creation stage machine, the
//! conversation session, credit accounting, and the services that drive
//! them. Network access goes through the [`backend::ChatbotBackend`] port,
//! implemented in `docutalk-infra`; this crate never depends on an HTTP
//! client directly.

pub mod backend;
pub mod chat;
pub mod creation;
pub mod credits;
pub mod service;
pub mod stream;

#[cfg(test)]
pub(crate) mod test_support;
