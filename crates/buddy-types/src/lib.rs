//! Shared domain types for Buddy.
//!
//! This crate contains the types passed between the chat protocol core, the
//! transport and storage adapters, and the CLI: chat messages and request
//! payloads, directive record kinds, configuration, and error enums.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod record;
