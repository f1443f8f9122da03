//! Infrastructure adapters for Buddy.
//!
//! Implements the ports defined in `buddy-core`: the HTTP chat transport and
//! the JSON-lines record store. Also owns config loading and data directory
//! resolution.

pub mod config;
pub mod http;
pub mod store;
