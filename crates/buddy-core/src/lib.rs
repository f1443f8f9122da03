//! Streaming chat protocol logic for Buddy.
//!
//! This crate decodes the line-oriented event stream the chat endpoint sends,
//! pulls sentinel-delimited directives out of the assembled text, and defines
//! the "ports" (transport and record-store traits) that the infrastructure
//! layer implements. It depends only on `buddy-types` -- never on
//! `buddy-infra` or any HTTP/IO crate.

pub mod chat;
pub mod extract;
pub mod stream;
