//! Interactive CLI chat experience for Buddy.
//!
//! Streams replies with directives hidden as they arrive, offers chips as
//! numbered quick replies, and reports saved records. Entry point:
//! `loop_runner::run_chat_loop`.

pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
