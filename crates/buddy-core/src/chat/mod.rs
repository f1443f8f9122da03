//! Chat turn orchestration.
//!
//! The transport and record store are ports: traits defined here and
//! implemented in buddy-infra, so this crate never touches the network or
//! the filesystem directly.

pub mod conversation;
pub mod service;
pub mod store;
pub mod transport;

pub use conversation::Conversation;
pub use service::{ChatService, ChatTurn};
pub use store::RecordStore;
pub use transport::{ByteStream, ChatTransport};
