//! Transport collaborator interface.
//!
//! The bot layer never talks to the network directly: it goes through a
//! [`TransportClient`] for client-wide operations and a [`Conversation`] for
//! everything scoped to one chat. [`memory`] provides an in-process
//! implementation used by the CLI demo and by tests across the workspace.

pub mod error;
pub mod memory;
pub mod transport;

pub use {
    error::{Error, Result},
    memory::{MemoryConversation, MemoryTransport},
    transport::{Conversation, TransportClient},
};
