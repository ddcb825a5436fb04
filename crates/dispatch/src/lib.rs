//! Inbound message dispatch, the glue between the transport and bot handlers.
//!
//! Flow: decoded message → resolve roster → classify content → route to the
//! [`Handler`] → optionally re-enter through [`MessageContext::intent`].

pub mod classify;
pub mod context;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod handler;

#[cfg(test)]
mod testing;

pub use {
    classify::classify,
    context::{FailedSend, IntentOptions, IntentOutcome, MessageContext, SendReport},
    dispatcher::{
        DEFAULT_MAX_INTENT_DEPTH, Dispatcher, RECURSION_LIMIT_REPLY, UNKNOWN_COMMAND_REPLY,
    },
    envelope::{AttachmentContent, Content, ContentKind, MessageEnvelope},
    error::{Error, GENERIC_ERROR_REPLY, Result},
    handler::{Command, Handler},
};
