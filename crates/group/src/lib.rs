//! A group chat bot on top of `msgkit-dispatch`.
//!
//! Narrates membership and rename events, lets admins rename the group and
//! add or remove members with slash commands, and forwards free text to a
//! text generation backend whose command-shaped answers are re-dispatched.

pub mod admin;
pub mod agent;
mod bot;
pub mod commands;
pub mod narration;

pub use {
    agent::Agent,
    bot::GroupBot,
    commands::{GroupCommand, registry},
    narration::Narrator,
};
