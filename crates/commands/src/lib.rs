//! Intent resolution: roster normalization, the static command schema
//! registry, and the slash-command parser.
//!
//! Flow: conversation members → [`roster::resolve`] → [`parser::parse`]
//! against a [`CommandRegistry`] → [`ParsedIntent`].

pub mod error;
pub mod parser;
pub mod roster;
pub mod schema;

pub use {
    error::{Error, Result},
    parser::{IntentKind, ParamValue, ParsedIntent, parse},
    roster::{FixtureRoster, NoFixtures, Roster, RosterMember, RosterProvider},
    schema::{COMMAND_SIGIL, CommandGroup, CommandRegistry, CommandSchema, ParamKind, ParamSpec},
};
