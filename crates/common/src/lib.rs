//! Shared error plumbing and identifier helpers used across all msgkit crates.

pub mod error;
pub mod ids;

pub use error::FromMessage;
