//! Floating window sessions
//!
//! A session is one floating application surface hosted on its own virtual
//! display. The service only tracks session identifiers; the surfaces and their
//! displays belong to the window host.

pub mod stack;

pub use stack::WindowStack;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a window session (the id of its virtual display)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub i32);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A physical or virtual display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayId(pub i32);

impl DisplayId {
    /// The built-in screen
    pub const PRIMARY: DisplayId = DisplayId(0);
}
