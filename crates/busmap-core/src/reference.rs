//! Bus references of the shape `Bus[N].Obj`.
//!
//! A [`BusReference`] names one numbered backplane slot object. Tag strings
//! are compared by their exact text everywhere else in busmap; this type is
//! only the canonical rendering used when a fresh tag has to be produced.

use std::fmt;

use thiserror::Error;

/// Literal that opens every bus reference.
pub const BUS_PREFIX: &str = "Bus[";

/// Suffix that marks a bus reference as an object reference.
pub const OBJECT_SUFFIX: &str = ".Obj";

/// Hardware bus marker. A token containing it is never a bus reference,
/// even though `Bus[` is a substring of it.
pub const HARDWARE_MARKER: &str = "HWBus[";

/// A numbered bus object reference.
///
/// # Example
///
/// ```
/// # use busmap_core::reference::BusReference;
/// let reference = BusReference::new(12);
/// assert_eq!(reference.to_string(), "Bus[12].Obj");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BusReference {
    number: u32,
}

impl BusReference {
    /// Create a reference to bus `number`.
    pub fn new(number: u32) -> Self {
        Self { number }
    }

    /// Returns the bus number.
    pub fn number(&self) -> u32 {
        self.number
    }
}

impl fmt::Display for BusReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{BUS_PREFIX}{}]{OBJECT_SUFFIX}", self.number)
    }
}

/// Returns `true` if `token` carries the hardware bus marker.
pub fn is_hardware_token(token: &str) -> bool {
    token.contains(HARDWARE_MARKER)
}

/// A tag string that looked like a bus reference but whose number could not
/// be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedTag {
    #[error("tag `{0}` has no bracket group")]
    MissingBracket(String),

    #[error("tag `{tag}` has bracket group `[{group}]` which is not a bus number")]
    InvalidNumber { tag: String, group: String },
}

impl MalformedTag {
    /// Returns the offending tag text.
    pub fn tag(&self) -> &str {
        match self {
            MalformedTag::MissingBracket(tag) => tag,
            MalformedTag::InvalidNumber { tag, .. } => tag,
        }
    }
}
