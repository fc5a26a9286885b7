//! Error codes for the busmap diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Tag pattern errors
//! - `E1xx` - Markup errors
//! - `E2xx` - Tuple list errors

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Tag Pattern Errors (E0xx)
    // =========================================================================
    /// Missing bracket group.
    ///
    /// A token was classified as a bus reference but has no `[...]` group.
    E001,

    /// Invalid bus number.
    ///
    /// The first bracket group of a bus reference does not hold a number.
    E002,

    // =========================================================================
    // Markup Errors (E1xx)
    // =========================================================================
    /// Malformed markup.
    ///
    /// The document is not well-formed enough to locate its text nodes.
    E100,

    /// Unexpected end of document.
    ///
    /// The document ended while an element was still open.
    E101,

    // =========================================================================
    // Tuple List Errors (E2xx)
    // =========================================================================
    /// Malformed tuple list.
    ///
    /// A tuple list is not a parenthesised or bracketed list of quoted tags.
    E200,

    /// Unterminated quoted tag.
    ///
    /// A quoted tag inside a tuple list was opened but never closed.
    E201,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "missing bracket group",
            ErrorCode::E002 => "invalid bus number",
            ErrorCode::E100 => "malformed markup",
            ErrorCode::E101 => "unexpected end of document",
            ErrorCode::E200 => "malformed tuple list",
            ErrorCode::E201 => "unterminated quoted tag",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
