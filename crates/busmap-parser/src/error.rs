//! Error and diagnostic system for the busmap parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Multiple labeled spans for rich error context
//! - Severity levels
//! - Diagnostic collector for accumulating multiple errors
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error or warning message with optional error code, multiple source
//! locations, and help text. Multiple diagnostics are wrapped in [`ParseError`]
//! when a document cannot be loaded. Warnings about single tags travel with
//! the result instead and never abort a scan.
//!
//! # Example
//!
//! ```
//! # use busmap_parser::error::{Diagnostic, ErrorCode};
//! # use busmap_parser::Span;
//!
//! let span = Span::new(40..50);
//!
//! let diag = Diagnostic::warning("tag `Bus[x].Obj` has no bus number")
//!     .with_code(ErrorCode::E002)
//!     .with_label(span, "skipped")
//!     .with_help("bus numbers are written as digits: `Bus[3].Obj`");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub use collector::DiagnosticCollector;
pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
