//! Error types for busmap operations.
//!
//! This module provides the main error type [`BusmapError`] which wraps
//! the error conditions that can occur while editing a document.

use std::{io, path::PathBuf};

use thiserror::Error;

use busmap_core::allocation::AllocationError;
use busmap_parser::error::ParseError;

/// The main error type for busmap operations.
///
/// Every variant aborts the operation that raised it before any document is
/// written.
///
/// # Diagnostic Variants
///
/// The `Parse` variant contains structured error information with source
/// spans into `src`, which is either the whole document or a single census
/// cell.
#[derive(Debug, Error)]
pub enum BusmapError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("file not found: {}", .0.display())]
    MissingResource(PathBuf),

    #[error("{}: {message}", path.display())]
    SchemaMismatch { path: PathBuf, message: String },

    #[error("{0}")]
    Allocation(#[from] AllocationError),

    #[error("table error: {0}")]
    Table(#[from] csv::Error),

    #[error("label `{0}` does not occur in any tag tuple")]
    UnknownLabel(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl BusmapError {
    /// Create a new `Parse` error with the associated source text.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }

    /// Create a new `SchemaMismatch` error for the table at `path`.
    pub fn schema_mismatch(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Map an I/O error on `path`, reporting a missing file as
    /// [`BusmapError::MissingResource`].
    pub(crate) fn from_io(err: io::Error, path: impl Into<PathBuf>) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::MissingResource(path.into())
        } else {
            Self::Io(err)
        }
    }
}
