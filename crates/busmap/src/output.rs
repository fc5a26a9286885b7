//! Atomic output files.

use std::{io::Write, path::Path};

use log::{debug, info};
use tempfile::NamedTempFile;

use crate::error::BusmapError;

/// Write `content` to `path` without ever leaving a partial file behind.
///
/// The content goes to a temporary file next to `path` first, which then
/// replaces `path` in one rename. On error `path` is left as it was.
///
/// # Errors
///
/// Returns [`BusmapError::MissingResource`] if the parent directory of
/// `path` does not exist, and [`BusmapError::Io`] for any other failure.
pub fn write_atomic(path: &Path, content: impl AsRef<[u8]>) -> Result<(), BusmapError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(|err| BusmapError::from_io(err, dir))?;
    file.write_all(content.as_ref())?;
    file.as_file().sync_all()?;
    debug!(temp_path:? = file.path(); "Content staged");

    file.persist(path).map_err(|err| BusmapError::Io(err.error))?;
    info!(path:? = path; "File written");
    Ok(())
}
