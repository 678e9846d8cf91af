//! Whole-file artifact writes.
//!
//! Artifacts are fully rendered before they reach the disk. The bytes are
//! written to a temporary file next to the target and renamed over it, so
//! a failed run leaves the previous artifact in place.

use crate::error::{CollectError, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Replace `path` with `content`, creating it if needed.
pub fn write_artifact(path: &Path, content: &[u8], step: &'static str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CollectError::io(step, path, e))?;
    tmp.write_all(content)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| CollectError::io(step, path, e))?;

    // The temporary file is removed on drop if persisting fails.
    tmp.persist(path)
        .map_err(|e| CollectError::io(step, path, e.error))?;

    debug!(path = %path.display(), bytes = content.len(), "Artifact written");
    Ok(())
}
