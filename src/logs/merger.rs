//! Merging of subprocess logs.
//!
//! Each subprocess of a run writes its own log. This module concatenates
//! them, in dispatch order, into a single log next to the main output,
//! with a provenance marker in front of every section.

use crate::error::{CollectError, Result};
use crate::models::{OutputLocation, SubprocessReference};
use crate::output::write_artifact;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Title line of a merged log.
pub const MERGED_LOG_TITLE: &str = "Merged log files";

/// Separator between a section marker and the section contents.
pub const SECTION_SEPARATOR: &str = "***";

/// Derive the ordered list of subprocess log paths.
pub fn subprocess_log_paths(subprocesses: &[SubprocessReference], log_suffix: &str) -> Vec<PathBuf> {
    subprocesses
        .iter()
        .map(|sub| sub.log_path(log_suffix))
        .collect()
}

/// Render the merged log for the given sources.
///
/// Sources are read verbatim, as bytes, in the order given. Nothing is
/// returned unless every source could be read.
pub fn render_merged_log(log_paths: &[PathBuf]) -> Result<Vec<u8>> {
    let mut output = Vec::new();

    // Header
    output.extend_from_slice(MERGED_LOG_TITLE.as_bytes());
    output.push(b'\n');
    output.extend_from_slice("#".repeat(MERGED_LOG_TITLE.len()).as_bytes());
    output.extend_from_slice(b"\n\n");

    for log_path in log_paths {
        output.extend_from_slice(&render_section(log_path)?);
    }

    Ok(output)
}

/// Render one `<basename>:` section.
fn render_section(log_path: &Path) -> Result<Vec<u8>> {
    let contents = std::fs::read(log_path)
        .map_err(|e| CollectError::io("read subprocess log", log_path, e))?;

    debug!(path = %log_path.display(), bytes = contents.len(), "Read subprocess log");

    let basename = log_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| log_path.display().to_string());

    let mut section = Vec::with_capacity(contents.len() + basename.len() + 8);
    section.extend_from_slice(format!("{}:\n{}\n", basename, SECTION_SEPARATOR).as_bytes());
    section.extend_from_slice(&contents);
    section.push(b'\n');

    Ok(section)
}

/// Merge the subprocess logs into `<output.path>/<output.name>.<log_suffix>`.
///
/// Any previous merged log at that path is replaced. If a source is missing
/// or unreadable, the previous file is left untouched. Returns the path
/// written.
pub fn merge_logs(
    log_paths: &[PathBuf],
    output: &OutputLocation,
    log_suffix: &str,
) -> Result<PathBuf> {
    let target = output.artifact(log_suffix);

    let merged = render_merged_log(log_paths)?;
    write_artifact(&target, &merged, "write merged log")?;

    info!(
        "Merged {} subprocess log(s) into {}",
        log_paths.len(),
        target.display()
    );

    Ok(target)
}
