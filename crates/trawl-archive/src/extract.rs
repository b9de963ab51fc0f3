//! Recursive extraction of nested bundles.
//!
//! [`extract`] walks a container, re-enters every entry whose name carries an
//! archive extension, and flattens the result into [`ExtractedFile`] leaves.
//!
//! - Recursion stops once the depth exceeds [`MAX_DEPTH`]; the bytes at that
//!   level are emitted verbatim as one leaf.
//! - A nested entry that fails to decode becomes an ordinary leaf.
//! - Resource forks and OS metadata files are dropped.

use bytes::Bytes;
use tracing::{debug, info};

use crate::classify::is_text_like;
use crate::container;
use crate::error::Result;
use crate::path::{base_name, has_archive_extension, join, strip_archive_extension};
use crate::types::{EntryKind, ExtractedFile};

/// Maximum nesting depth before containers are emitted as opaque leaves.
pub const MAX_DEPTH: usize = 12;

const METADATA_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];
const RESOURCE_FORK_DIR: &str = "__MACOSX";

/// Extracts every leaf file from the container `filename`.
///
/// Leaf paths are relative to the container itself; the top-level name is not
/// part of them.
///
/// # Errors
///
/// Returns an error only when the top-level container cannot be decoded.
/// Failures in nested containers fall back to leaves.
pub fn extract(filename: &str, bytes: impl Into<Bytes>) -> Result<Vec<ExtractedFile>> {
    let mut out = Vec::new();
    extract_into(filename, bytes.into(), "", 0, &mut out)?;
    info!(filename, files = out.len(), "extraction complete");
    Ok(out)
}

fn extract_into(
    filename: &str,
    bytes: Bytes,
    base_path: &str,
    depth: usize,
    out: &mut Vec<ExtractedFile>,
) -> Result<()> {
    if depth > MAX_DEPTH {
        debug!(filename, depth, "depth cap reached, keeping container opaque");
        out.push(leaf(join(base_path, base_name(filename)), bytes, filename));
        return Ok(());
    }

    let entries = container::decode(filename, &bytes)?;

    for entry in entries {
        if entry.kind == EntryKind::Dir || is_ignorable(&entry.path) {
            continue;
        }

        let merged = join(base_path, &entry.path);
        let entry_name = base_name(&entry.path);

        if has_archive_extension(entry_name) {
            let mut nested = Vec::new();
            match extract_into(
                entry_name,
                entry.bytes.clone(),
                &strip_archive_extension(&merged),
                depth + 1,
                &mut nested,
            ) {
                Ok(()) => {
                    out.append(&mut nested);
                    continue;
                }
                Err(err) => {
                    debug!(path = %merged, depth, error = %err, "nested container unreadable, keeping as file");
                }
            }
        }

        out.push(leaf(merged, entry.bytes, entry_name));
    }

    Ok(())
}

fn leaf(path: String, bytes: Bytes, name: &str) -> ExtractedFile {
    ExtractedFile {
        text_like: is_text_like(&bytes, name),
        size: bytes.len(),
        path,
        bytes,
    }
}

/// Returns true for resource forks, OS metadata files and empty paths.
#[must_use]
pub fn is_ignorable(path: &str) -> bool {
    if path.is_empty() {
        return true;
    }
    if path.split('/').any(|segment| segment == RESOURCE_FORK_DIR) {
        return true;
    }
    let name = base_name(path);
    name.is_empty() || name.starts_with("._") || METADATA_FILES.contains(&name)
}
