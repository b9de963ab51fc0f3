//! Reading archives from disk and turning them into index deltas.
//!
//! Each archive becomes one root. Only text-like leaves are sent to the
//! index; their signature is the BLAKE3 hash of the content.

use std::path::Path;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};
use trawl_archive::{ArchiveError, ExtractedFile, is_text_like};
use trawl_index::{DeltaFile, IndexDeltaRequest};

use crate::error::CliError;

/// One imported archive.
#[derive(Debug, Clone)]
pub struct ImportedRoot {
    /// Stable id of the root within the workspace
    pub root_id: String,
    /// File name of the archive
    pub source_name: String,
    /// Every extracted leaf
    pub files: Vec<ExtractedFile>,
}

impl ImportedRoot {
    /// Number of text-like leaves.
    #[must_use]
    pub fn text_files(&self) -> usize {
        self.files.iter().filter(|f| f.text_like).count()
    }
}

/// An archive that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedImport {
    /// File name of the archive
    pub source_name: String,
    /// Why it was skipped
    pub error: String,
}

/// Roots that imported plus the archives that did not.
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    /// Imported roots, in argument order
    pub roots: Vec<ImportedRoot>,
    /// Skipped archives, in argument order
    pub failures: Vec<FailedImport>,
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Reads and extracts `path`.
///
/// A file that is not a recognized container is kept as a single leaf.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a recognized container
/// is corrupt.
pub fn load_archive(path: &Path) -> Result<Vec<ExtractedFile>, CliError> {
    let name = source_name(path);
    let bytes = Bytes::from(std::fs::read(path)?);

    match trawl_archive::extract(&name, bytes.clone()) {
        Ok(files) => Ok(files),
        Err(ArchiveError::UnrecognizedFormat(_)) => {
            debug!(path = %path.display(), "not a container, importing as one file");
            Ok(vec![ExtractedFile {
                text_like: is_text_like(&bytes, &name),
                size: bytes.len(),
                path: name,
                bytes,
            }])
        }
        Err(err) => Err(err.into()),
    }
}

/// Loads every archive as its own root.
///
/// Root ids follow argument position (`root-N`), so a skipped archive
/// leaves a gap rather than renumbering the rest. An archive that fails to
/// load is recorded in [`ImportOutcome::failures`] and the others proceed.
///
/// # Errors
///
/// Returns the first load failure when no archive could be imported.
pub fn import_roots(paths: &[impl AsRef<Path>]) -> Result<ImportOutcome, CliError> {
    let mut outcome = ImportOutcome::default();
    let mut first_error = None;

    for (i, path) in paths.iter().enumerate() {
        let path = path.as_ref();
        let name = source_name(path);
        match load_archive(path) {
            Ok(files) => {
                let root = ImportedRoot {
                    root_id: format!("root-{}", i + 1),
                    source_name: name,
                    files,
                };
                info!(
                    root_id = %root.root_id,
                    source = %root.source_name,
                    files = root.files.len(),
                    text_files = root.text_files(),
                    "archive imported"
                );
                outcome.roots.push(root);
            }
            Err(err) => {
                warn!(source = %name, error = %err, "archive skipped");
                outcome.failures.push(FailedImport {
                    source_name: name,
                    error: err.to_string(),
                });
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }

    match first_error {
        Some(err) if outcome.roots.is_empty() => Err(err),
        _ => Ok(outcome),
    }
}

/// Content signature of a leaf.
#[must_use]
pub fn signature(file: &ExtractedFile) -> String {
    blake3::hash(&file.bytes).to_hex().to_string()
}

/// Builds a replacing delta holding every text-like leaf of `roots`.
#[must_use]
pub fn build_delta(workspace_id: &str, roots: &[ImportedRoot]) -> IndexDeltaRequest {
    let files: Vec<DeltaFile> = roots
        .iter()
        .flat_map(|root| {
            root.files.iter().filter(|f| f.text_like).map(move |file| {
                DeltaFile::new(
                    format!("{}/{}", root.root_id, file.path),
                    signature(file),
                    root.root_id.clone(),
                    root.source_name.clone(),
                    file.path.clone(),
                    file.text_lossy(),
                )
            })
        })
        .collect();

    let total = files.len();
    IndexDeltaRequest {
        workspace_id: workspace_id.to_string(),
        replace: true,
        files,
        removed_file_keys: Vec::new(),
        total_files: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn leaf(path: &str, body: &[u8], text_like: bool) -> ExtractedFile {
        ExtractedFile {
            path: path.to_string(),
            size: body.len(),
            bytes: Bytes::copy_from_slice(body),
            text_like,
        }
    }

    fn temp_file(suffix: &str, body: &[u8]) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("temp file");
        file.write_all(body).expect("write");
        file
    }

    #[test]
    fn plain_file_becomes_single_leaf() {
        let file = temp_file(".log", b"INFO hello\n");
        let files = load_archive(file.path()).expect("load");
        assert_eq!(files.len(), 1);
        assert!(files[0].text_like);
        assert!(files[0].path.ends_with(".log"));
    }

    #[test]
    fn corrupt_container_is_an_error() {
        let file = temp_file(".zip", b"not a zip");
        let err = load_archive(file.path()).expect_err("corrupt");
        assert!(matches!(err, CliError::Archive(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_archive(Path::new("/nonexistent/bundle.zip")).expect_err("missing");
        assert!(matches!(err, CliError::Io(_)));
    }

    #[test]
    fn failed_archive_does_not_block_others() {
        let good = temp_file(".log", b"INFO hello\n");
        let broken = temp_file(".zip", b"not a zip");

        let outcome = import_roots(&[broken.path(), good.path()]).expect("import");
        assert_eq!(outcome.roots.len(), 1);
        assert_eq!(outcome.roots[0].root_id, "root-2");
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].source_name.ends_with(".zip"));
        assert!(outcome.failures[0].error.starts_with("archive error"));
    }

    #[test]
    fn all_archives_failing_is_an_error() {
        let broken = temp_file(".zip", b"not a zip");
        let err = import_roots(&[broken.path()]).expect_err("nothing imported");
        assert!(matches!(err, CliError::Archive(_)));
    }

    #[test]
    fn delta_keeps_only_text_files() {
        let roots = vec![
            ImportedRoot {
                root_id: "root-1".into(),
                source_name: "a.zip".into(),
                files: vec![leaf("logs/app.log", b"x", true), leaf("bin/tool", b"\x00", false)],
            },
            ImportedRoot {
                root_id: "root-2".into(),
                source_name: "b.zip".into(),
                files: vec![leaf("logs/app.log", b"x", true)],
            },
        ];

        let delta = build_delta("ws", &roots);
        assert!(delta.replace);
        assert_eq!(delta.total_files, 2);
        let keys: Vec<&str> = delta.files.iter().map(|f| f.file_key.as_str()).collect();
        assert_eq!(keys, vec!["root-1/logs/app.log", "root-2/logs/app.log"]);
        assert_eq!(delta.files[0].signature, delta.files[1].signature);
        assert_eq!(delta.files[1].source_name, "b.zip");
    }

    #[test]
    fn signature_tracks_content() {
        let a = signature(&leaf("x", b"one", true));
        let b = signature(&leaf("y", b"one", true));
        let c = signature(&leaf("x", b"two", true));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
