//! Virtual path helpers.
//!
//! All paths handed out by this crate are `/`-joined and free of `.`, `..`
//! and empty segments. Entry names coming out of a container are untrusted and
//! go through [`normalize`] before they are joined onto anything.

/// Archive extensions recognized for recursion, longest first.
const ARCHIVE_EXTENSIONS: &[&str] = &[".tar.gz", ".tgz", ".zip", ".tar", ".gz"];

/// Normalizes an untrusted path.
///
/// Backslashes become separators, drive prefixes and leading slashes are
/// dropped, and `.`/`..` segments are removed.
#[must_use]
pub fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for (i, segment) in path.split(['/', '\\']).enumerate() {
        if segment.is_empty() || segment == "." || segment == ".." {
            continue;
        }
        if i == 0 && segment.len() == 2 && segment.ends_with(':') {
            continue;
        }
        segments.push(segment);
    }
    segments.join("/")
}

/// Joins a base path and a relative path, normalizing both.
#[must_use]
pub fn join(base: &str, rel: &str) -> String {
    let base = normalize(base);
    let rel = normalize(rel);
    match (base.is_empty(), rel.is_empty()) {
        (true, _) => rel,
        (false, true) => base,
        (false, false) => format!("{base}/{rel}"),
    }
}

/// Returns the final segment of a path.
#[must_use]
pub fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn archive_extension(name: &str) -> Option<&'static str> {
    let lower = name.to_ascii_lowercase();
    ARCHIVE_EXTENSIONS
        .iter()
        .copied()
        .find(|ext| lower.len() > ext.len() && lower.ends_with(ext))
}

/// Returns true if the name ends with a recognized archive extension.
#[must_use]
pub fn has_archive_extension(name: &str) -> bool {
    archive_extension(base_name(name)).is_some()
}

/// Removes the archive extension from the last segment of `path`.
///
/// `logs/node-1.tar.gz` becomes `logs/node-1`. Paths without an archive
/// extension are returned unchanged.
#[must_use]
pub fn strip_archive_extension(path: &str) -> String {
    match archive_extension(base_name(path)) {
        Some(ext) => path[..path.len() - ext.len()].to_string(),
        None => path.to_string(),
    }
}
