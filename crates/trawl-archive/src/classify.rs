//! Text classification for extracted blobs.
//!
//! A blob is text-like when its name carries a known text extension, or when
//! a sample of its leading bytes contains no NUL and few control characters.

use crate::path::base_name;

/// Number of leading bytes inspected by the content heuristic.
pub const SAMPLE_BYTES: usize = 2048;

/// Fraction of control bytes at or above which a sample counts as binary.
pub const BINARY_CONTROL_RATIO: f64 = 0.08;

const TEXT_EXTENSIONS: &[&str] = &[
    "log", "txt", "text", "out", "err", "json", "jsonl", "ndjson", "yaml", "yml", "csv", "tsv",
    "xml", "html", "htm", "md", "ini", "conf", "cfg", "properties", "toml", "env", "trace", "sql",
    "sh",
];

/// Decides whether `bytes` named `name` should be indexed as text.
#[must_use]
pub fn is_text_like(bytes: &[u8], name: &str) -> bool {
    if has_text_extension(name) {
        return true;
    }

    let sample = &bytes[..bytes.len().min(SAMPLE_BYTES)];
    if sample.is_empty() {
        return true;
    }
    if sample.contains(&0) {
        return false;
    }

    let control = sample
        .iter()
        .filter(|b| is_control(**b))
        .count();
    (control as f64) / (sample.len() as f64) < BINARY_CONTROL_RATIO
}

const fn is_control(b: u8) -> bool {
    (b < 0x20 && b != b'\t' && b != b'\n' && b != b'\r') || b == 0x7f
}

/// Checks the extension allow-list, also accepting rotation suffixes such as
/// `app.log.1` or `app.log.2024-01-01`.
fn has_text_extension(name: &str) -> bool {
    let lower = base_name(name).to_ascii_lowercase();
    let extensions: Vec<&str> = lower.split('.').skip(1).collect();
    match extensions.as_slice() {
        [.., last] if TEXT_EXTENSIONS.contains(last) => true,
        [.., previous, last] if is_rotation_suffix(last) => TEXT_EXTENSIONS.contains(previous),
        _ => false,
    }
}

fn is_rotation_suffix(ext: &str) -> bool {
    !ext.is_empty() && ext.bytes().all(|b| b.is_ascii_digit() || b == b'-')
}
