//! Tape-archive (tar) decoding.
//!
//! Handles ustar, GNU long names (`L`) and PAX extended headers (`x`).
//! Entry contents are sliced out of the input buffer without copying.
//!
//! ## Layout
//!
//! ```text
//! | header 512 | data, padded to 512 | header 512 | ... | zero block |
//! ```

use bytes::Bytes;
use tracing::trace;

use crate::error::{ArchiveError, Result};
use crate::path::normalize;
use crate::types::ContainerEntry;

/// Size of a header or data block.
pub const BLOCK_SIZE: usize = 512;

/// Offset of the `ustar` marker inside a header block.
pub const USTAR_MAGIC_OFFSET: usize = 257;

const NAME: std::ops::Range<usize> = 0..100;
const SIZE: std::ops::Range<usize> = 124..136;
const CHECKSUM: std::ops::Range<usize> = 148..156;
const TYPE_FLAG: usize = 156;
const PREFIX: std::ops::Range<usize> = 345..500;

/// Returns true if `bytes` carry the `ustar` marker at offset 257.
#[must_use]
pub fn has_ustar_magic(bytes: &[u8]) -> bool {
    bytes
        .get(USTAR_MAGIC_OFFSET..USTAR_MAGIC_OFFSET + 5)
        .is_some_and(|magic| magic == b"ustar")
}

/// Decodes every entry of a tar stream.
///
/// # Errors
///
/// Returns an error for truncated blocks, unparseable size fields, and
/// headers whose checksum does not match.
pub fn decode(bytes: &Bytes) -> Result<Vec<ContainerEntry>> {
    let mut entries = Vec::new();
    let mut offset = 0usize;
    let mut long_name: Option<String> = None;
    let mut pax_path: Option<String> = None;

    while offset < bytes.len() {
        let available = bytes.len() - offset;
        if available < BLOCK_SIZE {
            // Some writers leave short zero padding behind the end marker
            if bytes[offset..].iter().all(|b| *b == 0) {
                break;
            }
            return Err(ArchiveError::Truncated {
                offset,
                needed: BLOCK_SIZE,
                available,
            });
        }

        let header = &bytes[offset..offset + BLOCK_SIZE];
        if header.iter().all(|b| *b == 0) {
            break;
        }
        verify_checksum(header, offset)?;

        let size = parse_size(&header[SIZE]).ok_or_else(|| ArchiveError::InvalidHeader {
            offset,
            reason: "unparseable size field".to_string(),
        })?;
        let data_start = offset + BLOCK_SIZE;
        let data_end = data_start.checked_add(size).filter(|end| *end <= bytes.len()).ok_or(
            ArchiveError::Truncated {
                offset: data_start,
                needed: size,
                available: bytes.len() - data_start,
            },
        )?;
        let data = bytes.slice(data_start..data_end);
        let type_flag = header[TYPE_FLAG];

        match type_flag {
            b'L' => {
                long_name = Some(field_string(&data));
            }
            b'x' => {
                if let Some(path) = pax_records(&data)
                    .into_iter()
                    .find_map(|(key, value)| (key == "path").then_some(value))
                {
                    pax_path = Some(path);
                }
            }
            b'g' | b'K' => {}
            b'1' | b'2' | b'3' | b'4' | b'6' => {
                // Links and special files carry no content; drop any pending name
                long_name = None;
                pax_path = None;
            }
            _ => {
                let name = effective_name(
                    pax_path.take(),
                    long_name.take(),
                    &field_string(&header[PREFIX]),
                    &field_string(&header[NAME]),
                );
                let path = normalize(&name);
                trace!(path = %path, size, type_flag = %char::from(type_flag), "tar entry");
                if type_flag == b'5' {
                    entries.push(ContainerEntry::dir(path));
                } else {
                    entries.push(ContainerEntry::file(path, data));
                }
            }
        }

        offset = data_start + padded_len(size);
    }

    Ok(entries)
}

/// Resolves the entry name: PAX path, then GNU long name, then
/// `prefix/name`, then the short name.
fn effective_name(
    pax_path: Option<String>,
    long_name: Option<String>,
    prefix: &str,
    name: &str,
) -> String {
    if let Some(path) = pax_path {
        return path;
    }
    if let Some(long) = long_name {
        return long;
    }
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

const fn padded_len(size: usize) -> usize {
    size.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}

/// Reads a NUL-terminated header field, trimming surrounding spaces.
fn field_string(field: &[u8]) -> String {
    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).trim().to_string()
}

/// Parses a zero-padded octal number. Empty fields read as zero.
fn parse_octal(field: &[u8]) -> Option<u64> {
    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    let digits = std::str::from_utf8(&field[..end]).ok()?.trim();
    if digits.is_empty() {
        return Some(0);
    }
    u64::from_str_radix(digits, 8).ok()
}

/// Parses the size field, accepting the GNU base-256 form for large entries.
fn parse_size(field: &[u8]) -> Option<usize> {
    let value = if field.first().is_some_and(|b| b & 0x80 != 0) {
        field[1..]
            .iter()
            .try_fold(u64::from(field[0] & 0x7f), |acc, b| {
                acc.checked_mul(256).map(|v| v + u64::from(*b))
            })?
    } else {
        parse_octal(field)?
    };
    usize::try_from(value).ok()
}

fn verify_checksum(header: &[u8], offset: usize) -> Result<()> {
    let Some(stored) = parse_octal(&header[CHECKSUM]) else {
        return Err(ArchiveError::InvalidHeader {
            offset,
            reason: "unparseable checksum field".to_string(),
        });
    };
    let computed: u64 = header
        .iter()
        .enumerate()
        .map(|(i, b)| if CHECKSUM.contains(&i) { u64::from(b' ') } else { u64::from(*b) })
        .sum();
    if stored == computed {
        Ok(())
    } else {
        Err(ArchiveError::InvalidHeader {
            offset,
            reason: format!("checksum mismatch: stored {stored}, computed {computed}"),
        })
    }
}

/// Splits a PAX data block into `(key, value)` pairs.
///
/// Records look like `"<len> key=value\n"` where `len` counts the whole
/// record including itself and the newline. Parsing stops at the first
/// malformed record.
fn pax_records(data: &[u8]) -> Vec<(String, String)> {
    let mut records = Vec::new();
    let mut rest = data;

    while !rest.is_empty() {
        let Some(space) = rest.iter().position(|b| *b == b' ') else {
            break;
        };
        let Some(len) = std::str::from_utf8(&rest[..space])
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
        else {
            break;
        };
        if len <= space || len > rest.len() {
            break;
        }
        let record = &rest[space + 1..len];
        let record = record.strip_suffix(b"\n").unwrap_or(record);
        if let Some(eq) = record.iter().position(|b| *b == b'=') {
            records.push((
                String::from_utf8_lossy(&record[..eq]).into_owned(),
                String::from_utf8_lossy(&record[eq + 1..]).into_owned(),
            ));
        }
        rest = &rest[len..];
    }

    records
}
