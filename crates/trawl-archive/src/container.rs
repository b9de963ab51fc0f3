//! Single-layer container decoding.
//!
//! [`decode`] turns one container's bytes into its immediate entries. ZIP and
//! GZIP go through the `zip` and `flate2` codecs; tar is decoded by
//! [`crate::tar`].

use std::io::{Cursor, Read};

use bytes::Bytes;
use flate2::read::MultiGzDecoder;
use tracing::debug;

use crate::error::{ArchiveError, Result};
use crate::path::{base_name, normalize};
use crate::tar;
use crate::types::ContainerEntry;

/// Container formats understood by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    /// PKZIP archive
    Zip,
    /// Single gzip member stream (possibly wrapping a tar)
    Gzip,
    /// Tape archive
    Tar,
}

impl ContainerFormat {
    /// Detects the format by file extension, falling back to magic bytes.
    #[must_use]
    pub fn detect(name: &str, bytes: &[u8]) -> Option<Self> {
        Self::from_extension(name).or_else(|| Self::from_magic(bytes))
    }

    /// Detects the format from the file name alone.
    #[must_use]
    pub fn from_extension(name: &str) -> Option<Self> {
        let lower = base_name(name).to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") || lower.ends_with(".gz") {
            Some(Self::Gzip)
        } else if lower.ends_with(".tar") {
            Some(Self::Tar)
        } else {
            None
        }
    }

    /// Detects the format from leading bytes.
    #[must_use]
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [b'P', b'K', a, b, ..] if matches!((*a, *b), (3, 4) | (5, 6) | (7, 8)) => Some(Self::Zip),
            [0x1f, 0x8b, ..] => Some(Self::Gzip),
            _ if tar::has_ustar_magic(bytes) => Some(Self::Tar),
            _ => None,
        }
    }
}

/// Decodes the immediate entries of the container `name`.
///
/// # Errors
///
/// Returns [`ArchiveError::UnrecognizedFormat`] when no format matches, or the
/// codec's error when the bytes are not a valid container of that format.
pub fn decode(name: &str, bytes: &Bytes) -> Result<Vec<ContainerEntry>> {
    let format = ContainerFormat::detect(name, bytes)
        .ok_or_else(|| ArchiveError::UnrecognizedFormat(base_name(name).to_string()))?;
    debug!(name, ?format, size = bytes.len(), "decoding container");

    match format {
        ContainerFormat::Zip => decode_zip(bytes),
        ContainerFormat::Gzip => decode_gzip(name, bytes),
        ContainerFormat::Tar => tar::decode(bytes),
    }
}

fn decode_zip(bytes: &Bytes) -> Result<Vec<ContainerEntry>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.as_ref()))?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let path = normalize(file.name());
        if file.is_dir() {
            entries.push(ContainerEntry::dir(path));
            continue;
        }
        let mut content = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut content)?;
        entries.push(ContainerEntry::file(path, content));
    }

    Ok(entries)
}

fn decode_gzip(name: &str, bytes: &Bytes) -> Result<Vec<ContainerEntry>> {
    let mut content = Vec::new();
    MultiGzDecoder::new(bytes.as_ref()).read_to_end(&mut content)?;

    let mut inner = gzip_inner_name(base_name(name));
    if tar::has_ustar_magic(&content) && !inner.to_ascii_lowercase().ends_with(".tar") {
        inner.push_str(".tar");
    }
    Ok(vec![ContainerEntry::file(inner, content)])
}

/// Derives the name of the single file inside a gzip stream.
fn gzip_inner_name(outer: &str) -> String {
    let lower = outer.to_ascii_lowercase();
    if lower.ends_with(".tgz") {
        format!("{}.tar", &outer[..outer.len() - 4])
    } else if lower.ends_with(".gz") && outer.len() > 3 {
        outer[..outer.len() - 3].to_string()
    } else {
        outer.to_string()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tar::tests::TarBuilder;
    use crate::types::EntryKind;
    use std::io::Write;
    use test_case::test_case;

    // ===========================================
    // Fixture builders
    // ===========================================

    pub(crate) fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, data) in files {
            if name.ends_with('/') {
                writer.add_directory(*name, options).expect("add dir");
            } else {
                writer.start_file(*name, options).expect("start file");
                writer.write_all(data).expect("write file");
            }
        }
        writer.finish().expect("finish zip").into_inner()
    }

    pub(crate) fn gzip_bytes(data: &[u8]) -> Vec<u8> {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).expect("gzip write");
        encoder.finish().expect("gzip finish")
    }

    // ===========================================
    // Detection
    // ===========================================

    #[test_case("bundle.zip", Some(ContainerFormat::Zip) ; "zip")]
    #[test_case("bundle.TAR.GZ", Some(ContainerFormat::Gzip) ; "tar gz")]
    #[test_case("bundle.tgz", Some(ContainerFormat::Gzip) ; "tgz")]
    #[test_case("app.log.gz", Some(ContainerFormat::Gzip) ; "gz")]
    #[test_case("rootfs.tar", Some(ContainerFormat::Tar) ; "tar")]
    #[test_case("app.log", None ; "plain")]
    fn detect_by_extension(name: &str, expected: Option<ContainerFormat>) {
        assert_eq!(ContainerFormat::from_extension(name), expected);
    }

    #[test]
    fn detect_by_magic() {
        assert_eq!(ContainerFormat::from_magic(b"PK\x03\x04rest"), Some(ContainerFormat::Zip));
        assert_eq!(ContainerFormat::from_magic(b"PK\x05\x06"), Some(ContainerFormat::Zip));
        assert_eq!(ContainerFormat::from_magic(b"PK\x07\x08"), Some(ContainerFormat::Zip));
        assert_eq!(ContainerFormat::from_magic(b"PK\x03\x06"), None);
        assert_eq!(ContainerFormat::from_magic(&[0x1f, 0x8b, 8]), Some(ContainerFormat::Gzip));
        let tar = TarBuilder::default().file("a", b"a").finish();
        assert_eq!(ContainerFormat::from_magic(&tar), Some(ContainerFormat::Tar));
        assert_eq!(ContainerFormat::from_magic(b"plain text"), None);
    }

    #[test]
    fn extension_takes_precedence_over_magic() {
        let gz = gzip_bytes(b"x");
        assert_eq!(ContainerFormat::detect("odd.zip", &gz), Some(ContainerFormat::Zip));
        assert_eq!(ContainerFormat::detect("blob", &gz), Some(ContainerFormat::Gzip));
    }

    // ===========================================
    // Decoding
    // ===========================================

    #[test]
    fn zip_entries() {
        let zip = zip_bytes(&[
            ("logs/", &b""[..]),
            ("logs/app.log", &b"hello"[..]),
            ("../evil.txt", &b"x"[..]),
        ]);
        let entries = decode("bundle.zip", &Bytes::from(zip)).expect("valid zip");

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].kind, EntryKind::Dir);
        assert_eq!(entries[1].path, "logs/app.log");
        assert_eq!(&entries[1].bytes[..], b"hello");
        assert_eq!(entries[2].path, "evil.txt");
    }

    #[test]
    fn gzip_single_member() {
        let gz = gzip_bytes(b"compressed line\n");
        let entries = decode("app.log.gz", &Bytes::from(gz)).expect("valid gzip");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "app.log");
        assert_eq!(&entries[0].bytes[..], b"compressed line\n");
    }

    #[test]
    fn gzip_wrapping_tar_is_named_tar() {
        let tar = TarBuilder::default().file("a.log", b"a").finish();
        let tgz = Bytes::from(gzip_bytes(&tar));

        let entries = decode("node-1.tgz", &tgz).expect("valid tgz");
        assert_eq!(entries[0].path, "node-1.tar");

        let entries = decode("node-1.tar.gz", &tgz).expect("valid tar.gz");
        assert_eq!(entries[0].path, "node-1.tar");

        let entries = decode("node-1.gz", &tgz).expect("valid gz");
        assert_eq!(entries[0].path, "node-1.tar");
    }

    #[test]
    fn unrecognized_format() {
        let err = decode("notes.bin", &Bytes::from_static(b"just bytes")).expect_err("unknown");
        assert!(matches!(err, ArchiveError::UnrecognizedFormat(name) if name == "notes.bin"));
    }

    #[test]
    fn invalid_zip_is_an_error() {
        let err = decode("fake.zip", &Bytes::from_static(b"not really a zip")).expect_err("bad zip");
        assert!(matches!(err, ArchiveError::Zip(_)));
    }

    #[test]
    fn invalid_gzip_is_an_error() {
        let err = decode("fake.gz", &Bytes::from_static(b"not gzip")).expect_err("bad gzip");
        assert!(matches!(err, ArchiveError::Io(_)));
    }
}
