//! Artifact fingerprinting.
//!
//! Captures the filesystem-level facts recorded in the artifact descriptor:
//! size, a hex signature of the leading header bytes, and the compression
//! scheme guessed from magic bytes (with `infer` as a fallback witness that
//! the header belongs to a known uncompressed format).

use std::io::Read;
use std::path::Path;

use crate::defaults::SIGNATURE_HEADER_LEN;
use crate::error::Result;
use crate::models::CompressionKind;

/// Compression magic bytes checked before falling back to `infer`.
const COMPRESSION_MAGICS: &[(CompressionKind, &[u8])] = &[
    (CompressionKind::Gzip, &[0x1F, 0x8B]),
    (CompressionKind::Zstd, &[0x28, 0xB5, 0x2F, 0xFD]),
];

/// Filesystem-level facts about an artifact file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub size_bytes: u64,
    /// Hex of the first header bytes (shorter for tiny files).
    pub signature_hex: String,
    pub compression: CompressionKind,
}

/// Guess the compression scheme from a file header.
pub fn detect_compression(header: &[u8]) -> CompressionKind {
    if header.is_empty() {
        return CompressionKind::Unknown;
    }

    for (kind, magic) in COMPRESSION_MAGICS {
        if header.len() >= magic.len() && &header[..magic.len()] == *magic {
            return *kind;
        }
    }

    // Zlib streams start with 0x78 and a level-dependent second byte.
    if header.len() >= 2 && header[0] == 0x78 && matches!(header[1], 0x01 | 0x5E | 0x9C | 0xDA) {
        return CompressionKind::Zlib;
    }

    // A header infer recognizes is a known format stored uncompressed.
    if infer::get(header).is_some() {
        return CompressionKind::None;
    }

    // Printable headers (custom container magics) count as uncompressed too.
    if header.iter().all(|b| b.is_ascii_graphic() || *b == 0) {
        return CompressionKind::None;
    }

    CompressionKind::Unknown
}

/// Read the fingerprint of an artifact file.
pub fn read_fingerprint(path: &Path) -> Result<Fingerprint> {
    let size_bytes = std::fs::metadata(path)?.len();

    let mut header = vec![0u8; SIGNATURE_HEADER_LEN];
    let mut file = std::fs::File::open(path)?;
    let mut read = 0;
    while read < header.len() {
        let n = file.read(&mut header[read..])?;
        if n == 0 {
            break;
        }
        read += n;
    }
    header.truncate(read);

    Ok(Fingerprint {
        size_bytes,
        signature_hex: hex::encode(&header),
        compression: detect_compression(&header),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_detect_gzip() {
        assert_eq!(
            detect_compression(&[0x1F, 0x8B, 0x08, 0x00]),
            CompressionKind::Gzip
        );
    }

    #[test]
    fn test_detect_zlib_levels() {
        for second in [0x01, 0x5E, 0x9C, 0xDA] {
            assert_eq!(
                detect_compression(&[0x78, second, 0x00]),
                CompressionKind::Zlib,
                "second byte {second:#x}"
            );
        }
        assert_ne!(detect_compression(&[0x78, 0x02]), CompressionKind::Zlib);
    }

    #[test]
    fn test_detect_zstd() {
        assert_eq!(
            detect_compression(&[0x28, 0xB5, 0x2F, 0xFD, 0x00]),
            CompressionKind::Zstd
        );
    }

    #[test]
    fn test_known_format_counts_as_uncompressed() {
        // PNG magic — a recognizable uncompressed container header.
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_compression(&png), CompressionKind::None);
    }

    #[test]
    fn test_printable_magic_counts_as_uncompressed() {
        assert_eq!(detect_compression(b"PAKBNDL1"), CompressionKind::None);
    }

    #[test]
    fn test_garbage_is_unknown() {
        assert_eq!(
            detect_compression(&[0xDE, 0xAD, 0xBE, 0xEF]),
            CompressionKind::Unknown
        );
        assert_eq!(detect_compression(&[]), CompressionKind::Unknown);
    }

    #[test]
    fn test_read_fingerprint() {
        let file = write_temp(b"PAKBNDL1rest-of-container");
        let fp = read_fingerprint(file.path()).unwrap();
        assert_eq!(fp.size_bytes, 25);
        assert_eq!(fp.signature_hex, hex::encode(b"PAKBNDL1"));
        assert_eq!(fp.compression, CompressionKind::None);
    }

    #[test]
    fn test_read_fingerprint_short_file() {
        let file = write_temp(b"ab");
        let fp = read_fingerprint(file.path()).unwrap();
        assert_eq!(fp.size_bytes, 2);
        assert_eq!(fp.signature_hex, hex::encode(b"ab"));
    }

    #[test]
    fn test_read_fingerprint_empty_file() {
        let file = write_temp(b"");
        let fp = read_fingerprint(file.path()).unwrap();
        assert_eq!(fp.size_bytes, 0);
        assert!(fp.signature_hex.is_empty());
        assert_eq!(fp.compression, CompressionKind::Unknown);
    }

    #[test]
    fn test_read_fingerprint_missing_file() {
        let result = read_fingerprint(Path::new("/nonexistent/artifact.pak"));
        assert!(result.is_err());
    }
}
