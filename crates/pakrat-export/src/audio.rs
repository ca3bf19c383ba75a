//! Audio export: container bytes written under a sniffed extension.

use std::path::Path;

use pakrat_core::{AudioData, Result};

use crate::writer::append_ext;

/// Pick an extension from the payload's own magic.
///
/// The bundle stores audio in whatever container it shipped with, so the
/// bytes, not the declared meta, decide the extension.
fn sniff_extension(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"OggS") {
        "ogg"
    } else if bytes.starts_with(b"RIFF") {
        "wav"
    } else if bytes.starts_with(b"fLaC") {
        "flac"
    } else if bytes.starts_with(b"ID3")
        || (bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0)
    {
        "mp3"
    } else {
        "bin"
    }
}

pub(crate) async fn export(data: &AudioData, dest: &Path) -> Result<bool> {
    if data.bytes.is_empty() {
        return Ok(false);
    }
    let ext = sniff_extension(&data.bytes);
    tokio::fs::write(append_ext(dest, ext), &data.bytes).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sniffs_known_containers() {
        assert_eq!(sniff_extension(b"OggS...."), "ogg");
        assert_eq!(sniff_extension(b"RIFF....WAVE"), "wav");
        assert_eq!(sniff_extension(b"fLaC...."), "flac");
        assert_eq!(sniff_extension(b"ID3\x03...."), "mp3");
        assert_eq!(sniff_extension(&[0xFF, 0xFB, 0x90]), "mp3");
        assert_eq!(sniff_extension(b"????"), "bin");
    }

    #[tokio::test]
    async fn test_writes_with_sniffed_extension() {
        let dir = tempdir().unwrap();
        let data = AudioData {
            name: "step".to_string(),
            channels: 1,
            frequency: 22_050,
            length_secs: 0.2,
            bytes: b"OggS fake".to_vec(),
        };
        let wrote = export(&data, &dir.path().join("step")).await.unwrap();
        assert!(wrote);
        assert!(dir.path().join("step.ogg").exists());
    }

    #[tokio::test]
    async fn test_empty_bytes_skip() {
        let dir = tempdir().unwrap();
        let data = AudioData {
            name: "silent".to_string(),
            channels: 0,
            frequency: 0,
            length_secs: 0.0,
            bytes: Vec::new(),
        };
        assert!(!export(&data, &dir.path().join("silent")).await.unwrap());
    }
}
