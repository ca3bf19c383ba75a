//! Opaque media export: fonts and video written as raw bytes with an
//! extension taken from the payload's magic.

use std::path::Path;

use pakrat_core::{MediaData, Result};

use crate::writer::append_ext;

fn font_extension(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"OTTO") {
        "otf"
    } else if bytes.starts_with(&[0x00, 0x01, 0x00, 0x00]) || bytes.starts_with(b"true") {
        "ttf"
    } else if bytes.starts_with(b"wOF2") {
        "woff2"
    } else if bytes.starts_with(b"wOFF") {
        "woff"
    } else {
        "bin"
    }
}

pub(crate) async fn export_font(data: &MediaData, dest: &Path) -> Result<bool> {
    if data.bytes.is_empty() {
        return Ok(false);
    }
    let ext = font_extension(&data.bytes);
    tokio::fs::write(append_ext(dest, ext), &data.bytes).await?;
    Ok(true)
}

pub(crate) async fn export_video(data: &MediaData, dest: &Path) -> Result<bool> {
    if data.bytes.is_empty() {
        return Ok(false);
    }
    // Video containers vary too much for a hand-rolled table.
    let ext = infer::get(&data.bytes).map(|t| t.extension()).unwrap_or("bin");
    tokio::fs::write(append_ext(dest, ext), &data.bytes).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_font_magic_table() {
        assert_eq!(font_extension(b"OTTO...."), "otf");
        assert_eq!(font_extension(&[0x00, 0x01, 0x00, 0x00, 0x00]), "ttf");
        assert_eq!(font_extension(b"true...."), "ttf");
        assert_eq!(font_extension(b"wOFF...."), "woff");
        assert_eq!(font_extension(b"wOF2...."), "woff2");
        assert_eq!(font_extension(b"????"), "bin");
    }

    #[tokio::test]
    async fn test_font_written_with_magic_extension() {
        let dir = tempdir().unwrap();
        let data = MediaData {
            name: "ui".to_string(),
            bytes: b"OTTOrest".to_vec(),
        };
        let wrote = export_font(&data, &dir.path().join("ui")).await.unwrap();
        assert!(wrote);
        assert!(dir.path().join("ui.otf").exists());
    }

    #[tokio::test]
    async fn test_unrecognized_video_lands_as_bin() {
        let dir = tempdir().unwrap();
        let data = MediaData {
            name: "clip".to_string(),
            bytes: vec![0xDE, 0xAD, 0xBE, 0xEF],
        };
        let wrote = export_video(&data, &dir.path().join("clip")).await.unwrap();
        assert!(wrote);
        assert!(dir.path().join("clip.bin").exists());
    }

    #[tokio::test]
    async fn test_empty_media_skips() {
        let dir = tempdir().unwrap();
        let data = MediaData {
            name: "none".to_string(),
            bytes: Vec::new(),
        };
        assert!(!export_font(&data, &dir.path().join("none")).await.unwrap());
        assert!(!export_video(&data, &dir.path().join("none")).await.unwrap());
    }
}
