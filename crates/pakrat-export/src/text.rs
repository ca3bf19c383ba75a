//! Text export with a content-sniffed extension.

use std::path::Path;

use pakrat_core::{Result, TextData};

use crate::writer::append_ext;

/// Classify text content by shape: structured formats get their own
/// extension, everything else lands as `.txt`.
fn sniff_extension(content: &str) -> &'static str {
    let trimmed = content.trim_start();
    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
    {
        "json"
    } else if trimmed.starts_with("<?xml") || trimmed.starts_with('<') {
        "xml"
    } else if trimmed.starts_with("%YAML") || trimmed.starts_with("---") {
        "yaml"
    } else {
        "txt"
    }
}

pub(crate) async fn export(data: &TextData, dest: &Path) -> Result<bool> {
    if data.content.is_empty() {
        return Ok(false);
    }
    let ext = sniff_extension(&data.content);
    tokio::fs::write(append_ext(dest, ext), &data.content).await?;
    Ok(true)
}
