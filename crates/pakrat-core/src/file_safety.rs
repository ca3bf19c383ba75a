//! Filename safety and artifact extension rules.
//!
//! Submissions arrive with client-supplied names; everything that touches the
//! filesystem goes through [`sanitize_filename`] first. The extension sets
//! decide which staged files participate in a job and which one is the
//! artifact handed to the parser.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::defaults::FILENAME_MAX_LENGTH;
use crate::models::StagedFile;

/// Extensions accepted in a submission (case-insensitive).
static ALLOWED_ARTIFACT_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["pak", "bundle", "assets", "unity3d", "data", "bin", "bytes"]
        .into_iter()
        .collect()
});

/// Extensions that mark the primary artifact handed to the parser.
/// `data`/`bin`/`bytes` files ride along as companions only.
static PRIMARY_ARTIFACT_EXTENSIONS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["pak", "bundle", "assets", "unity3d"].into_iter().collect());

/// Lowercase extension of a file name, if it has one.
pub fn file_extension(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Whether the file may be part of a submission at all.
pub fn is_allowed_artifact(name: &str) -> bool {
    file_extension(name)
        .map(|ext| ALLOWED_ARTIFACT_EXTENSIONS.contains(ext.as_str()))
        .unwrap_or(false)
}

/// Whether the file qualifies as the artifact to parse.
pub fn is_primary_artifact(name: &str) -> bool {
    file_extension(name)
        .map(|ext| PRIMARY_ARTIFACT_EXTENSIONS.contains(ext.as_str()))
        .unwrap_or(false)
}

/// First staged file that qualifies as the artifact to parse.
pub fn pick_primary(files: &[StagedFile]) -> Option<&StagedFile> {
    files.iter().find(|f| is_primary_artifact(&f.name))
}

/// Sanitize a filename for safe storage.
pub fn sanitize_filename(filename: &str) -> String {
    // Remove path components
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    // Replace filesystem-hostile characters
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    // Ensure not empty and not too long
    let sanitized = sanitized.trim().trim_matches('.');
    if sanitized.is_empty() {
        return "unnamed".to_string();
    }

    // Truncate if too long (preserve extension)
    if sanitized.len() > FILENAME_MAX_LENGTH {
        if let Some(dot_pos) = sanitized.rfind('.') {
            let ext = &sanitized[dot_pos..];
            if ext.len() < FILENAME_MAX_LENGTH {
                let name = &sanitized[..FILENAME_MAX_LENGTH - ext.len()];
                return format!("{}{}", name, ext);
            }
        }
        return sanitized[..FILENAME_MAX_LENGTH].to_string();
    }

    sanitized.to_string()
}

/// Sanitized stem (name without extension) for archive and export naming.
pub fn sanitize_stem(filename: &str) -> String {
    let sanitized = sanitize_filename(filename);
    match sanitized.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => sanitized,
    }
}
