//! Fallback export for uncategorized payloads.

use std::path::Path;

use pakrat_core::{OtherData, Result};

use crate::writer::append_ext;

pub(crate) async fn export(data: &OtherData, dest: &Path) -> Result<bool> {
    if data.value.is_null() {
        return Ok(false);
    }
    tokio::fs::write(
        append_ext(dest, "json"),
        serde_json::to_vec_pretty(&data.value)?,
    )
    .await?;
    Ok(true)
}
