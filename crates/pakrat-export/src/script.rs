//! Script export: decompiled source when present, a reference document
//! otherwise.

use std::path::Path;

use serde_json::json;

use pakrat_core::{Result, ScriptData};

use crate::writer::append_ext;

pub(crate) async fn export(data: &ScriptData, dest: &Path) -> Result<bool> {
    if let Some(source) = data.source.as_deref().filter(|s| !s.is_empty()) {
        tokio::fs::write(append_ext(dest, "cs"), source).await?;
        return Ok(true);
    }

    // No source shipped; record what the bundle knows about the script.
    let meta = json!({
        "name": data.name,
        "class_name": data.class_name,
        "namespace": data.namespace,
        "assembly": data.assembly,
        "owner_name": data.owner_name,
    });
    tokio::fs::write(
        append_ext(dest, "meta.json"),
        serde_json::to_vec_pretty(&meta)?,
    )
    .await?;
    Ok(true)
}
