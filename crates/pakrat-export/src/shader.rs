//! Shader export: parsed source plus a property table when declared.

use std::path::Path;

use serde_json::json;

use pakrat_core::{Result, ShaderData};

use crate::writer::append_ext;

pub(crate) async fn export(data: &ShaderData, dest: &Path) -> Result<bool> {
    let has_source = !data.parsed_form.is_empty();
    let has_properties = !data.properties.is_empty();
    if !has_source && !has_properties {
        return Ok(false);
    }

    if has_source {
        tokio::fs::write(append_ext(dest, "shader"), &data.parsed_form).await?;
    }
    if has_properties {
        let meta = json!({
            "name": data.name,
            "properties": data.properties,
        });
        tokio::fs::write(
            append_ext(dest, "meta.json"),
            serde_json::to_vec_pretty(&meta)?,
        )
        .await?;
    }

    Ok(true)
}
