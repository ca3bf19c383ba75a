//! Material export: the full parameter set as one JSON document.

use std::path::Path;

use pakrat_core::{MaterialData, Result};

use crate::writer::append_ext;

pub(crate) async fn export(data: &MaterialData, dest: &Path) -> Result<bool> {
    let empty = data.shader.is_empty()
        && data.floats.is_empty()
        && data.colors.is_empty()
        && data.textures.is_empty();
    if empty {
        return Ok(false);
    }

    tokio::fs::write(
        append_ext(dest, "mat.json"),
        serde_json::to_vec_pretty(data)?,
    )
    .await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_writes_full_parameter_set() {
        let dir = tempdir().unwrap();
        let mut floats = BTreeMap::new();
        floats.insert("_Metallic".to_string(), 0.25);
        let data = MaterialData {
            name: "barrel".to_string(),
            shader: "Standard".to_string(),
            floats,
            colors: BTreeMap::new(),
            textures: BTreeMap::new(),
        };

        let wrote = export(&data, &dir.path().join("barrel")).await.unwrap();
        assert!(wrote);

        let doc: serde_json::Value =
            serde_json::from_slice(&std::fs::read(dir.path().join("barrel.mat.json")).unwrap())
                .unwrap();
        assert_eq!(doc["shader"], "Standard");
        assert_eq!(doc["floats"]["_Metallic"], 0.25);
    }

    #[tokio::test]
    async fn test_parameterless_material_skips() {
        let dir = tempdir().unwrap();
        let data = MaterialData {
            name: "void".to_string(),
            shader: String::new(),
            floats: BTreeMap::new(),
            colors: BTreeMap::new(),
            textures: BTreeMap::new(),
        };
        assert!(!export(&data, &dir.path().join("void")).await.unwrap());
    }
}
