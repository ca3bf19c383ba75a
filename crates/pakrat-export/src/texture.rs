//! Texture export: RGBA pixels to PNG plus a sidecar meta document.

use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use serde_json::json;

use pakrat_core::{Error, Result, TextureData};

use crate::writer::append_ext;

pub(crate) async fn export(data: &TextureData, dest: &Path) -> Result<bool> {
    if data.rgba.is_empty() || data.width == 0 || data.height == 0 {
        return Ok(false);
    }

    let expected = (data.width as usize) * (data.height as usize) * 4;
    if data.rgba.len() != expected {
        return Err(Error::Export(format!(
            "texture '{}' carries {} pixel bytes, expected {expected}",
            data.name,
            data.rgba.len()
        )));
    }

    let mut encoded = Vec::new();
    let encoder = PngEncoder::new(&mut encoded);
    encoder
        .write_image(&data.rgba, data.width, data.height, ColorType::Rgba8.into())
        .map_err(|e| Error::Export(format!("png encoding failed for '{}': {e}", data.name)))?;
    tokio::fs::write(append_ext(dest, "png"), &encoded).await?;

    let meta = json!({
        "name": data.name,
        "width": data.width,
        "height": data.height,
    });
    tokio::fs::write(
        append_ext(dest, "meta.json"),
        serde_json::to_vec_pretty(&meta)?,
    )
    .await?;

    Ok(true)
}
