//! Kind-dispatching exporter behind the engine's [`AssetExporter`] seam.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use pakrat_core::{AssetData, AssetExporter, Result};

/// Production exporter: routes each payload to its kind's writer.
///
/// Every arm honors the same contract: `dest` is a path stem, the writer
/// appends the extension it chooses, and an empty payload returns
/// `Ok(false)` without touching the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetWriter;

impl AssetWriter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AssetExporter for AssetWriter {
    async fn export(&self, data: &AssetData, dest: &Path) -> Result<bool> {
        match data {
            AssetData::Texture(d) => crate::texture::export(d, dest).await,
            AssetData::Audio(d) => crate::audio::export(d, dest).await,
            AssetData::Mesh(d) => crate::mesh::export(d, dest).await,
            AssetData::Text(d) => crate::text::export(d, dest).await,
            AssetData::Script(d) => crate::script::export(d, dest).await,
            AssetData::Shader(d) => crate::shader::export(d, dest).await,
            AssetData::Material(d) => crate::material::export(d, dest).await,
            AssetData::Video(d) => crate::media::export_video(d, dest).await,
            AssetData::Font(d) => crate::media::export_font(d, dest).await,
            AssetData::Other(d) => crate::generic::export(d, dest).await,
        }
    }
}

/// Append `.ext` to a stem without clobbering dots already in the name.
///
/// `Path::with_extension` would turn `settings.v2` into `settings.json`;
/// exported names keep their dots.
pub(crate) fn append_ext(stem: &Path, ext: &str) -> PathBuf {
    let mut os: OsString = stem.as_os_str().to_owned();
    os.push(".");
    os.push(ext);
    PathBuf::from(os)
}
