//! `.pak` container writer.
//!
//! Producer side of the format, used by tooling and tests to build
//! containers the reader can load.

use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use pakrat_core::{AssetData, Error, Result};

use crate::format::{
    kind_tag, AudioMeta, MaterialMeta, MeshMeta, ScriptMeta, ShaderMeta, TextMeta, TextureMeta,
    FLAG_GZIP_PAYLOADS, MAGIC, VERSION,
};

#[derive(Debug)]
struct RawRecord {
    tag: u8,
    object_id: u64,
    name: String,
    meta: Vec<u8>,
    blob: Vec<u8>,
}

/// Builder for `.pak` containers.
#[derive(Debug, Default)]
pub struct PakWriter {
    compress: bool,
    records: Vec<RawRecord>,
}

impl PakWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gzip each non-empty meta and blob section.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Append an asset as a record, deriving the wire form from its kind.
    pub fn add_asset(mut self, object_id: u64, data: &AssetData) -> Result<Self> {
        let name = data.name().unwrap_or_default().to_string();
        let (meta, blob) = encode_sections(data)?;
        self.push_record(kind_tag(data.kind()), object_id, name, meta, blob)?;
        Ok(self)
    }

    /// Append a record with explicit wire fields, bypassing asset encoding.
    ///
    /// Lets tooling write records the current code base does not model,
    /// and lets tests construct malformed meta documents.
    pub fn add_raw_record(
        mut self,
        tag: u8,
        object_id: u64,
        name: &str,
        meta: Vec<u8>,
        blob: Vec<u8>,
    ) -> Result<Self> {
        self.push_record(tag, object_id, name.to_string(), meta, blob)?;
        Ok(self)
    }

    fn push_record(
        &mut self,
        tag: u8,
        object_id: u64,
        name: String,
        meta: Vec<u8>,
        blob: Vec<u8>,
    ) -> Result<()> {
        if name.len() > u16::MAX as usize {
            return Err(Error::Validation(format!(
                "record name is {} bytes, limit is {}",
                name.len(),
                u16::MAX
            )));
        }
        self.records.push(RawRecord {
            tag,
            object_id,
            name,
            meta,
            blob,
        });
        Ok(())
    }

    /// Serialize the container.
    pub fn finish(self) -> Result<Vec<u8>> {
        let flags = if self.compress { FLAG_GZIP_PAYLOADS } else { 0 };

        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.push(flags);
        out.extend_from_slice(&(self.records.len() as u32).to_le_bytes());

        for record in self.records {
            let meta = maybe_deflate(record.meta, self.compress)?;
            let blob = maybe_deflate(record.blob, self.compress)?;

            out.push(record.tag);
            out.extend_from_slice(&record.object_id.to_le_bytes());
            out.extend_from_slice(&(record.name.len() as u16).to_le_bytes());
            out.extend_from_slice(record.name.as_bytes());
            out.extend_from_slice(&(meta.len() as u32).to_le_bytes());
            out.extend_from_slice(&meta);
            out.extend_from_slice(&(blob.len() as u32).to_le_bytes());
            out.extend_from_slice(&blob);
        }

        Ok(out)
    }

    /// Serialize and write the container to disk.
    pub async fn write_to(self, path: &Path) -> Result<()> {
        let bytes = self.finish()?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}

fn encode_sections(data: &AssetData) -> Result<(Vec<u8>, Vec<u8>)> {
    let sections = match data {
        AssetData::Texture(t) => (
            serde_json::to_vec(&TextureMeta {
                width: t.width,
                height: t.height,
            })?,
            t.rgba.clone(),
        ),
        AssetData::Audio(a) => (
            serde_json::to_vec(&AudioMeta {
                channels: a.channels,
                frequency: a.frequency,
                length_secs: a.length_secs,
            })?,
            a.bytes.clone(),
        ),
        AssetData::Mesh(m) => (
            serde_json::to_vec(&MeshMeta {
                vertices: m.vertices.clone(),
                normals: m.normals.clone(),
                uvs: m.uvs.clone(),
                indices: m.indices.clone(),
            })?,
            Vec::new(),
        ),
        AssetData::Text(t) => (
            serde_json::to_vec(&TextMeta {
                content: t.content.clone(),
            })?,
            Vec::new(),
        ),
        AssetData::Script(s) => (
            serde_json::to_vec(&ScriptMeta {
                class_name: s.class_name.clone(),
                namespace: s.namespace.clone(),
                assembly: s.assembly.clone(),
                source: s.source.clone(),
                owner_name: s.owner_name.clone(),
            })?,
            Vec::new(),
        ),
        AssetData::Shader(s) => (
            serde_json::to_vec(&ShaderMeta {
                parsed_form: s.parsed_form.clone(),
                properties: s.properties.clone(),
            })?,
            Vec::new(),
        ),
        AssetData::Material(m) => (
            serde_json::to_vec(&MaterialMeta {
                shader: m.shader.clone(),
                floats: m.floats.clone(),
                colors: m.colors.clone(),
                textures: m.textures.clone(),
            })?,
            Vec::new(),
        ),
        AssetData::Video(v) => (Vec::new(), v.bytes.clone()),
        AssetData::Font(f) => (Vec::new(), f.bytes.clone()),
        AssetData::Other(o) => {
            let meta = if o.value.is_null() {
                Vec::new()
            } else {
                serde_json::to_vec(&o.value)?
            };
            (meta, Vec::new())
        }
    };
    Ok(sections)
}

fn maybe_deflate(bytes: Vec<u8>, compress: bool) -> Result<Vec<u8>> {
    if !compress || bytes.is_empty() {
        return Ok(bytes);
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&bytes)?;
    Ok(encoder.finish()?)
}
