//! `.pak` container reader.
//!
//! The record table is parsed eagerly with bounds checks, so a malformed
//! container fails the whole load with `Error::Parse`. Record payloads stay
//! raw until [`TypedObject::read`], so one corrupt meta document fails only
//! that object and the rest of the container remains readable.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

use pakrat_core::{
    ArtifactEnvironment, ArtifactParser, AssetData, AssetKind, AudioData, ContainerInfo, Error,
    MaterialData, MediaData, MeshData, OtherData, Result, ScriptData, ShaderData, TextData,
    TextureData, TypedObject,
};

use crate::format::{
    kind_from_tag, AudioMeta, MaterialMeta, MeshMeta, ScriptMeta, ShaderMeta, TextMeta,
    TextureMeta, FLAG_GZIP_PAYLOADS, MAGIC, VERSION,
};

/// Parser for the native `.pak` container format.
#[derive(Debug, Clone, Copy, Default)]
pub struct PakReader;

impl PakReader {
    pub fn new() -> Self {
        Self
    }

    /// Parse a container from memory.
    pub fn parse_bytes(bytes: &[u8]) -> Result<PakEnvironment> {
        PakEnvironment::parse(bytes)
    }
}

#[async_trait]
impl ArtifactParser for PakReader {
    async fn load(&self, path: &Path) -> Result<Box<dyn ArtifactEnvironment>> {
        let bytes = tokio::fs::read(path).await?;
        let env = PakEnvironment::parse(&bytes)?;
        debug!(
            objects = env.objects.len(),
            version = env.version,
            "Parsed pak container"
        );
        Ok(Box::new(env))
    }
}

/// A parsed `.pak` container.
#[derive(Debug)]
pub struct PakEnvironment {
    version: u16,
    objects: Vec<Arc<PakObject>>,
}

impl PakEnvironment {
    /// Parse the header and record table.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);

        let magic = cursor.take(MAGIC.len(), "magic")?;
        if magic != MAGIC {
            return Err(Error::Parse("bad container magic".to_string()));
        }

        let version = cursor.read_u16("version")?;
        if version == 0 || version > VERSION {
            return Err(Error::Parse(format!(
                "unsupported container version {version}"
            )));
        }

        let flags = cursor.read_u8("flags")?;
        let compressed = flags & FLAG_GZIP_PAYLOADS != 0;
        let count = cursor.read_u32("record count")? as usize;

        let mut objects = Vec::with_capacity(count.min(4_096));
        for _ in 0..count {
            let record = parse_record(&mut cursor, compressed)?;
            objects.push(Arc::new(record));
        }

        if cursor.remaining() != 0 {
            return Err(Error::Parse(format!(
                "{} trailing bytes after record table",
                cursor.remaining()
            )));
        }

        Ok(Self { version, objects })
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ArtifactEnvironment for PakEnvironment {
    fn container_info(&self) -> ContainerInfo {
        ContainerInfo {
            format: "pak".to_string(),
            version: self.version,
        }
    }

    fn objects(&self) -> Vec<Arc<dyn TypedObject>> {
        self.objects
            .iter()
            .map(|o| o.clone() as Arc<dyn TypedObject>)
            .collect()
    }
}

/// One record frame; payload sections stay raw until `read`.
#[derive(Debug)]
pub struct PakObject {
    kind: AssetKind,
    object_id: u64,
    name: String,
    meta: Vec<u8>,
    blob: Vec<u8>,
    compressed: bool,
}

impl PakObject {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn meta_bytes(&self) -> Result<Vec<u8>> {
        inflate_section(&self.meta, self.compressed, self.object_id, "meta")
    }

    fn blob_bytes(&self) -> Result<Vec<u8>> {
        inflate_section(&self.blob, self.compressed, self.object_id, "blob")
    }

    fn decode_meta<T: serde::de::DeserializeOwned>(&self, meta: &[u8]) -> Result<T> {
        if meta.is_empty() {
            return Err(Error::ObjectRead(format!(
                "object {} ({}) has no meta document",
                self.object_id, self.kind
            )));
        }
        serde_json::from_slice(meta).map_err(|e| {
            Error::ObjectRead(format!(
                "object {} ({}) meta is not valid JSON: {e}",
                self.object_id, self.kind
            ))
        })
    }
}

impl TypedObject for PakObject {
    fn kind(&self) -> AssetKind {
        self.kind
    }

    fn object_id(&self) -> u64 {
        self.object_id
    }

    fn read(&self) -> Result<AssetData> {
        let meta = self.meta_bytes()?;
        let name = self.name.clone();

        let data = match self.kind {
            AssetKind::Texture => {
                let m: TextureMeta = self.decode_meta(&meta)?;
                let rgba = self.blob_bytes()?;
                let expected = (m.width as usize) * (m.height as usize) * 4;
                if !rgba.is_empty() && rgba.len() != expected {
                    return Err(Error::ObjectRead(format!(
                        "object {} texture blob is {} bytes, expected {expected}",
                        self.object_id,
                        rgba.len()
                    )));
                }
                AssetData::Texture(TextureData {
                    name,
                    width: m.width,
                    height: m.height,
                    rgba,
                })
            }
            AssetKind::Audio => {
                let m: AudioMeta = self.decode_meta(&meta)?;
                AssetData::Audio(AudioData {
                    name,
                    channels: m.channels,
                    frequency: m.frequency,
                    length_secs: m.length_secs,
                    bytes: self.blob_bytes()?,
                })
            }
            AssetKind::Mesh => {
                let m: MeshMeta = self.decode_meta(&meta)?;
                AssetData::Mesh(MeshData {
                    name,
                    vertices: m.vertices,
                    normals: m.normals,
                    uvs: m.uvs,
                    indices: m.indices,
                })
            }
            AssetKind::Text => {
                let m: TextMeta = self.decode_meta(&meta)?;
                AssetData::Text(TextData {
                    name,
                    content: m.content,
                })
            }
            AssetKind::Script => {
                let m: ScriptMeta = self.decode_meta(&meta)?;
                AssetData::Script(ScriptData {
                    name,
                    class_name: m.class_name,
                    namespace: m.namespace,
                    assembly: m.assembly,
                    source: m.source,
                    owner_name: m.owner_name,
                })
            }
            AssetKind::Shader => {
                let m: ShaderMeta = self.decode_meta(&meta)?;
                AssetData::Shader(ShaderData {
                    name,
                    parsed_form: m.parsed_form,
                    properties: m.properties,
                })
            }
            AssetKind::Material => {
                let m: MaterialMeta = self.decode_meta(&meta)?;
                AssetData::Material(MaterialData {
                    name,
                    shader: m.shader,
                    floats: m.floats,
                    colors: m.colors,
                    textures: m.textures,
                })
            }
            AssetKind::Video => AssetData::Video(MediaData {
                name,
                bytes: self.blob_bytes()?,
            }),
            AssetKind::Font => AssetData::Font(MediaData {
                name,
                bytes: self.blob_bytes()?,
            }),
            AssetKind::Other => {
                let value = if meta.is_empty() {
                    serde_json::Value::Null
                } else {
                    serde_json::from_slice(&meta).map_err(|e| {
                        Error::ObjectRead(format!(
                            "object {} meta is not valid JSON: {e}",
                            self.object_id
                        ))
                    })?
                };
                AssetData::Other(OtherData {
                    name: (!name.is_empty()).then_some(name),
                    value,
                })
            }
        };

        Ok(data)
    }
}

fn parse_record(cursor: &mut Cursor<'_>, compressed: bool) -> Result<PakObject> {
    let tag = cursor.read_u8("record kind")?;
    let object_id = cursor.read_u64("object id")?;

    let name_len = cursor.read_u16("name length")? as usize;
    let name_bytes = cursor.take(name_len, "name")?;
    let name = String::from_utf8_lossy(name_bytes).into_owned();

    let meta_len = cursor.read_u32("meta length")? as usize;
    let meta = cursor.take(meta_len, "meta")?.to_vec();

    let blob_len = cursor.read_u32("blob length")? as usize;
    let blob = cursor.take(blob_len, "blob")?.to_vec();

    Ok(PakObject {
        kind: kind_from_tag(tag),
        object_id,
        name,
        meta,
        blob,
        compressed,
    })
}

fn inflate_section(bytes: &[u8], compressed: bool, object_id: u64, what: &str) -> Result<Vec<u8>> {
    if !compressed || bytes.is_empty() {
        return Ok(bytes.to_vec());
    }
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(|e| {
        Error::ObjectRead(format!("object {object_id} {what} failed to inflate: {e}"))
    })?;
    Ok(out)
}

/// Bounds-checked byte cursor.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::Parse(format!(
                "truncated container: {what} needs {n} bytes at offset {}, {} left",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn read_u16(&mut self, what: &str) -> Result<u16> {
        let b = self.take(2, what)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self, what: &str) -> Result<u32> {
        let b = self.take(4, what)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u64(&mut self, what: &str) -> Result<u64> {
        let b = self.take(8, what)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }
}
