//! Asset type vocabulary.
//!
//! `AssetKind` is the closed set of object categories the pipeline
//! understands; `AssetData` is the materialized payload a `TypedObject`
//! yields on read. Everything downstream (inventory, naming, export
//! dispatch) matches over these two types, so adding a category is a
//! compile-visible change.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// KINDS
// =============================================================================

/// Category of an object inside an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Texture,
    Audio,
    Mesh,
    Text,
    Script,
    Shader,
    Material,
    Video,
    Font,
    Other,
}

impl AssetKind {
    /// Every kind, in declaration order.
    pub const ALL: [AssetKind; 10] = [
        AssetKind::Texture,
        AssetKind::Audio,
        AssetKind::Mesh,
        AssetKind::Text,
        AssetKind::Script,
        AssetKind::Shader,
        AssetKind::Material,
        AssetKind::Video,
        AssetKind::Font,
        AssetKind::Other,
    ];

    /// Label used for category directories in the work area.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Texture => "Texture",
            Self::Audio => "Audio",
            Self::Mesh => "Mesh",
            Self::Text => "Text",
            Self::Script => "Script",
            Self::Shader => "Shader",
            Self::Material => "Material",
            Self::Video => "Video",
            Self::Font => "Font",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// =============================================================================
// MATERIALIZED PAYLOADS
// =============================================================================

/// Decoded pixel data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureData {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8; `width * height * 4` bytes.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub rgba: Vec<u8>,
}

/// Audio samples in their container format (ogg/wav/flac/mp3 bytes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioData {
    pub name: String,
    pub channels: u16,
    pub frequency: u32,
    pub length_secs: f32,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub bytes: Vec<u8>,
}

/// Triangle mesh geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<[f32; 3]>,
    #[serde(default)]
    pub normals: Vec<[f32; 3]>,
    #[serde(default)]
    pub uvs: Vec<[f32; 2]>,
    /// Flat triangle list; length is a multiple of 3.
    #[serde(default)]
    pub indices: Vec<u32>,
}

/// Plain text payload (config blobs, dialogue tables, embedded JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextData {
    pub name: String,
    pub content: String,
}

/// Script reference, optionally with source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptData {
    pub name: String,
    pub class_name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub assembly: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,
    /// Name of the object this script is attached to, when known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub owner_name: Option<String>,
}

/// One declared shader property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderProperty {
    pub name: String,
    pub prop_type: String,
    #[serde(default)]
    pub default: serde_json::Value,
}

/// Shader source in its parsed textual form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderData {
    pub name: String,
    pub parsed_form: String,
    #[serde(default)]
    pub properties: Vec<ShaderProperty>,
}

/// Material parameter maps keyed by property name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialData {
    pub name: String,
    pub shader: String,
    #[serde(default)]
    pub floats: BTreeMap<String, f64>,
    #[serde(default)]
    pub colors: BTreeMap<String, [f32; 4]>,
    /// Property name to referenced texture object id.
    #[serde(default)]
    pub textures: BTreeMap<String, u64>,
}

/// Opaque byte payload (video containers, font files).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaData {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub bytes: Vec<u8>,
}

/// Anything outside the known categories, carried as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherData {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    pub value: serde_json::Value,
}

/// A fully materialized object payload, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AssetData {
    Texture(TextureData),
    Audio(AudioData),
    Mesh(MeshData),
    Text(TextData),
    Script(ScriptData),
    Shader(ShaderData),
    Material(MaterialData),
    Video(MediaData),
    Font(MediaData),
    Other(OtherData),
}

impl AssetData {
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Texture(_) => AssetKind::Texture,
            Self::Audio(_) => AssetKind::Audio,
            Self::Mesh(_) => AssetKind::Mesh,
            Self::Text(_) => AssetKind::Text,
            Self::Script(_) => AssetKind::Script,
            Self::Shader(_) => AssetKind::Shader,
            Self::Material(_) => AssetKind::Material,
            Self::Video(_) => AssetKind::Video,
            Self::Font(_) => AssetKind::Font,
            Self::Other(_) => AssetKind::Other,
        }
    }

    /// The explicit name carried by the payload, if any and non-empty.
    pub fn name(&self) -> Option<&str> {
        let name = match self {
            Self::Texture(d) => d.name.as_str(),
            Self::Audio(d) => d.name.as_str(),
            Self::Mesh(d) => d.name.as_str(),
            Self::Text(d) => d.name.as_str(),
            Self::Script(d) => d.name.as_str(),
            Self::Shader(d) => d.name.as_str(),
            Self::Material(d) => d.name.as_str(),
            Self::Video(d) => d.name.as_str(),
            Self::Font(d) => d.name.as_str(),
            Self::Other(d) => return d.name.as_deref().filter(|n| !n.is_empty()),
        };
        (!name.is_empty()).then_some(name)
    }

    /// Name of the owning object, for payloads attached to another object.
    pub fn owner_name(&self) -> Option<&str> {
        match self {
            Self::Script(d) => d.owner_name.as_deref().filter(|n| !n.is_empty()),
            _ => None,
        }
    }

    /// Declared class name, for script-like payloads.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Self::Script(d) => (!d.class_name.is_empty()).then_some(d.class_name.as_str()),
            _ => None,
        }
    }

    /// Rough size in bytes an export of this payload will occupy.
    ///
    /// Approximates what the kind's exporter writes: raw pixel bytes for
    /// textures (an upper bound on the encoded file), container bytes for
    /// media, generated geometry text for meshes, serialized JSON for
    /// structured payloads.
    pub fn estimated_export_size(&self) -> u64 {
        match self {
            Self::Texture(d) => (d.width as u64) * (d.height as u64) * 4,
            Self::Audio(d) => d.bytes.len() as u64,
            Self::Video(d) | Self::Font(d) => d.bytes.len() as u64,
            Self::Mesh(d) => {
                // Per-line text costs: "v x y z\n" ~36, "vn/vt" similar,
                // one face line per triangle ~24.
                let verts = d.vertices.len() as u64 * 36;
                let normals = d.normals.len() as u64 * 36;
                let uvs = d.uvs.len() as u64 * 24;
                let faces = (d.indices.len() as u64 / 3) * 24;
                verts + normals + uvs + faces
            }
            Self::Text(d) => d.content.len() as u64,
            Self::Script(d) => d
                .source
                .as_ref()
                .map(|s| s.len() as u64)
                .unwrap_or(256),
            Self::Shader(d) => d.parsed_form.len() as u64 + d.properties.len() as u64 * 32,
            Self::Material(d) => serde_json::to_string(d)
                .map(|s| s.len() as u64)
                .unwrap_or(0),
            Self::Other(d) => d.value.to_string().len() as u64,
        }
    }
}
