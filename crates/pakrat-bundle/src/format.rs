//! `.pak` container format constants and record metadata shapes.
//!
//! Binary layout, little-endian:
//!
//! ```text
//! magic      8   b"PAKBNDL1"
//! version    u16
//! flags      u8
//! count      u32
//! records    count x record
//!
//! record:
//!   kind       u8    asset kind tag
//!   object_id  u64
//!   name_len   u16, name bytes (UTF-8, may be empty)
//!   meta_len   u32, meta bytes (JSON document)
//!   blob_len   u32, blob bytes (bulk payload, may be empty)
//! ```
//!
//! The meta document carries the structured fields of the record's kind;
//! the blob carries bulk bytes (texture RGBA, audio samples, font/video
//! containers). With [`FLAG_GZIP_PAYLOADS`] set, every record's meta and
//! blob sections are individually gzip-compressed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pakrat_core::AssetKind;

/// Leading container magic.
pub const MAGIC: &[u8; 8] = b"PAKBNDL1";

/// Current container format version.
pub const VERSION: u16 = 1;

/// Flag bit: record meta/blob sections are gzip-compressed.
pub const FLAG_GZIP_PAYLOADS: u8 = 0b0000_0001;

/// Fixed bytes per record before the variable-length sections.
pub const RECORD_FIXED_LEN: usize = 1 + 8 + 2 + 4 + 4;

/// Header length up to and including the record count.
pub const HEADER_LEN: usize = 8 + 2 + 1 + 4;

/// Wire tag for an asset kind.
pub fn kind_tag(kind: AssetKind) -> u8 {
    match kind {
        AssetKind::Texture => 0,
        AssetKind::Audio => 1,
        AssetKind::Mesh => 2,
        AssetKind::Text => 3,
        AssetKind::Script => 4,
        AssetKind::Shader => 5,
        AssetKind::Material => 6,
        AssetKind::Video => 7,
        AssetKind::Font => 8,
        AssetKind::Other => 9,
    }
}

/// Asset kind for a wire tag. Unknown tags are carried as [`AssetKind::Other`]
/// so newer producers do not break older readers.
pub fn kind_from_tag(tag: u8) -> AssetKind {
    match tag {
        0 => AssetKind::Texture,
        1 => AssetKind::Audio,
        2 => AssetKind::Mesh,
        3 => AssetKind::Text,
        4 => AssetKind::Script,
        5 => AssetKind::Shader,
        6 => AssetKind::Material,
        7 => AssetKind::Video,
        8 => AssetKind::Font,
        _ => AssetKind::Other,
    }
}

// =============================================================================
// RECORD META DOCUMENTS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureMeta {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioMeta {
    pub channels: u16,
    pub frequency: u32,
    pub length_secs: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshMeta {
    pub vertices: Vec<[f32; 3]>,
    #[serde(default)]
    pub normals: Vec<[f32; 3]>,
    #[serde(default)]
    pub uvs: Vec<[f32; 2]>,
    #[serde(default)]
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextMeta {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptMeta {
    pub class_name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub assembly: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub owner_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderMeta {
    pub parsed_form: String,
    #[serde(default)]
    pub properties: Vec<pakrat_core::ShaderProperty>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialMeta {
    pub shader: String,
    #[serde(default)]
    pub floats: BTreeMap<String, f64>,
    #[serde(default)]
    pub colors: BTreeMap<String, [f32; 4]>,
    #[serde(default)]
    pub textures: BTreeMap<String, u64>,
}
