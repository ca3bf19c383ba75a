//! # pakrat-core
//!
//! Core types, traits, and abstractions for the pakrat asset-bundle service.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other pakrat crates depend on: the job lifecycle model, the asset
//! vocabulary, the collaborator seams (parser, exporter, archiver), and the
//! shared configuration/logging/error plumbing.

pub mod artifact;
pub mod assets;
pub mod config;
pub mod defaults;
pub mod error;
pub mod file_safety;
pub mod fingerprint;
pub mod logging;
pub mod models;
pub mod naming;

// Re-export commonly used types at crate root
pub use artifact::{ArtifactEnvironment, ArtifactParser, Archiver, AssetExporter, TypedObject};
pub use assets::{
    AssetData, AssetKind, AudioData, MaterialData, MediaData, MeshData, OtherData, ScriptData,
    ShaderData, ShaderProperty, TextData, TextureData,
};
pub use config::{EngineConfig, StorageConfig};
pub use error::{Error, Result};
pub use file_safety::{
    is_allowed_artifact, is_primary_artifact, pick_primary, sanitize_filename, sanitize_stem,
};
pub use fingerprint::{detect_compression, read_fingerprint, Fingerprint};
pub use models::*;
pub use naming::{derive_name, synthetic_name, NameContext};
