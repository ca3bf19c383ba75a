//! # pakrat-bundle
//!
//! Native `.pak` asset-bundle container support for pakrat.
//!
//! This crate provides the reference parser behind the engine's
//! [`ArtifactParser`] seam, plus a writer so tooling and tests can
//! produce containers without external fixtures.
//!
//! ## Container Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │ Magic: "PAKBNDL1" (8 bytes)                     │
//! ├─────────────────────────────────────────────────┤
//! │ Version: u16 LE (2 bytes)                       │
//! ├─────────────────────────────────────────────────┤
//! │ Flags: u8 (bit 0 = gzip payload sections)       │
//! ├─────────────────────────────────────────────────┤
//! │ Record Count: u32 LE (4 bytes)                  │
//! ├─────────────────────────────────────────────────┤
//! │ Records: kind u8, object id u64 LE,             │
//! │   name (u16 LE length + UTF-8 bytes),           │
//! │   meta (u32 LE length + JSON bytes),            │
//! │   blob (u32 LE length + raw bytes)              │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. When the gzip flag is set, each
//! non-empty meta and blob section is an independent gzip stream; the
//! record framing itself is never compressed.
//!
//! ## Examples
//!
//! ### Build and Parse a Container
//!
//! ```rust
//! use pakrat_bundle::{PakReader, PakWriter};
//! use pakrat_core::{ArtifactEnvironment, AssetData, AssetKind, TextData, TypedObject};
//!
//! let bytes = PakWriter::new()
//!     .add_asset(
//!         42,
//!         &AssetData::Text(TextData {
//!             name: "readme".to_string(),
//!             content: "hello".to_string(),
//!         }),
//!     )
//!     .unwrap()
//!     .finish()
//!     .unwrap();
//!
//! let env = PakReader::parse_bytes(&bytes).unwrap();
//! assert_eq!(env.len(), 1);
//!
//! let objects = env.objects();
//! assert_eq!(objects[0].kind(), AssetKind::Text);
//! assert_eq!(objects[0].object_id(), 42);
//! ```
//!
//! [`ArtifactParser`]: pakrat_core::ArtifactParser

pub mod format;
pub mod reader;
pub mod writer;

// Re-export commonly used types
pub use format::{kind_from_tag, kind_tag, FLAG_GZIP_PAYLOADS, MAGIC, VERSION};
pub use reader::{PakEnvironment, PakObject, PakReader};
pub use writer::PakWriter;
