//! # pakrat-export
//!
//! Per-kind asset writers and result packaging.
//!
//! [`AssetWriter`] implements the engine's exporter seam by dispatching each
//! payload to a writer for its kind; [`TarGzArchiver`] packages a finished
//! work area into the single `.tar.gz` a client downloads.
//!
//! ## Export Contract
//!
//! Writers receive a path *stem* and append the extension they choose, which
//! may depend on the payload bytes (audio and fonts are sniffed, text content
//! is classified). A payload with nothing to write returns `Ok(false)` and
//! leaves the filesystem untouched; per-item failures return `Error::Export`
//! and never abort the surrounding extraction.
//!
//! | Kind     | Output                                        |
//! |----------|-----------------------------------------------|
//! | Texture  | `.png` + `.meta.json` (dimensions)            |
//! | Audio    | `.ogg`/`.wav`/`.flac`/`.mp3`/`.bin` (sniffed) |
//! | Mesh     | `.obj` + `.meta.json` (bounds)                |
//! | Text     | `.json`/`.xml`/`.yaml`/`.txt` (classified)    |
//! | Script   | `.cs`, or `.meta.json` when no source shipped |
//! | Shader   | `.shader` + `.meta.json` (properties)         |
//! | Material | `.mat.json`                                   |
//! | Video    | sniffed container extension, else `.bin`      |
//! | Font     | `.otf`/`.ttf`/`.woff`/`.woff2`/`.bin`         |
//! | Other    | `.json`                                       |

pub mod archive;
pub mod writer;

mod audio;
mod generic;
mod material;
mod media;
mod mesh;
mod script;
mod shader;
mod text;
mod texture;

// Re-export commonly used types
pub use archive::TarGzArchiver;
pub use writer::AssetWriter;
