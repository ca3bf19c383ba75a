//! Collaborator seams between the orchestration engine and format code.
//!
//! The engine never links against a concrete container parser, exporter, or
//! archiver; it consumes these traits. Production wiring hands it the `.pak`
//! reader and the kind-dispatching writer, tests hand it scripted doubles.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::assets::{AssetData, AssetKind};
use crate::error::Result;
use crate::models::{ArchiveInfo, ContainerInfo};

/// Opens artifacts and yields a queryable environment.
#[async_trait]
pub trait ArtifactParser: Send + Sync {
    /// Parse the artifact at `path`.
    ///
    /// Fails with `Error::Parse` when the container is malformed; individual
    /// object payload problems must surface later, from `TypedObject::read`.
    async fn load(&self, path: &Path) -> Result<Box<dyn ArtifactEnvironment>>;
}

/// A parsed artifact: container facts plus its typed objects.
pub trait ArtifactEnvironment: Send + Sync {
    /// Format label and version of the opened container.
    fn container_info(&self) -> ContainerInfo;

    /// Every object in the container, in container order.
    fn objects(&self) -> Vec<Arc<dyn TypedObject>>;
}

impl std::fmt::Debug for dyn ArtifactEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactEnvironment").finish_non_exhaustive()
    }
}

/// One enumerable object inside an artifact.
///
/// `read` materializes the payload on demand; a failure is scoped to this
/// object (`Error::ObjectRead`) and must not prevent enumerating or reading
/// the others.
pub trait TypedObject: Send + Sync {
    fn kind(&self) -> AssetKind;

    /// Container-unique object id.
    fn object_id(&self) -> u64;

    fn read(&self) -> Result<AssetData>;
}

/// Writes one materialized payload to the work area.
#[async_trait]
pub trait AssetExporter: Send + Sync {
    /// Write `data` using `dest` as the path stem (the exporter appends the
    /// extension it chooses).
    ///
    /// Returns `Ok(true)` when a file was written, `Ok(false)` when the
    /// payload had nothing to write (empty content). Errors and `Ok(false)`
    /// are both per-item outcomes, never fatal to the extraction.
    async fn export(&self, data: &AssetData, dest: &Path) -> Result<bool>;
}

/// Packages an extraction work area into a downloadable archive.
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Package everything under `source_dir` into `{dest_stem}.tar.gz`.
    ///
    /// `dest_stem` must not point inside `source_dir`.
    async fn package(&self, source_dir: &Path, dest_stem: &Path) -> Result<ArchiveInfo>;
}
