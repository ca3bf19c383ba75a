//! Result packaging: a work area becomes one `.tar.gz` download.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use tracing::debug;

use pakrat_core::{ArchiveInfo, Archiver, Error, Result};

use crate::writer::append_ext;

/// Packages a directory tree into a gzip-compressed tarball.
///
/// Entries are added in sorted path order with a fixed `0644` mode, so the
/// same work area always produces the same member list.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarGzArchiver;

impl TarGzArchiver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Archiver for TarGzArchiver {
    async fn package(&self, source_dir: &Path, dest_stem: &Path) -> Result<ArchiveInfo> {
        let archive_path = append_ext(dest_stem, "tar.gz");
        if archive_path.starts_with(source_dir) {
            return Err(Error::Archive(format!(
                "archive {} would land inside the directory being packaged",
                archive_path.display()
            )));
        }

        let info = tokio::task::spawn_blocking({
            let source = source_dir.to_path_buf();
            let dest = archive_path.clone();
            move || build_archive(&source, &dest)
        })
        .await
        .map_err(|e| Error::Internal(format!("archive task panicked: {e}")))??;

        debug!(
            archive = %info.path.display(),
            size_bytes = info.size_bytes,
            "Packaged work area"
        );
        Ok(info)
    }
}

fn build_archive(source_dir: &Path, archive_path: &Path) -> Result<ArchiveInfo> {
    let mut files = Vec::new();
    collect_files(source_dir, source_dir, &mut files)?;

    let file = std::fs::File::create(archive_path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (abs, rel) in &files {
        let mut reader = std::fs::File::open(abs)?;
        let meta = reader.metadata()?;
        let mtime = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut header = tar::Header::new_gnu();
        header.set_size(meta.len());
        header.set_mode(0o644);
        header.set_mtime(mtime);
        builder.append_data(&mut header, rel, &mut reader)?;
    }

    let encoder = builder.into_inner()?;
    encoder.finish()?;

    let size_bytes = std::fs::metadata(archive_path)?.len();
    let sha256 = hash_file(archive_path)?;
    let file_name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(ArchiveInfo {
        path: archive_path.to_path_buf(),
        file_name,
        size_bytes,
        sha256,
    })
}

/// Depth-first walk collecting `(absolute, relative)` file pairs, each
/// directory's entries visited in name order.
fn collect_files(root: &Path, dir: &Path, out: &mut Vec<(PathBuf, PathBuf)>) -> Result<()> {
    let mut entries = std::fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(root, &path, out)?;
        } else if file_type.is_file() {
            let rel = path
                .strip_prefix(root)
                .map_err(|e| Error::Archive(format!("unrooted entry {}: {e}", path.display())))?
                .to_path_buf();
            out.push((path, rel));
        }
    }
    Ok(())
}

fn hash_file(path: &Path) -> Result<String> {
    let mut reader = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
