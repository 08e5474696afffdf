//! Build context assembly
//!
//! The task root is packed into a gzipped tar archive inside a private
//! staging directory, with the synthesized recipe as the top-level
//! `Dockerfile`. The task root itself is only read. The staging directory is
//! removed when the `BuildContext` is dropped, on every path.

use crate::error::{BuildError, BuildResult};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tar::Builder;
use tempfile::TempDir;

const ARCHIVE_NAME: &str = "context.tar.gz";
const DOCKERFILE: &str = "Dockerfile";

/// A staged build context owned by a single build.
#[derive(Debug)]
pub struct BuildContext {
    staging: TempDir,
    archive: PathBuf,
}

impl BuildContext {
    /// Staging directory root.
    pub fn staging_path(&self) -> &Path {
        self.staging.path()
    }

    /// Gzipped tar archive, valid until the context is dropped.
    pub fn archive_path(&self) -> &Path {
        &self.archive
    }
}

#[derive(Debug, Default)]
pub struct ContextBuilder {
    staging_parent: Option<PathBuf>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages under `parent` instead of the system temp directory.
    pub fn in_dir(parent: impl Into<PathBuf>) -> Self {
        Self {
            staging_parent: Some(parent.into()),
        }
    }

    /// Archives `root` with `dockerfile` as its top-level `Dockerfile`.
    pub fn assemble(&self, root: &Path, dockerfile: &str) -> BuildResult<BuildContext> {
        tracing::debug!("Creating build context from: {}", root.display());

        let staging = self.staging_dir().map_err(assembly_error(root))?;
        let archive = staging.path().join(ARCHIVE_NAME);
        write_archive(root, dockerfile, &archive)?;

        let size = fs::metadata(&archive).map(|m| m.len()).unwrap_or_default();
        tracing::debug!("Build context created: {} bytes", size);
        check_context_size(size);

        Ok(BuildContext { staging, archive })
    }

    fn staging_dir(&self) -> io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("taskpress-build-");
        match &self.staging_parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
    }
}

fn assembly_error(path: &Path) -> impl FnOnce(io::Error) -> BuildError {
    let path = path.to_path_buf();
    move |source| BuildError::ContextAssembly { path, source }
}

fn write_archive(root: &Path, dockerfile: &str, archive: &Path) -> BuildResult<()> {
    let file = File::create(archive).map_err(assembly_error(archive))?;
    let mut tar = Builder::new(GzEncoder::new(file, Compression::default()));

    append_tree(&mut tar, root, Path::new(""))?;

    let mut header = tar::Header::new_gnu();
    header.set_size(dockerfile.len() as u64);
    header.set_mode(0o644);
    tar.append_data(&mut header, DOCKERFILE, dockerfile.as_bytes())
        .map_err(assembly_error(archive))?;

    let encoder = tar.into_inner().map_err(assembly_error(archive))?;
    encoder.finish().map_err(assembly_error(archive))?;
    Ok(())
}

/// Appends the contents of `dir` under `prefix`, keeping permission bits in
/// the entry headers.
///
/// Symlinked files are archived by content and symlinked directories are
/// skipped. Sockets, FIFOs and devices are skipped. A root-level `Dockerfile`
/// is left out so it never shadows the synthesized one.
fn append_tree<W: Write>(tar: &mut Builder<W>, dir: &Path, prefix: &Path) -> BuildResult<()> {
    let mut entries = fs::read_dir(dir)
        .and_then(|entries| entries.collect::<io::Result<Vec<_>>>())
        .map_err(assembly_error(dir))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        if prefix.as_os_str().is_empty() && entry.file_name() == DOCKERFILE {
            tracing::debug!("Replacing task Dockerfile: {}", path.display());
            continue;
        }

        let name = prefix.join(entry.file_name());
        let is_symlink = entry
            .file_type()
            .map_err(assembly_error(&path))?
            .is_symlink();
        let metadata = fs::metadata(&path).map_err(assembly_error(&path))?;

        if metadata.is_dir() {
            if is_symlink {
                tracing::warn!("Skipping symlinked directory: {}", path.display());
                continue;
            }
            tar.append_dir(&name, &path)
                .map_err(assembly_error(&path))?;
            append_tree(tar, &path, &name)?;
        } else if metadata.is_file() {
            let mut file = File::open(&path).map_err(assembly_error(&path))?;
            tar.append_file(&name, &mut file)
                .map_err(assembly_error(&path))?;
        } else {
            tracing::warn!("Skipping special file: {}", path.display());
        }
    }

    Ok(())
}

fn check_context_size(size: u64) {
    const MAX_CONTEXT_SIZE: u64 = 500 * 1024 * 1024; // 500MB

    if size > MAX_CONTEXT_SIZE {
        tracing::warn!(
            "Build context is large ({}MB). Consider removing unneeded files from the task root.",
            size / 1024 / 1024
        );
    }
}
