//! Tracking which descriptor file belongs to which source file.
//!
//! The core only depends on the [`DescriptorIndex`] trait; how the mapping is
//! persisted is up to the implementor. [`MemoryIndex`] keeps it in memory.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, TorrentError};
use crate::torrent::TorrentDescriptor;

/// Extension given to descriptor files.
pub const DESCRIPTOR_EXTENSION: &str = "torrent";

/// A durable mapping from source path to descriptor path.
pub trait DescriptorIndex {
    fn get(&self, source: &Path) -> Option<PathBuf>;

    /// Records (or replaces) the descriptor path for `source`.
    fn set(&mut self, source: &Path, descriptor: &Path) -> io::Result<()>;

    /// Every entry, ordered by source path.
    fn all(&self) -> Vec<(PathBuf, PathBuf)>;
}

/// An index that lives only as long as the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryIndex {
    entries: BTreeMap<PathBuf, PathBuf>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DescriptorIndex for MemoryIndex {
    fn get(&self, source: &Path) -> Option<PathBuf> {
        self.entries.get(source).cloned()
    }

    fn set(&mut self, source: &Path, descriptor: &Path) -> io::Result<()> {
        self.entries
            .insert(source.to_path_buf(), descriptor.to_path_buf());
        Ok(())
    }

    fn all(&self) -> Vec<(PathBuf, PathBuf)> {
        self.entries
            .iter()
            .map(|(s, d)| (s.clone(), d.clone()))
            .collect()
    }
}

/// Where the descriptor for `source` is stored inside `dest_dir`:
/// `<dest_dir>/<base name>.torrent`.
pub fn descriptor_path_for(source: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let base = source.file_name().ok_or_else(|| {
        TorrentError::InvalidArgument(format!("{} has no file name", source.display()))
    })?;
    let mut file_name = base.to_os_string();
    file_name.push(".");
    file_name.push(DESCRIPTOR_EXTENSION);
    Ok(dest_dir.join(file_name))
}

/// Creates a descriptor for `source`, stores it in `dest_dir` and records it
/// in `index`.
///
/// If the index pointed `source` at a different descriptor file before, that
/// stale file is deleted after the new one is saved and recorded, so a failed
/// save leaves the old descriptor and index entry in place. `dest_dir` must
/// already exist.
pub fn track_descriptor<I: DescriptorIndex + ?Sized>(
    index: &mut I,
    source: &Path,
    dest_dir: &Path,
    announce: &str,
    piece_length: u64,
) -> Result<PathBuf> {
    let descriptor = TorrentDescriptor::create(source, announce, piece_length)?;
    let descriptor_path = descriptor_path_for(source, dest_dir)?;

    let stale = index.get(source).filter(|old| *old != descriptor_path);

    descriptor.save(&descriptor_path)?;
    index.set(source, &descriptor_path)?;

    if let Some(old) = stale {
        match fs::remove_file(&old) {
            Ok(()) => info!(old = %old.display(), "removed stale descriptor"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    info!(
        source = %source.display(),
        descriptor = %descriptor_path.display(),
        "tracked descriptor"
    );
    Ok(descriptor_path)
}
