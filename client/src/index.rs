//! JSON-file backed descriptor index.
//!
//! The file is a single JSON object mapping source paths to descriptor paths.
//! Every `set` rewrites the whole file through a temporary file and rename,
//! so an interrupted write never leaves truncated JSON behind.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use torrent_meta::{DescriptorIndex, write_atomic};
use tracing::debug;

pub struct JsonIndex {
    path: PathBuf,
    entries: BTreeMap<PathBuf, PathBuf>,
}

impl JsonIndex {
    /// Loads the index at `path`. A missing file is an empty index.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read(&path) {
            Ok(data) => serde_json::from_slice(&data).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("failed to parse torrent index {}: {}", path.display(), e),
                )
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        Ok(Self { path, entries })
    }

    fn save(&self) -> io::Result<()> {
        let data = serde_json::to_vec_pretty(&self.entries).map_err(io::Error::other)?;
        write_atomic(&self.path, |w| w.write_all(&data))?;
        debug!(path = %self.path.display(), entries = self.entries.len(), "saved torrent index");
        Ok(())
    }
}

impl DescriptorIndex for JsonIndex {
    fn get(&self, source: &Path) -> Option<PathBuf> {
        self.entries.get(source).cloned()
    }

    fn set(&mut self, source: &Path, descriptor: &Path) -> io::Result<()> {
        self.entries
            .insert(source.to_path_buf(), descriptor.to_path_buf());
        self.save()
    }

    fn all(&self) -> Vec<(PathBuf, PathBuf)> {
        self.entries
            .iter()
            .map(|(s, d)| (s.clone(), d.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("torrent_index.json");
        let index = JsonIndex::open(&path).unwrap();
        assert!(index.all().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_set_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("torrent_index.json");

        let mut index = JsonIndex::open(&path).unwrap();
        index
            .set(Path::new("/data/b.bin"), Path::new("/t/b.bin.torrent"))
            .unwrap();
        index
            .set(Path::new("/data/a.bin"), Path::new("/t/a.bin.torrent"))
            .unwrap();

        let reopened = JsonIndex::open(&path).unwrap();
        assert_eq!(
            reopened.get(Path::new("/data/a.bin")),
            Some(PathBuf::from("/t/a.bin.torrent"))
        );
        assert_eq!(reopened.all().len(), 2);
        assert_eq!(reopened.all()[0].0, PathBuf::from("/data/a.bin"));

        let raw: BTreeMap<String, String> =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["/data/b.bin"], "/t/b.bin.torrent");
    }

    #[test]
    fn test_set_replaces_file_without_leftovers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("torrent_index.json");
        fs::write(&path, b"{}").unwrap();

        let mut index = JsonIndex::open(&path).unwrap();
        index
            .set(Path::new("/data/c.bin"), Path::new("/t/c.bin.torrent"))
            .unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("torrent_index.json")]);
        assert_eq!(JsonIndex::open(&path).unwrap().all().len(), 1);
    }

    #[test]
    fn test_corrupt_index_is_invalid_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("torrent_index.json");
        fs::write(&path, b"{ not json").unwrap();
        match JsonIndex::open(&path) {
            Err(e) => assert_eq!(e.kind(), io::ErrorKind::InvalidData),
            Ok(_) => panic!("expected parse failure"),
        }
    }
}
