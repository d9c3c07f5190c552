use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// File name of the JSON index kept inside the descriptor directory.
pub const INDEX_FILE_NAME: &str = "torrent_index.json";

/// Manages the directory where descriptor files and the index live.
///
/// The `Storage` struct is responsible for determining the descriptor directory,
/// creating it if it doesn't exist, and resolving file paths relative to it.
pub struct Storage {
    /// The root directory where descriptors will be stored.
    pub torrent_dir: PathBuf,
}

impl Storage {
    /// Creates a new `Storage` instance.
    ///
    /// If a `path` is provided, it uses that as the descriptor directory.
    /// If `path` is `None`, it defaults to a `torrents` directory in the current working directory.
    ///
    /// This function also attempts to create the directory if it does not exist.
    ///
    /// # Arguments
    ///
    /// * `path` - An optional string slice that holds the path to the descriptor directory.
    ///
    /// # Returns
    ///
    /// * `io::Result<Self>` - A result containing the `Storage` instance or an IO error.
    pub async fn new(path: Option<String>) -> io::Result<Self> {
        let torrent_dir = if let Some(p) = path {
            PathBuf::from(p)
        } else {
            let mut p = std::env::current_dir()?;
            p.push("torrents");
            p
        };

        // Check if path exists and is a directory
        match fs::metadata(&torrent_dir).await {
            Ok(metadata) => {
                if !metadata.is_dir() {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        "Path exists but is not a directory",
                    ));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&torrent_dir).await?;
            }
            Err(e) => return Err(e),
        }

        Ok(Self { torrent_dir })
    }

    /// Resolves the full path for a given filename relative to the descriptor directory.
    pub fn get_file_path(&self, filename: &str) -> PathBuf {
        self.torrent_dir.join(filename)
    }

    /// Path of the JSON index file.
    pub fn index_path(&self) -> PathBuf {
        self.get_file_path(INDEX_FILE_NAME)
    }

    pub fn dir(&self) -> &Path {
        &self.torrent_dir
    }

    /// Returns the descriptor directory path as a string.
    ///
    /// This uses `to_string_lossy()` so it may replace non-UTF8 characters.
    pub fn get_torrent_dir_str(&self) -> String {
        self.torrent_dir.to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_new_storage_with_path() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("torrents");
        let path_str = path.to_str().unwrap().to_string();

        let storage = Storage::new(Some(path_str.clone()))
            .await
            .expect("Failed to create storage");
        assert_eq!(storage.get_torrent_dir_str(), path_str);
        assert!(storage.torrent_dir.is_dir());
    }

    #[tokio::test]
    async fn test_existing_directory_is_reused() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let path_str = temp_dir.path().to_str().unwrap().to_string();
        fs::write(temp_dir.path().join("keep.txt"), "x").await.unwrap();

        let storage = Storage::new(Some(path_str)).await.unwrap();
        assert!(storage.get_file_path("keep.txt").exists());
    }

    #[tokio::test]
    async fn test_paths() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let storage = Storage {
            torrent_dir: temp_dir.path().to_path_buf(),
        };

        assert_eq!(
            storage.get_file_path("a.torrent"),
            temp_dir.path().join("a.torrent")
        );
        assert_eq!(
            storage.index_path(),
            temp_dir.path().join("torrent_index.json")
        );
        assert_eq!(storage.dir(), temp_dir.path());
    }

    #[tokio::test]
    async fn test_storage_creation_fails_on_file_path() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("i_am_a_file");
        fs::write(&file_path, "content").await.unwrap();

        let result = Storage::new(Some(file_path.to_str().unwrap().to_string())).await;
        assert!(
            result.is_err(),
            "Should return error if path exists and is not a directory"
        );
    }
}
