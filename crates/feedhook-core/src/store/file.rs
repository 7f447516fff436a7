use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::LinkStore;
use crate::Result;

/// Keeps the last link as the whole content of a local file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Open the store, creating an empty file if none exists yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            std::fs::File::create(&path)?;
            tracing::debug!("Created empty state file: {}", path.display());
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl LinkStore for FileStore {
    async fn get(&self) -> Result<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content),
            // Removed behind our back: same as never written
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, link: &str) -> Result<()> {
        tokio::fs::write(&self.path, link).await?;
        Ok(())
    }
}

/// Read the seed file used to prime the in-memory last link
///
/// A missing file is not an error and yields an empty link.
pub async fn read_seed(path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content.trim().to_string()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!("No seed file at {}, starting empty", path.display());
            Ok(String::new())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("last_link")).unwrap();

        store.set("https://blog.example.com/a").await.unwrap();
        assert_eq!(store.get().await.unwrap(), "https://blog.example.com/a");

        store.set("https://blog.example.com/b").await.unwrap();
        assert_eq!(store.get().await.unwrap(), "https://blog.example.com/b");
    }

    #[tokio::test]
    async fn test_absent_file_is_created_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never_written");

        let store = FileStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.get().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_existing_content_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_link");
        std::fs::write(&path, "https://blog.example.com/old").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get().await.unwrap(), "https://blog.example.com/old");
    }

    #[test]
    fn test_open_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileStore::open(dir.path().join("missing").join("last_link"));
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }

    #[tokio::test]
    async fn test_read_seed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed");

        assert_eq!(read_seed(&path).await.unwrap(), "");

        std::fs::write(&path, "https://blog.example.com/seeded\n").unwrap();
        assert_eq!(read_seed(&path).await.unwrap(), "https://blog.example.com/seeded");
    }
}
