//! On-disk cache
//!
//! Stores one file per key under a cache directory. Writes go to a temporary
//! file first and are renamed into place, so a reader never observes a
//! half-written record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::{CacheError, CacheStore};

/// Cache backed by a directory of JSON files
#[derive(Clone, Debug)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Create a cache rooted at `dir` (created lazily on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default cache location: `~/.clustersnap/cache`
    pub fn default_dir() -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        Some(home.join(".clustersnap").join("cache"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

/// Map a cache key to a safe file name. Bytes outside `[A-Za-z0-9._-]` are
/// written as `%XX`, which keeps distinct keys distinct.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

#[async_trait]
impl CacheStore for FileCache {
    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(fs::try_exists(self.path_for(key)).await?)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_key() {
        assert_eq!(encode_key("snapshot:demo"), "snapshot%3Ademo");
        assert_eq!(encode_key("a/b"), "a%2Fb");
        assert_ne!(encode_key("a:b"), encode_key("a_b"));
    }

    #[tokio::test]
    async fn test_file_cache_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("nested"));

        assert!(!cache.exists("credential:demo").await.unwrap());
        assert_eq!(cache.get("credential:demo").await.unwrap(), None);

        cache
            .set("credential:demo", b"{\"token\":\"a\"}".to_vec())
            .await
            .unwrap();
        cache
            .set("credential:demo", b"{\"token\":\"b\"}".to_vec())
            .await
            .unwrap();

        assert!(cache.exists("credential:demo").await.unwrap());
        assert_eq!(
            cache.get("credential:demo").await.unwrap(),
            Some(b"{\"token\":\"b\"}".to_vec())
        );
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        cache.set("snapshot:demo", b"{}".to_vec()).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["snapshot%3Ademo.json".to_string()]);
    }
}
