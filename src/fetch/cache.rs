use anyhow::{Context, Result};
use bytes::Bytes;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::task;
use tracing::debug;

/// File-per-response cache for provider payloads.
///
/// Keys are request paths; they are flattened into file names inside `dir`.
/// A miss, an expired entry and an unreadable entry all look the same to the
/// caller: `get` returns `None` and the caller refetches.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    compress: bool,
    ttl: Option<Duration>,
}

impl DiskCache {
    pub fn new(dir: PathBuf, compress: bool, ttl: Option<Duration>) -> Self {
        Self { dir, compress, ttl }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let mut name: String = key
            .trim_start_matches('/')
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '.' => c,
                _ => '_',
            })
            .collect();
        name.push_str(if self.compress { ".cache.gz" } else { ".cache" });
        self.dir.join(name)
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        let path = self.path_for(key);
        let meta = fs::metadata(&path).ok()?;

        if let Some(ttl) = self.ttl {
            let age = meta.modified().ok()?.elapsed().unwrap_or_default();
            if age > ttl {
                debug!(key, age_secs = age.as_secs(), "Cache entry expired");
                return None;
            }
        }

        let raw = fs::read(&path).ok()?;
        if !self.compress {
            return Some(Bytes::from(raw));
        }

        let mut decoded = Vec::new();
        match GzDecoder::new(raw.as_slice()).read_to_end(&mut decoded) {
            Ok(_) => Some(Bytes::from(decoded)),
            Err(e) => {
                debug!(key, error = %e, "Discarding unreadable cache entry");
                None
            }
        }
    }

    /// Writes an entry through a uniquely named temp file in `dir`, then
    /// renames it over the final path, so concurrent writers of one key never
    /// share a partial file.
    pub fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        let mut tmp = NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("failed to create temp file in {}", self.dir.display()))?;

        if self.compress {
            let mut encoder = GzEncoder::new(tmp.as_file_mut(), Compression::default());
            encoder.write_all(data)?;
            encoder.finish()?;
        } else {
            tmp.write_all(data)?;
        }

        tmp.persist(&path)
            .with_context(|| format!("failed to commit cache entry {}", path.display()))?;
        debug!(key, bytes = data.len(), "Cached provider response");
        Ok(())
    }

    /// [`DiskCache::get`] on the blocking thread pool.
    pub async fn load(&self, key: &str) -> Option<Bytes> {
        let cache = self.clone();
        let key = key.to_string();
        match task::spawn_blocking(move || cache.get(&key)).await {
            Ok(hit) => hit,
            Err(e) => {
                debug!(error = %e, "Cache read task failed");
                None
            }
        }
    }

    /// [`DiskCache::put`] on the blocking thread pool.
    pub async fn store(&self, key: &str, data: Bytes) -> Result<()> {
        let cache = self.clone();
        let key = key.to_string();
        task::spawn_blocking(move || cache.put(&key, &data)).await?
    }
}
