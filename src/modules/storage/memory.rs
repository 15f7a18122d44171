//! In-memory blob store double that counts every call

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::blob_store::{BlobError, BlobReader, BlobStore};

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<PathBuf, Vec<u8>>>,
    dirs: Mutex<HashSet<PathBuf>>,
    calls: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.blobs.lock().unwrap().get(path).cloned()
    }

    /// Drop a blob behind the service's back
    pub fn remove_externally(&self, path: &Path) {
        self.blobs.lock().unwrap().remove(path);
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn exists(&self, path: &Path) -> Result<bool, BlobError> {
        self.touch();
        Ok(self.blobs.lock().unwrap().contains_key(path))
    }

    async fn open(&self, path: &Path) -> Result<BlobReader, BlobError> {
        self.touch();
        let data = self
            .blobs
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(path.to_path_buf()))?;
        Ok(Box::pin(Cursor::new(data)))
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<DateTime<Utc>, BlobError> {
        self.touch();
        self.blobs
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), data.to_vec());
        Ok(Utc::now())
    }

    async fn write_new(&self, path: &Path, data: &[u8]) -> Result<DateTime<Utc>, BlobError> {
        self.touch();
        let mut blobs = self.blobs.lock().unwrap();
        if blobs.contains_key(path) {
            return Err(BlobError::AlreadyExists(path.to_path_buf()));
        }
        blobs.insert(path.to_path_buf(), data.to_vec());
        Ok(Utc::now())
    }

    async fn remove(&self, path: &Path) -> Result<DateTime<Utc>, BlobError> {
        self.touch();
        self.blobs
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| Utc::now())
            .ok_or_else(|| BlobError::NotFound(path.to_path_buf()))
    }

    async fn dir_exists(&self, path: &Path) -> Result<bool, BlobError> {
        self.touch();
        Ok(self.dirs.lock().unwrap().contains(path))
    }

    async fn create_dir(&self, path: &Path, _mode: u32) -> Result<DateTime<Utc>, BlobError> {
        self.touch();
        self.dirs.lock().unwrap().insert(path.to_path_buf());
        Ok(Utc::now())
    }
}
