//! In-memory repository double with the same commit ordering as Postgres

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{FileRepository, RepositoryError};
use crate::features::files::hooks::CommitHook;
use crate::features::files::models::{FileRecord, NewFileRecord};

#[derive(Debug, Default)]
pub struct MemoryFileRepository {
    records: Mutex<HashMap<String, FileRecord>>,
    calls: AtomicUsize,
    fail_commits: AtomicBool,
}

impl MemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every later commit fail after its hook prepared
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    pub async fn get(&self, unique_id: &str) -> Option<FileRecord> {
        self.records.lock().await.get(unique_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn commit_fails(&self) -> bool {
        self.fail_commits.load(Ordering::SeqCst)
    }
}

fn simulated_commit_failure() -> RepositoryError {
    RepositoryError::Database(sqlx::Error::PoolClosed)
}

#[async_trait]
impl FileRepository for MemoryFileRepository {
    async fn create(
        &self,
        record: NewFileRecord,
        hook: &mut dyn CommitHook,
    ) -> Result<FileRecord, RepositoryError> {
        self.touch();
        // Held across the hook, standing in for the transaction
        let mut records = self.records.lock().await;

        let duplicate = records.contains_key(&record.unique_id)
            || records.values().any(|existing| existing.path == record.path);
        if duplicate {
            return Err(RepositoryError::Duplicate(record.path));
        }

        let staged = record.into_record();
        hook.prepare(&staged).await.map_err(RepositoryError::Hook)?;

        if self.commit_fails() {
            hook.abort().await;
            return Err(simulated_commit_failure());
        }

        records.insert(staged.unique_id.clone(), staged.clone());
        hook.commit().await;
        Ok(staged)
    }

    async fn retrieve(&self, unique_id: &str) -> Result<FileRecord, RepositoryError> {
        self.touch();
        self.records
            .lock()
            .await
            .get(unique_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(unique_id.to_string()))
    }

    async fn delete(
        &self,
        unique_id: &str,
        hook: &mut dyn CommitHook,
    ) -> Result<FileRecord, RepositoryError> {
        self.touch();
        let mut records = self.records.lock().await;

        let current = records
            .get(unique_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(unique_id.to_string()))?;
        if current.is_deleted() {
            return Err(RepositoryError::AlreadyDeleted(unique_id.to_string()));
        }

        let deleted_at = hook.prepare(&current).await.map_err(RepositoryError::Hook)?;

        if self.commit_fails() {
            hook.abort().await;
            return Err(simulated_commit_failure());
        }

        let deleted = FileRecord {
            deleted_at: Some(deleted_at),
            ..current
        };
        records.insert(unique_id.to_string(), deleted.clone());
        hook.commit().await;
        Ok(deleted)
    }

    async fn list(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<FileRecord>, i64), RepositoryError> {
        self.touch();
        let records = self.records.lock().await;

        let mut live: Vec<FileRecord> = records
            .values()
            .filter(|record| !record.is_deleted())
            .cloned()
            .collect();
        live.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.unique_id.cmp(&a.unique_id))
        });

        let total = live.len() as i64;
        let page = live
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();

        Ok((page, total))
    }
}
