use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};

use super::{FileRepository, RepositoryError};
use crate::core::database::is_unique_violation;
use crate::features::files::hooks::CommitHook;
use crate::features::files::models::{FileRecord, NewFileRecord};

const FILE_COLUMNS: &str =
    "unique_id, path, name, mimetype, extension, size, created_at, updated_at, deleted_at";

/// Postgres-backed file metadata. Each mutation runs in one transaction that
/// commits only after its hook succeeded.
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// A unique violation on insert means the id or path is already taken
fn insert_error(error: sqlx::Error, path: &str) -> RepositoryError {
    if is_unique_violation(&error) {
        RepositoryError::Duplicate(path.to_string())
    } else {
        RepositoryError::Database(error)
    }
}

async fn rollback(tx: sqlx::Transaction<'_, sqlx::Postgres>, unique_id: &str) {
    if let Err(e) = tx.rollback().await {
        warn!("Rollback failed for file {}: {}", unique_id, e);
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn create(
        &self,
        record: NewFileRecord,
        hook: &mut dyn CommitHook,
    ) -> Result<FileRecord, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Staging the row first surfaces id/path uniqueness before any blob is written
        let staged = sqlx::query_as::<_, FileRecord>(&format!(
            r#"
            INSERT INTO files (unique_id, path, name, mimetype, extension, size, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {FILE_COLUMNS}
            "#
        ))
        .bind(&record.unique_id)
        .bind(&record.path)
        .bind(&record.name)
        .bind(&record.mimetype)
        .bind(&record.extension)
        .bind(record.size)
        .bind(record.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| insert_error(e, &record.path))?;

        if let Err(e) = hook.prepare(&staged).await {
            rollback(tx, &staged.unique_id).await;
            return Err(RepositoryError::Hook(e));
        }

        if let Err(e) = tx.commit().await {
            hook.abort().await;
            return Err(RepositoryError::Database(e));
        }
        hook.commit().await;

        debug!("File record inserted: {}", staged.unique_id);
        Ok(staged)
    }

    async fn retrieve(&self, unique_id: &str) -> Result<FileRecord, RepositoryError> {
        sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE unique_id = $1"
        ))
        .bind(unique_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(unique_id.to_string()))
    }

    async fn delete(
        &self,
        unique_id: &str,
        hook: &mut dyn CommitHook,
    ) -> Result<FileRecord, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent deletes of the same file
        let current = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE unique_id = $1 FOR UPDATE"
        ))
        .bind(unique_id)
        .fetch_optional(&mut *tx)
        .await?;

        let current = match current {
            Some(record) if record.is_deleted() => {
                rollback(tx, unique_id).await;
                return Err(RepositoryError::AlreadyDeleted(unique_id.to_string()));
            }
            Some(record) => record,
            None => {
                rollback(tx, unique_id).await;
                return Err(RepositoryError::NotFound(unique_id.to_string()));
            }
        };

        let deleted_at = match hook.prepare(&current).await {
            Ok(at) => at,
            Err(e) => {
                rollback(tx, unique_id).await;
                return Err(RepositoryError::Hook(e));
            }
        };

        let deleted = sqlx::query_as::<_, FileRecord>(&format!(
            r#"
            UPDATE files
            SET deleted_at = $2
            WHERE unique_id = $1
            RETURNING {FILE_COLUMNS}
            "#
        ))
        .bind(unique_id)
        .bind(deleted_at)
        .fetch_one(&mut *tx)
        .await;

        let deleted = match deleted {
            Ok(record) => record,
            Err(e) => {
                hook.abort().await;
                rollback(tx, unique_id).await;
                return Err(RepositoryError::Database(e));
            }
        };

        if let Err(e) = tx.commit().await {
            hook.abort().await;
            return Err(RepositoryError::Database(e));
        }
        hook.commit().await;

        debug!("File record soft deleted: {}", unique_id);
        Ok(deleted)
    }

    async fn list(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<FileRecord>, i64), RepositoryError> {
        let records = sqlx::query_as::<_, FileRecord>(&format!(
            r#"
            SELECT {FILE_COLUMNS} FROM files
            WHERE deleted_at IS NULL
            ORDER BY created_at DESC, unique_id DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok((records, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::database::database_error;

    #[test]
    fn test_insert_unique_violation_is_duplicate() {
        let error = insert_error(database_error("23505"), "2026/10/16/abc.jpg");
        assert!(matches!(error, RepositoryError::Duplicate(path) if path == "2026/10/16/abc.jpg"));
    }

    #[test]
    fn test_insert_other_failures_stay_database() {
        let error = insert_error(database_error("23503"), "p");
        assert!(matches!(error, RepositoryError::Database(_)));

        let error = insert_error(sqlx::Error::PoolTimedOut, "p");
        assert!(matches!(error, RepositoryError::Database(_)));
    }
}
