use crate::domain::phrase::{PhraseIndexEntry, SelectionPolicy};
use crate::error::{AppError, AppResult};
use crate::infrastructure::db::DbPool;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// SQLite extended result codes for key violations
const SQLITE_CONSTRAINT_PRIMARYKEY: &str = "1555";
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";

/// Transactional index over phrase hashes: usage counts, creation time and
/// the completeness flag that gates visibility.
pub struct PhraseIndexRepository {
    pool: Arc<DbPool>,
}

impl PhraseIndexRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Insert a pending row. This is the dedup gate: a second insert of the
    /// same hash fails with `DuplicatePhrase`.
    pub async fn insert(&self, hash: &str, created_at: DateTime<Utc>) -> AppResult<()> {
        let pool = self.pool.as_ref();

        sqlx::query(
            r#"
            INSERT INTO phrases (hash, usage_count, created_at, complete)
            VALUES (?1, 0, ?2, 0)
            "#,
        )
        .bind(hash)
        .bind(created_at.timestamp_millis())
        .execute(pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                let code = db_err.code();
                if db_err.is_unique_violation()
                    || matches!(
                        code.as_deref(),
                        Some(SQLITE_CONSTRAINT_PRIMARYKEY) | Some(SQLITE_CONSTRAINT_UNIQUE)
                    )
                {
                    return AppError::DuplicatePhrase(hash.to_string());
                }
            }
            AppError::Database(e)
        })?;

        Ok(())
    }

    /// Make a pending row visible to selection
    pub async fn mark_complete(&self, hash: &str) -> AppResult<()> {
        let pool = self.pool.as_ref();
        let result = sqlx::query("UPDATE phrases SET complete = 1 WHERE hash = ?1")
            .bind(hash)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("pending phrase {hash}")));
        }
        Ok(())
    }

    /// Roll back the gate of a generation that failed to commit
    pub async fn discard_pending(&self, hash: &str) -> AppResult<bool> {
        let pool = self.pool.as_ref();
        let result = sqlx::query("DELETE FROM phrases WHERE hash = ?1 AND complete = 0")
            .bind(hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Drop every pending row, returning how many were removed.
    /// Only safe while no generation is in flight, i.e. at startup.
    pub async fn purge_pending(&self) -> AppResult<u64> {
        let pool = self.pool.as_ref();
        let result = sqlx::query("DELETE FROM phrases WHERE complete = 0")
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Select up to `limit` complete phrases by `policy` and bump the usage
    /// count of each selected row by one.
    ///
    /// Selection and bump are one statement, so concurrent callers serialize
    /// on the database write lock and never both serve a stale count.
    pub async fn select_ranked(
        &self,
        policy: SelectionPolicy,
        limit: i64,
    ) -> AppResult<Vec<PhraseIndexEntry>> {
        let pool = self.pool.as_ref();
        let order_by = match policy {
            SelectionPolicy::Frequency => "usage_count ASC, created_at ASC, hash ASC",
            SelectionPolicy::Recency => "created_at ASC, hash ASC",
            SelectionPolicy::Random => "RANDOM()",
        };

        let sql = format!(
            r#"
            UPDATE phrases
            SET usage_count = usage_count + 1
            WHERE hash IN (
                SELECT hash FROM phrases
                WHERE complete = 1
                ORDER BY {order_by}
                LIMIT ?1
            )
            RETURNING hash, usage_count, created_at, complete
            "#
        );

        let mut entries = sqlx::query_as::<_, PhraseIndexEntry>(&sql)
            .bind(limit)
            .fetch_all(pool)
            .await?;

        // RETURNING order is unspecified; restore the policy order
        match policy {
            SelectionPolicy::Frequency => entries.sort_by(|a, b| {
                (a.usage_count, a.created_at, &a.hash).cmp(&(b.usage_count, b.created_at, &b.hash))
            }),
            SelectionPolicy::Recency => {
                entries.sort_by(|a, b| (a.created_at, &a.hash).cmp(&(b.created_at, &b.hash)))
            }
            SelectionPolicy::Random => {}
        }

        tracing::debug!(
            policy = %policy,
            limit = limit,
            selected = entries.len(),
            "Ranked selection"
        );

        Ok(entries)
    }

    /// Hide a complete row from selection without reopening the dedup gate.
    /// The row goes back to pending until `delete` removes it.
    pub async fn retire(&self, hash: &str) -> AppResult<bool> {
        let pool = self.pool.as_ref();
        let result = sqlx::query("UPDATE phrases SET complete = 0 WHERE hash = ?1 AND complete = 1")
            .bind(hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove an index row whatever its state
    pub async fn delete(&self, hash: &str) -> AppResult<bool> {
        let pool = self.pool.as_ref();
        let result = sqlx::query("DELETE FROM phrases WHERE hash = ?1")
            .bind(hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find(&self, hash: &str) -> AppResult<Option<PhraseIndexEntry>> {
        let pool = self.pool.as_ref();
        let entry = sqlx::query_as::<_, PhraseIndexEntry>(
            r#"
            SELECT hash, usage_count, created_at, complete
            FROM phrases
            WHERE hash = ?1
            "#,
        )
        .bind(hash)
        .fetch_optional(pool)
        .await?;

        Ok(entry)
    }

    /// Number of phrases visible to selection
    pub async fn count(&self) -> AppResult<i64> {
        let pool = self.pool.as_ref();
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM phrases WHERE complete = 1")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
