use super::track_repository::write_atomic;
use crate::domain::phrase::PhraseRecord;
use crate::error::{AppError, AppResult};
use moka::future::Cache;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

const CACHE_CAPACITY: u64 = 10_000;

/// Append-only JSON-lines log holding the full content of every generated phrase.
///
/// Records are never rewritten. When a hash appears more than once (a phrase
/// deleted and generated again) the latest record wins on lookup.
pub struct PhraseLogRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
    cache: Option<Cache<String, PhraseRecord>>,
}

impl PhraseLogRepository {
    pub fn new(path: PathBuf, cache_enabled: bool) -> Self {
        let cache = if cache_enabled {
            Some(Cache::builder().max_capacity(CACHE_CAPACITY).build())
        } else {
            None
        };

        Self {
            path,
            write_lock: Mutex::new(()),
            cache,
        }
    }

    /// Append one record. The file is replaced atomically with its previous
    /// content plus the new line, so a crash never leaves a torn line.
    pub async fn append(&self, record: &PhraseRecord) -> AppResult<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| AppError::Internal(format!("failed to encode phrase record: {e}")))?;

        let _guard = self.write_lock.lock().await;

        let mut content = self.read_raw().await?;
        if !content.is_empty() && !content.ends_with(b"\n") {
            content.push(b'\n');
        }
        content.extend_from_slice(line.as_bytes());
        content.push(b'\n');

        write_atomic(&self.path, &content).await?;

        if let Some(cache) = &self.cache {
            cache.insert(record.hash.clone(), record.clone()).await;
        }

        tracing::debug!(
            hash = %record.hash,
            log_bytes = content.len(),
            "Phrase record appended"
        );

        Ok(())
    }

    /// Every record in append order
    pub async fn all(&self) -> AppResult<Vec<PhraseRecord>> {
        let content = self.read_raw().await?;
        let text = String::from_utf8(content)
            .map_err(|e| AppError::Internal(format!("phrase log is not UTF-8: {e}")))?;

        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str::<PhraseRecord>(line).map_err(|e| {
                    AppError::Internal(format!("phrase log line {} is malformed: {e}", index + 1))
                })
            })
            .collect()
    }

    pub async fn find(&self, hash: &str) -> AppResult<Option<PhraseRecord>> {
        let mut found = self.find_by_hashes(&[hash.to_string()]).await?;
        Ok(found.pop())
    }

    /// Resolve hashes to records, in the order given. Unknown hashes are skipped.
    pub async fn find_by_hashes(&self, hashes: &[String]) -> AppResult<Vec<PhraseRecord>> {
        let mut resolved: HashMap<String, PhraseRecord> = HashMap::new();

        if let Some(cache) = &self.cache {
            for hash in hashes {
                if let Some(record) = cache.get(hash).await {
                    resolved.insert(hash.clone(), record);
                }
            }
        }

        let missing = hashes.iter().any(|h| !resolved.contains_key(h));
        if missing {
            tracing::debug!(
                requested = hashes.len(),
                cached = resolved.len(),
                "Scanning phrase log"
            );
            for record in self.all().await? {
                if hashes.contains(&record.hash) {
                    // Later lines override earlier ones
                    resolved.insert(record.hash.clone(), record);
                }
            }
            if let Some(cache) = &self.cache {
                for record in resolved.values() {
                    cache.insert(record.hash.clone(), record.clone()).await;
                }
            }
        }

        Ok(hashes
            .iter()
            .filter_map(|hash| resolved.get(hash).cloned())
            .collect())
    }

    async fn read_raw(&self) -> AppResult<Vec<u8>> {
        match fs::read(&self.path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}
