use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Full phrase content, as stored in the append log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseRecord {
    pub hash: String,
    pub text: String,
    /// Translations keyed by target language code
    pub translations: BTreeMap<String, String>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub reading: String,
    pub created_at: DateTime<Utc>,
}

/// Index row: usage statistics used for ranked selection
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PhraseIndexEntry {
    pub hash: String,
    pub usage_count: i64,
    /// Unix milliseconds
    pub created_at: i64,
    pub complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// Least-used first
    #[serde(alias = "freq")]
    Frequency,
    /// Oldest first
    #[serde(alias = "time")]
    Recency,
    Random,
}

impl SelectionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionPolicy::Frequency => "frequency",
            SelectionPolicy::Recency => "recency",
            SelectionPolicy::Random => "random",
        }
    }
}

impl std::fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "frequency" | "freq" => Ok(SelectionPolicy::Frequency),
            "recency" | "time" => Ok(SelectionPolicy::Recency),
            "random" => Ok(SelectionPolicy::Random),
            other => Err(format!("unknown selection policy: {other}")),
        }
    }
}

/// Content hash of cleaned phrase text (lowercase hex SHA-256)
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("{:x}", digest)
}

/// Whether `hash` looks like something `content_hash` produced
pub fn is_valid_hash(hash: &str) -> bool {
    hash.len() == 64 && hash.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}
