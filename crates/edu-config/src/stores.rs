//! Relationship store, document store, and store-client retry configuration.
//!
//! The two stores are independent libSQL databases. A path of `:memory:`
//! opens a throwaway in-process database.

use serde::{Deserialize, Serialize};

fn default_graph_path() -> String {
    ".edu/graph.db".to_string()
}

fn default_documents_path() -> String {
    ".edu/documents.db".to_string()
}

const fn default_max_attempts() -> u32 {
    4
}

const fn default_base_delay_ms() -> u64 {
    100
}

const fn default_max_delay_ms() -> u64 {
    2_000
}

/// Graph-relationship store (source of truth for who is enrolled in what).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphStoreConfig {
    #[serde(default = "default_graph_path")]
    pub path: String,
}

impl Default for GraphStoreConfig {
    fn default() -> Self {
        Self {
            path: default_graph_path(),
        }
    }
}

/// Document store (source of truth for course metadata and `enrolled_count`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocumentStoreConfig {
    #[serde(default = "default_documents_path")]
    pub path: String,
}

impl Default for DocumentStoreConfig {
    fn default() -> Self {
        Self {
            path: default_documents_path(),
        }
    }
}

/// Retry policy applied by the store clients to transient lock/busy errors.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrySettings {
    /// Maximum number of attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Backoff is capped at this delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}
