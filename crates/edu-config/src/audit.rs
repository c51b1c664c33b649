//! Audit sink configuration.

use serde::{Deserialize, Serialize};

/// Which audit sink receives coordination records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// `query_audit` table in a libSQL database.
    #[default]
    Database,
    /// Per-day JSONL files.
    Jsonl,
    /// Records are dropped.
    Disabled,
}

fn default_audit_path() -> String {
    ".edu/audit.db".to_string()
}

fn default_trail_dir() -> String {
    ".edu/audit".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub sink: AuditSinkKind,

    /// Database path used when `sink = "database"`.
    #[serde(default = "default_audit_path")]
    pub path: String,

    /// Directory used when `sink = "jsonl"`.
    #[serde(default = "default_trail_dir")]
    pub trail_dir: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            sink: AuditSinkKind::default(),
            path: default_audit_path(),
            trail_dir: default_trail_dir(),
        }
    }
}
