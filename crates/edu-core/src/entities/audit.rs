use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::AuditAction;

/// An append-only record of a coordination action.
///
/// `log_date` duplicates the date part of `logged_at` so sinks can partition
/// by day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    pub log_date: NaiveDate,
    pub logged_at: DateTime<Utc>,
    pub actor: String,
    pub action: AuditAction,
    pub params: serde_json::Value,
}

impl AuditRecord {
    /// Build a record stamped with the current time.
    #[must_use]
    pub fn now(actor: impl Into<String>, action: AuditAction, params: serde_json::Value) -> Self {
        let logged_at = Utc::now();
        Self {
            log_date: logged_at.date_naive(),
            logged_at,
            actor: actor.into(),
            action,
            params,
        }
    }
}
