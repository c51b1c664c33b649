//! JSONL audit trail.
//!
//! Appends records to per-day `{trail_dir}/{log_date}.jsonl` files. Uses
//! `serde_jsonlines::append_json_lines` for per-line appends.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use edu_core::entities::AuditRecord;

use super::{AuditFilter, AuditSink};
use crate::error::DatabaseError;

/// Appends audit records to per-day JSONL files.
pub struct JsonlAuditTrail {
    trail_dir: PathBuf,
}

impl JsonlAuditTrail {
    /// Create a trail writing into `trail_dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory cannot be created.
    pub fn new(trail_dir: PathBuf) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(&trail_dir).map_err(|e| DatabaseError::Other(e.into()))?;
        Ok(Self { trail_dir })
    }

    /// Path of the file holding records for `day`.
    #[must_use]
    pub fn day_file(&self, day: NaiveDate) -> PathBuf {
        self.trail_dir.join(format!("{day}.jsonl"))
    }

    /// Read back every record written on `day`. A missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the file exists but cannot be read or parsed.
    pub fn read_day(&self, day: NaiveDate) -> Result<Vec<AuditRecord>, DatabaseError> {
        let path = self.day_file(day);
        if !path.exists() {
            return Ok(Vec::new());
        }
        serde_jsonlines::json_lines(&path)
            .map_err(|e| DatabaseError::Other(e.into()))?
            .collect::<Result<Vec<AuditRecord>, _>>()
            .map_err(|e| DatabaseError::Other(e.into()))
    }

    /// Records for one day (`filter.log_date`, default today), newest first,
    /// narrowed by actor and action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the day file cannot be read or parsed.
    pub fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, DatabaseError> {
        let day = filter.log_date.unwrap_or_else(|| Utc::now().date_naive());
        let limit = usize::try_from(filter.limit.unwrap_or(100)).unwrap_or(usize::MAX);
        let records = self
            .read_day(day)?
            .into_iter()
            .rev()
            .filter(|r| filter.actor.as_ref().is_none_or(|a| &r.actor == a))
            .filter(|r| filter.action.is_none_or(|a| r.action == a))
            .take(limit)
            .collect();
        Ok(records)
    }
}

#[async_trait]
impl AuditSink for JsonlAuditTrail {
    async fn append(&self, record: &AuditRecord) -> Result<(), DatabaseError> {
        serde_jsonlines::append_json_lines(self.day_file(record.log_date), [record])
            .map_err(|e| DatabaseError::Other(e.into()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edu_core::enums::AuditAction;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn appends_to_the_day_file() {
        let dir = tempfile::tempdir().unwrap();
        let trail = JsonlAuditTrail::new(dir.path().join("audit")).unwrap();

        let first = AuditRecord::now("s1@x.edu", AuditAction::EnrolledIn, json!({"course_id": "c1"}));
        let second = AuditRecord::now("s1@x.edu", AuditAction::UnenrolledFrom, json!({"course_id": "c1"}));
        trail.append(&first).await.unwrap();
        trail.append(&second).await.unwrap();

        assert!(trail.day_file(first.log_date).exists());
        let records = trail.read_day(first.log_date).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], first);
        assert_eq!(records[1].action, AuditAction::UnenrolledFrom);
    }

    #[tokio::test]
    async fn creates_nested_trail_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join(".edu").join("audit");
        let trail = JsonlAuditTrail::new(nested.clone()).unwrap();
        assert!(nested.is_dir());

        let record = AuditRecord::now("a", AuditAction::EnrolledIn, json!({}));
        trail.append(&record).await.unwrap();
        assert_eq!(trail.day_file(record.log_date).parent(), Some(nested.as_path()));
    }

    #[tokio::test]
    async fn query_filters_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let trail = JsonlAuditTrail::new(dir.path().to_path_buf()).unwrap();
        for (actor, action) in [
            ("s1@x.edu", AuditAction::EnrolledIn),
            ("s2@x.edu", AuditAction::EnrolledIn),
            ("s1@x.edu", AuditAction::UnenrolledFrom),
        ] {
            trail
                .append(&AuditRecord::now(actor, action, json!({"course_id": "c1"})))
                .await
                .unwrap();
        }

        let mine = trail
            .query(&AuditFilter {
                actor: Some("s1@x.edu".into()),
                ..AuditFilter::default()
            })
            .unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].action, AuditAction::UnenrolledFrom);

        let one = trail
            .query(&AuditFilter {
                limit: Some(1),
                ..AuditFilter::default()
            })
            .unwrap();
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn missing_day_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let trail = JsonlAuditTrail::new(dir.path().to_path_buf()).unwrap();
        let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert!(trail.read_day(day).unwrap().is_empty());
    }
}
