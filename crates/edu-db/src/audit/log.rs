//! Audit log table in its own libSQL database.

use async_trait::async_trait;
use chrono::NaiveDate;
use edu_core::entities::AuditRecord;
use edu_core::enums::AuditAction;

use super::AuditSink;
use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_date, parse_datetime, parse_enum, parse_json_or_null};
use crate::retry::RetryConfig;
use crate::{EduDb, Schema};

/// Filter criteria for audit queries.
#[derive(Debug, Default)]
pub struct AuditFilter {
    pub actor: Option<String>,
    pub action: Option<AuditAction>,
    pub log_date: Option<NaiveDate>,
    pub limit: Option<u32>,
}

/// Append-only `query_audit` table.
pub struct LibsqlAuditLog {
    db: EduDb,
}

impl LibsqlAuditLog {
    #[must_use]
    pub const fn new(db: EduDb) -> Self {
        Self { db }
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or migrated.
    pub async fn open(path: &str, retry: RetryConfig) -> Result<Self, DatabaseError> {
        Ok(Self::new(EduDb::open_local(path, Schema::Audit, retry).await?))
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if migrations fail.
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(EduDb::open_in_memory(Schema::Audit).await?))
    }

    /// Query audit records with optional filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref actor) = filter.actor {
            params.push(libsql::Value::Text(actor.clone()));
            conditions.push(format!("actor = ?{}", params.len()));
        }
        if let Some(action) = filter.action {
            params.push(libsql::Value::Text(action.as_str().to_string()));
            conditions.push(format!("action = ?{}", params.len()));
        }
        if let Some(day) = filter.log_date {
            params.push(libsql::Value::Text(day.to_string()));
            conditions.push(format!("log_date = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit = filter.limit.unwrap_or(100);
        let sql = format!(
            "SELECT log_date, ts, actor, action, params
             FROM query_audit {where_clause}
             ORDER BY ts DESC, id DESC LIMIT {limit}"
        );

        let mut rows = self
            .db
            .query_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        let mut records = Vec::new();

        while let Some(row) = rows.next().await? {
            records.push(AuditRecord {
                log_date: parse_date(&row.get::<String>(0)?)?,
                logged_at: parse_datetime(&row.get::<String>(1)?)?,
                actor: row.get::<String>(2)?,
                action: parse_enum(&row.get::<String>(3)?)?,
                params: parse_json_or_null(get_opt_string(&row, 4)?.as_deref())?,
            });
        }

        Ok(records)
    }
}

#[async_trait]
impl AuditSink for LibsqlAuditLog {
    async fn append(&self, record: &AuditRecord) -> Result<(), DatabaseError> {
        let params = (!record.params.is_null()).then(|| record.params.to_string());
        self.db
            .execute_with(
                "INSERT INTO query_audit (log_date, ts, actor, action, params)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                || {
                    libsql::params![
                        record.log_date.to_string(),
                        record.logged_at.to_rfc3339(),
                        record.actor.as_str(),
                        record.action.as_str(),
                        params.as_deref()
                    ]
                },
            )
            .await?;
        Ok(())
    }
}
