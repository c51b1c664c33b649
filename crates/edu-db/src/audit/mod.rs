//! Audit sink.
//!
//! The coordinator appends one record per state-changing enroll or unenroll.
//! Appends are fire-and-forget from the coordinator's point of view: a sink
//! error is logged and never fails the enrollment call.

mod log;
mod trail;

use async_trait::async_trait;
use edu_core::entities::AuditRecord;

use crate::error::DatabaseError;

pub use log::{AuditFilter, LibsqlAuditLog};
pub use trail::JsonlAuditTrail;

/// Destination for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, record: &AuditRecord) -> Result<(), DatabaseError>;
}

/// Sink that drops every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAuditSink;

#[async_trait]
impl AuditSink for DisabledAuditSink {
    async fn append(&self, _record: &AuditRecord) -> Result<(), DatabaseError> {
        Ok(())
    }
}
