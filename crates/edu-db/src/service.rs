//! Service wiring.
//!
//! `EduService` opens the three stores named by an [`EduConfig`], builds the
//! coordinator, lifecycle hooks and reconciler over explicitly shared store
//! handles, and exposes audit queries for whichever sink is configured.

use std::path::PathBuf;
use std::sync::Arc;

use edu_config::{AuditSinkKind, EduConfig};
use edu_core::entities::AuditRecord;
use edu_core::enums::StoreKind;

use crate::audit::{AuditFilter, AuditSink, DisabledAuditSink, JsonlAuditTrail, LibsqlAuditLog};
use crate::coordinator::EnrollmentCoordinator;
use crate::documents::{CourseStore, LibsqlCourseStore};
use crate::error::{DatabaseError, ServiceError};
use crate::graph::{GraphStore, LibsqlGraphStore};
use crate::lifecycle::CourseLifecycle;
use crate::reconcile::Reconciler;
use crate::resolver::NodeResolver;
use crate::retry::RetryConfig;

/// Which configured sink answers audit queries.
enum AuditReader {
    Database(Arc<LibsqlAuditLog>),
    Jsonl(Arc<JsonlAuditTrail>),
    None,
}

/// The enrollment engine with its stores opened and wired together.
pub struct EduService {
    coordinator: EnrollmentCoordinator,
    lifecycle: CourseLifecycle,
    reconciler: Reconciler,
    audit_reader: AuditReader,
}

impl EduService {
    /// Wire the engine over already-open stores.
    #[must_use]
    pub fn from_stores(
        graph: Arc<dyn GraphStore>,
        courses: Arc<dyn CourseStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let coordinator =
            EnrollmentCoordinator::new(Arc::clone(&graph), Arc::clone(&courses), audit);
        Self {
            lifecycle: CourseLifecycle::new(Arc::clone(&courses), coordinator.clone()),
            reconciler: Reconciler::new(graph, courses),
            coordinator,
            audit_reader: AuditReader::None,
        }
    }

    /// Open every store named in `config`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if any store cannot be opened or migrated.
    pub async fn open(config: &EduConfig) -> Result<Self, DatabaseError> {
        let retry = RetryConfig::from(&config.retry);
        let graph = Arc::new(LibsqlGraphStore::open(&config.graph.path, retry.clone()).await?);
        let courses =
            Arc::new(LibsqlCourseStore::open(&config.documents.path, retry.clone()).await?);

        let (sink, reader): (Arc<dyn AuditSink>, AuditReader) = match config.audit.sink {
            AuditSinkKind::Database => {
                let log = Arc::new(LibsqlAuditLog::open(&config.audit.path, retry).await?);
                let sink: Arc<dyn AuditSink> = log.clone();
                (sink, AuditReader::Database(log))
            }
            AuditSinkKind::Jsonl => {
                let trail = Arc::new(JsonlAuditTrail::new(PathBuf::from(
                    &config.audit.trail_dir,
                ))?);
                let sink: Arc<dyn AuditSink> = trail.clone();
                (sink, AuditReader::Jsonl(trail))
            }
            AuditSinkKind::Disabled => (Arc::new(DisabledAuditSink), AuditReader::None),
        };

        tracing::debug!(
            graph = %config.graph.path,
            documents = %config.documents.path,
            audit = ?config.audit.sink,
            "opened stores"
        );
        let mut service = Self::from_stores(graph, courses, sink);
        service.audit_reader = reader;
        Ok(service)
    }

    /// Fully in-memory engine with a database audit log.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if migrations fail.
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        let log = Arc::new(LibsqlAuditLog::in_memory().await?);
        let mut service = Self::from_stores(
            Arc::new(LibsqlGraphStore::in_memory().await?),
            Arc::new(LibsqlCourseStore::in_memory().await?),
            log.clone(),
        );
        service.audit_reader = AuditReader::Database(log);
        Ok(service)
    }

    #[must_use]
    pub const fn coordinator(&self) -> &EnrollmentCoordinator {
        &self.coordinator
    }

    #[must_use]
    pub const fn lifecycle(&self) -> &CourseLifecycle {
        &self.lifecycle
    }

    #[must_use]
    pub const fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    #[must_use]
    pub const fn resolver(&self) -> &NodeResolver {
        self.coordinator.resolver()
    }

    /// Query the configured audit sink. A disabled sink has no records.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if the audit store cannot be read.
    pub async fn query_audit(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, ServiceError> {
        match &self.audit_reader {
            AuditReader::Database(log) => log
                .query(filter)
                .await
                .map_err(ServiceError::store(StoreKind::Audit)),
            AuditReader::Jsonl(trail) => trail
                .query(filter)
                .map_err(ServiceError::store(StoreKind::Audit)),
            AuditReader::None => Ok(Vec::new()),
        }
    }
}
