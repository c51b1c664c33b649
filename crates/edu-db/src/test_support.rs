//! Shared test utilities for edu-db unit and integration tests.
//!
//! Fault-injecting wrappers let tests drive the coordinator's failure paths
//! (counter update failing after the edge committed, audit sink down) over
//! real in-memory stores.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use edu_core::entities::{AuditRecord, CourseDoc, GraphNode, NewCourse};
use tokio::sync::Mutex;

use crate::audit::AuditSink;
use crate::coordinator::EnrollmentCoordinator;
use crate::documents::{CourseStore, LibsqlCourseStore};
use crate::error::DatabaseError;
use crate::graph::{GraphStore, LibsqlGraphStore, Mutation, MutationResult, Pattern};
use crate::lifecycle::CourseLifecycle;
use crate::reconcile::Reconciler;

/// Course store whose counter updates fail while armed.
pub struct FlakyCourseStore {
    inner: LibsqlCourseStore,
    fail_counter: AtomicBool,
}

impl FlakyCourseStore {
    #[must_use]
    pub const fn new(inner: LibsqlCourseStore) -> Self {
        Self {
            inner,
            fail_counter: AtomicBool::new(false),
        }
    }

    /// Make every following `increment_enrolled_count` fail (or stop failing).
    pub fn fail_counter_updates(&self, fail: bool) {
        self.fail_counter.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CourseStore for FlakyCourseStore {
    async fn insert_course(&self, course: &NewCourse) -> Result<CourseDoc, DatabaseError> {
        self.inner.insert_course(course).await
    }

    async fn find_course_by_id(&self, id: &str) -> Result<Option<CourseDoc>, DatabaseError> {
        self.inner.find_course_by_id(id).await
    }

    async fn find_course_by_name(&self, name: &str) -> Result<Option<CourseDoc>, DatabaseError> {
        self.inner.find_course_by_name(name).await
    }

    async fn list_courses(&self, limit: Option<u32>) -> Result<Vec<CourseDoc>, DatabaseError> {
        self.inner.list_courses(limit).await
    }

    async fn delete_course(&self, id: &str) -> Result<bool, DatabaseError> {
        self.inner.delete_course(id).await
    }

    async fn increment_enrolled_count(&self, id: &str, delta: i64) -> Result<bool, DatabaseError> {
        if self.fail_counter.load(Ordering::SeqCst) {
            return Err(DatabaseError::Query(
                "injected: document store unreachable".into(),
            ));
        }
        self.inner.increment_enrolled_count(id, delta).await
    }

    async fn set_enrolled_count(&self, id: &str, value: u32) -> Result<bool, DatabaseError> {
        self.inner.set_enrolled_count(id, value).await
    }
}

/// Graph store that fails every call.
#[derive(Debug, Default)]
pub struct UnreachableGraphStore;

#[async_trait]
impl GraphStore for UnreachableGraphStore {
    async fn query(&self, _pattern: &Pattern) -> Result<Vec<GraphNode>, DatabaseError> {
        Err(DatabaseError::Query("injected: graph store unreachable".into()))
    }

    async fn mutate(&self, _mutation: Mutation) -> Result<MutationResult, DatabaseError> {
        Err(DatabaseError::Query("injected: graph store unreachable".into()))
    }
}

/// Audit sink that keeps records in memory, or fails every append.
#[derive(Default)]
pub struct RecordingAuditSink {
    records: Mutex<Vec<AuditRecord>>,
    fail: AtomicBool,
}

impl RecordingAuditSink {
    #[must_use]
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: AtomicBool::new(true),
        }
    }

    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<(), DatabaseError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DatabaseError::Query("injected: audit sink unreachable".into()));
        }
        self.records.lock().await.push(record.clone());
        Ok(())
    }
}

/// In-memory stores plus the components built over them.
pub struct TestHarness {
    pub graph: Arc<LibsqlGraphStore>,
    pub courses: Arc<FlakyCourseStore>,
    pub audit: Arc<RecordingAuditSink>,
    pub coordinator: EnrollmentCoordinator,
    pub lifecycle: CourseLifecycle,
    pub reconciler: Reconciler,
}

impl TestHarness {
    /// # Errors
    ///
    /// Returns `DatabaseError` if an in-memory store cannot be migrated.
    pub async fn new() -> Result<Self, DatabaseError> {
        Self::with_audit(RecordingAuditSink::default()).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if an in-memory store cannot be migrated.
    pub async fn with_audit(audit: RecordingAuditSink) -> Result<Self, DatabaseError> {
        let graph = Arc::new(LibsqlGraphStore::in_memory().await?);
        let courses = Arc::new(FlakyCourseStore::new(LibsqlCourseStore::in_memory().await?));
        let audit = Arc::new(audit);
        let coordinator = EnrollmentCoordinator::new(graph.clone(), courses.clone(), audit.clone());
        Ok(Self {
            lifecycle: CourseLifecycle::new(courses.clone(), coordinator.clone()),
            reconciler: Reconciler::new(graph.clone(), courses.clone()),
            graph,
            courses,
            audit,
            coordinator,
        })
    }

    /// Insert a course document directly, bypassing auto-enrollment.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert fails.
    pub async fn seed_course(&self, name: &str, teacher: &str) -> Result<CourseDoc, DatabaseError> {
        self.courses
            .insert_course(&NewCourse {
                course_name: name.to_string(),
                taught_by: teacher.to_string(),
            })
            .await
    }

    /// Current `enrolled_count`, `None` if the course document is gone.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the lookup fails.
    pub async fn enrolled_count(&self, course_id: &str) -> Result<Option<u32>, DatabaseError> {
        Ok(self
            .courses
            .find_course_by_id(course_id)
            .await?
            .map(|c| c.enrolled_count))
    }
}
