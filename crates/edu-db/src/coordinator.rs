//! Enrollment coordinator.
//!
//! Keeps the relationship store (who is enrolled where) and the document
//! store (`enrolled_count`) in agreement without a cross-store transaction.
//!
//! Every state change is a two-step saga:
//!
//! 1. write (or delete) the `enrolled_in` edge in the graph store;
//! 2. adjust `enrolled_count` in the document store.
//!
//! Step 1 commits before step 2 starts. There is no compensating rollback of
//! the edge: if step 2 fails the call reports [`ServiceError::PartialWrite`]
//! and [`Reconciler`](crate::reconcile::Reconciler) later repairs the counter
//! from the edge set. Audit records go out after step 2 and never fail the
//! call.
//!
//! Idempotence comes from the existence check before step 1, and the graph
//! store's edge uniqueness closes the window between check and write: a
//! losing concurrent writer sees `edges_added == 0` and skips step 2.

use std::sync::Arc;

use edu_core::entities::{AuditRecord, NodeHandle};
use edu_core::enums::{AuditAction, Predicate, StoreKind};
use edu_core::ids::validate_external_id;
use edu_core::responses::{AutoEnrollResponse, CascadeResponse, EnrollResponse, UnenrollResponse};
use serde_json::json;

use crate::audit::AuditSink;
use crate::counter::{CounterUpdate, EnrolledCounter};
use crate::documents::CourseStore;
use crate::error::{DatabaseError, ServiceError};
use crate::graph::{GraphStore, Mutation, NodeRef, Pattern};
use crate::listing::EnrollmentCursor;
use crate::resolver::NodeResolver;

/// Coordinates enrollment state across the graph and document stores.
///
/// Store handles are injected; the coordinator holds no global state.
#[derive(Clone)]
pub struct EnrollmentCoordinator {
    graph: Arc<dyn GraphStore>,
    courses: Arc<dyn CourseStore>,
    audit: Arc<dyn AuditSink>,
    resolver: NodeResolver,
    counter: EnrolledCounter,
}

impl EnrollmentCoordinator {
    #[must_use]
    pub fn new(
        graph: Arc<dyn GraphStore>,
        courses: Arc<dyn CourseStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            resolver: NodeResolver::new(Arc::clone(&graph)),
            counter: EnrolledCounter::new(Arc::clone(&courses)),
            graph,
            courses,
            audit,
        }
    }

    #[must_use]
    pub const fn resolver(&self) -> &NodeResolver {
        &self.resolver
    }

    /// Enroll `user_id` in `course_id`.
    ///
    /// Returns `enrolled = true` when this call created the edge, and
    /// `already_enrolled = true` when the edge already existed. The course's
    /// own teacher gets the edge but is not counted in `enrolled_count`.
    ///
    /// # Errors
    ///
    /// - `Validation` for blank identifiers.
    /// - `StoreUnavailable` if resolution, the existence or teacher check, or the edge
    ///   write fails (nothing was enrolled).
    /// - `Conflict` if the user or course node was deleted between resolution
    ///   and the edge write (nothing was enrolled).
    /// - `PartialWrite` if the edge committed but the counter update failed.
    pub async fn enroll(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<EnrollResponse, ServiceError> {
        let user_id = validate_external_id("user_id", user_id)?;
        let course_id = validate_external_id("course_id", course_id)?;

        let user = self.resolver.resolve_or_create_user(user_id).await?;
        let course = self.resolver.resolve_or_create_course(course_id).await?;

        if self.is_enrolled(user_id, course_id).await? {
            tracing::debug!(user_id, course_id, "already enrolled");
            return Ok(EnrollResponse::already_enrolled(user_id, course_id));
        }
        let teaches = self.teaches(user_id, course_id).await?;

        let written = self
            .graph
            .mutate(Mutation::new().set_edge(
                NodeRef::from(&user),
                Predicate::EnrolledIn,
                NodeRef::from(&course),
            ))
            .await
            .map_err(ServiceError::store(StoreKind::Graph))?;
        if written.edges_dangling > 0 {
            return Err(vanished(user_id, course_id));
        }
        if written.edges_added == 0 {
            tracing::info!(user_id, course_id, "concurrent enroll wrote the edge first");
            return Ok(EnrollResponse::already_enrolled(user_id, course_id));
        }

        let counter = if teaches {
            Ok(CounterUpdate::Exempt)
        } else {
            self.counter.increment(course_id).await
        };
        self.settle(user_id, course_id, &user, AuditAction::EnrolledIn, counter)
            .await?;

        tracing::info!(user_id, course_id, "enrolled");
        Ok(EnrollResponse::enrolled(user_id, course_id))
    }

    /// Remove `user_id` from `course_id`.
    ///
    /// Resolution is read-only: unknown users or courses are simply "not
    /// enrolled" and no nodes are created.
    ///
    /// # Errors
    ///
    /// - `Validation` for blank identifiers.
    /// - `StoreUnavailable` if a graph read, the teacher lookup or the edge delete fails.
    /// - `PartialWrite` if the edge was removed but the counter update failed.
    pub async fn unenroll(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<UnenrollResponse, ServiceError> {
        let user_id = validate_external_id("user_id", user_id)?;
        let course_id = validate_external_id("course_id", course_id)?;

        let Some(user) = self.resolver.lookup_user(user_id).await? else {
            tracing::debug!(user_id, course_id, "unknown user, nothing to unenroll");
            return Ok(UnenrollResponse::not_enrolled(user_id, course_id));
        };
        let Some(course) = self.resolver.lookup_course(course_id).await? else {
            tracing::debug!(user_id, course_id, "unknown course, nothing to unenroll");
            return Ok(UnenrollResponse::not_enrolled(user_id, course_id));
        };

        if !self.is_enrolled(user_id, course_id).await? {
            tracing::debug!(user_id, course_id, "not enrolled");
            return Ok(UnenrollResponse::not_enrolled(user_id, course_id));
        }
        let teaches = self.teaches(user_id, course_id).await?;

        let removed = self
            .graph
            .mutate(Mutation::new().delete_edge(
                NodeRef::from(&user.uid),
                Predicate::EnrolledIn,
                NodeRef::from(&course.uid),
            ))
            .await
            .map_err(ServiceError::store(StoreKind::Graph))?;
        if removed.edges_removed == 0 {
            tracing::info!(user_id, course_id, "concurrent unenroll removed the edge first");
            return Ok(UnenrollResponse::not_enrolled(user_id, course_id));
        }

        let counter = if teaches {
            Ok(CounterUpdate::Exempt)
        } else {
            self.counter.decrement(course_id).await
        };
        self.settle(user_id, course_id, &user.uid, AuditAction::UnenrolledFrom, counter)
            .await?;

        tracing::info!(user_id, course_id, "unenrolled");
        Ok(UnenrollResponse::unenrolled(user_id, course_id))
    }

    /// Enroll the course's teacher. Called right after a course document is
    /// created. Writes the edge only: teachers are not counted in
    /// `enrolled_count` and no audit record is emitted.
    ///
    /// # Errors
    ///
    /// `Validation` for blank identifiers, `StoreUnavailable` if the graph
    /// store fails, `Conflict` if the course node was deleted before the
    /// edge was written. Callers treat this as best-effort.
    pub async fn auto_enroll_teacher(
        &self,
        course_id: &str,
        teacher: &str,
    ) -> Result<AutoEnrollResponse, ServiceError> {
        let course_id = validate_external_id("course_id", course_id)?;
        let teacher = validate_external_id("teacher", teacher)?;

        let user = self.resolver.resolve_or_create_user(teacher).await?;
        let course = self.resolver.resolve_or_create_course(course_id).await?;
        let written = self
            .graph
            .mutate(Mutation::new().set_edge(
                NodeRef::from(&user),
                Predicate::EnrolledIn,
                NodeRef::from(&course),
            ))
            .await
            .map_err(ServiceError::store(StoreKind::Graph))?;
        if written.edges_dangling > 0 {
            return Err(vanished(teacher, course_id));
        }

        tracing::info!(
            course_id,
            teacher,
            edge_created = written.edges_added > 0,
            "auto-enrolled teacher"
        );
        Ok(AutoEnrollResponse {
            teacher: teacher.to_string(),
            course_id: course_id.to_string(),
            edge_created: written.edges_added > 0,
        })
    }

    /// Remove the Course node and every edge touching it.
    ///
    /// A course with no graph presence is not an error. `enrolled_count` is
    /// not touched: the course document is already gone.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank identifier, `StoreUnavailable` if the graph
    /// store fails.
    pub async fn cascade_delete_course(
        &self,
        course_id: &str,
    ) -> Result<CascadeResponse, ServiceError> {
        let course_id = validate_external_id("course_id", course_id)?;

        let Some(course) = self.resolver.lookup_course(course_id).await? else {
            tracing::debug!(course_id, "course has no graph node, nothing to cascade");
            return Ok(CascadeResponse {
                course_id: course_id.to_string(),
                node_removed: false,
                edges_removed: 0,
            });
        };

        let result = self
            .graph
            .mutate(Mutation::new().delete_node(course.uid))
            .await
            .map_err(ServiceError::store(StoreKind::Graph))?;

        tracing::info!(
            course_id,
            edges_removed = result.edges_removed,
            "cascade-deleted course node"
        );
        Ok(CascadeResponse {
            course_id: course_id.to_string(),
            node_removed: result.nodes_deleted > 0,
            edges_removed: result.edges_removed,
        })
    }

    /// Courses `user_id` is enrolled in, joined with course names.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank identifier, `StoreUnavailable` if the graph
    /// traversal fails.
    pub async fn list_enrollments_for_user(
        &self,
        user_id: &str,
    ) -> Result<EnrollmentCursor, ServiceError> {
        let user_id = validate_external_id("user_id", user_id)?;
        let rows = self
            .graph
            .query(&Pattern::enrollments_of(user_id))
            .await
            .map_err(ServiceError::store(StoreKind::Graph))?;
        Ok(EnrollmentCursor::for_user(
            user_id,
            rows,
            Arc::clone(&self.courses),
        ))
    }

    /// Users enrolled in `course_id` (reverse traversal), including the
    /// auto-enrolled teacher.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank identifier, `StoreUnavailable` if the graph
    /// traversal fails.
    pub async fn list_students_for_course(
        &self,
        course_id: &str,
    ) -> Result<EnrollmentCursor, ServiceError> {
        let course_id = validate_external_id("course_id", course_id)?;
        let rows = self
            .graph
            .query(&Pattern::students_of(course_id))
            .await
            .map_err(ServiceError::store(StoreKind::Graph))?;
        Ok(EnrollmentCursor::for_course(
            course_id,
            rows,
            Arc::clone(&self.courses),
        ))
    }

    async fn is_enrolled(&self, user_id: &str, course_id: &str) -> Result<bool, ServiceError> {
        let hits = self
            .graph
            .query(&Pattern::enrollment(user_id, course_id))
            .await
            .map_err(ServiceError::store(StoreKind::Graph))?;
        Ok(!hits.is_empty())
    }

    /// Whether the course document names `user_id` as its teacher. A missing
    /// document means no.
    async fn teaches(&self, user_id: &str, course_id: &str) -> Result<bool, ServiceError> {
        let doc = self
            .courses
            .find_course_by_id(course_id)
            .await
            .map_err(ServiceError::store(StoreKind::Documents))?;
        Ok(doc.is_some_and(|doc| doc.taught_by == user_id))
    }

    /// Step 2 bookkeeping: audit the change and classify the counter outcome.
    async fn settle(
        &self,
        user_id: &str,
        course_id: &str,
        user: &NodeHandle,
        action: AuditAction,
        counter: Result<CounterUpdate, DatabaseError>,
    ) -> Result<(), ServiceError> {
        let outcome = match &counter {
            Ok(update) => update.as_str(),
            Err(_) => "failed",
        };
        if matches!(counter, Ok(CounterUpdate::Unchanged)) {
            tracing::warn!(
                user_id,
                course_id,
                %action,
                "enrolled_count left unchanged: course document missing or already at zero"
            );
        }

        self.emit(AuditRecord::now(
            user_id,
            action,
            json!({
                "course_id": course_id,
                "user_uid": user.as_str(),
                "counter": outcome,
            }),
        ))
        .await;

        counter.map(|_| ()).map_err(|source| {
            tracing::warn!(
                user_id,
                course_id,
                %action,
                error = %source,
                "edge committed but enrolled_count update failed; counter drift until reconciled"
            );
            ServiceError::PartialWrite {
                user_id: user_id.to_string(),
                course_id: course_id.to_string(),
                action,
                source,
            }
        })
    }

    async fn emit(&self, record: AuditRecord) {
        if let Err(e) = self.audit.append(&record).await {
            tracing::warn!(
                actor = %record.actor,
                action = %record.action,
                error = %e,
                "audit append failed"
            );
        }
    }
}

fn vanished(user_id: &str, course_id: &str) -> ServiceError {
    tracing::warn!(user_id, course_id, "node deleted before the enrollment edge was written");
    ServiceError::Conflict(format!(
        "course {course_id} or user {user_id} was deleted while enrolling"
    ))
}
