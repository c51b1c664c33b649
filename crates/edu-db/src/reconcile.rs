//! Counter reconciliation.
//!
//! Recomputes `enrolled_count` from the authoritative edge set. The course's
//! teacher holds an edge (auto-enrollment) but is not counted.

use std::sync::Arc;

use edu_core::enums::StoreKind;
use edu_core::ids::validate_external_id;
use edu_core::responses::ReconcileReport;

use crate::documents::CourseStore;
use crate::error::ServiceError;
use crate::graph::{GraphStore, Pattern};

#[derive(Clone)]
pub struct Reconciler {
    graph: Arc<dyn GraphStore>,
    courses: Arc<dyn CourseStore>,
}

impl Reconciler {
    #[must_use]
    pub fn new(graph: Arc<dyn GraphStore>, courses: Arc<dyn CourseStore>) -> Self {
        Self { graph, courses }
    }

    /// Compare and repair one course's counter.
    ///
    /// # Errors
    ///
    /// `NotFound` if the course document does not exist, `StoreUnavailable`
    /// if either store fails.
    pub async fn reconcile_course(&self, course_id: &str) -> Result<ReconcileReport, ServiceError> {
        let course_id = validate_external_id("course_id", course_id)?;
        let doc = self
            .courses
            .find_course_by_id(course_id)
            .await
            .map_err(ServiceError::store(StoreKind::Documents))?
            .ok_or_else(|| ServiceError::not_found("course", course_id))?;

        let enrolled = self
            .graph
            .query(&Pattern::students_of(course_id))
            .await
            .map_err(ServiceError::store(StoreKind::Graph))?;
        let counted = enrolled.iter().filter(|n| n.key != doc.taught_by).count();
        let actual = u32::try_from(counted).unwrap_or(u32::MAX);
        let drift = i64::from(actual) - i64::from(doc.enrolled_count);

        let corrected = if drift == 0 {
            false
        } else {
            tracing::warn!(
                course_id,
                recorded = doc.enrolled_count,
                actual,
                drift,
                "enrolled_count drift detected"
            );
            self.courses
                .set_enrolled_count(course_id, actual)
                .await
                .map_err(ServiceError::store(StoreKind::Documents))?
        };

        Ok(ReconcileReport {
            course_id: course_id.to_string(),
            recorded: doc.enrolled_count,
            actual,
            drift,
            corrected,
        })
    }

    /// Reconcile every course document.
    ///
    /// # Errors
    ///
    /// Stops at the first store failure.
    pub async fn reconcile_all(&self) -> Result<Vec<ReconcileReport>, ServiceError> {
        let courses = self
            .courses
            .list_courses(None)
            .await
            .map_err(ServiceError::store(StoreKind::Documents))?;
        let mut reports = Vec::with_capacity(courses.len());
        for course in courses {
            match self.reconcile_course(&course.id).await {
                Ok(report) => reports.push(report),
                // Deleted between listing and reconciling.
                Err(ServiceError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        let drifted = reports.iter().filter(|r| r.has_drift()).count();
        tracing::info!(courses = reports.len(), drifted, "reconciliation pass finished");
        Ok(reports)
    }
}
