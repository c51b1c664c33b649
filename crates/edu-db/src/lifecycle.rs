//! Course lifecycle hooks.
//!
//! Course creation and deletion happen in the document store; the graph side
//! follows through the coordinator (teacher auto-enrollment on create, cascade
//! on delete).

use std::sync::Arc;

use edu_core::entities::{CourseDoc, NewCourse};
use edu_core::enums::StoreKind;
use edu_core::ids::validate_external_id;
use edu_core::responses::CascadeResponse;

use crate::coordinator::EnrollmentCoordinator;
use crate::documents::CourseStore;
use crate::error::ServiceError;

#[derive(Clone)]
pub struct CourseLifecycle {
    courses: Arc<dyn CourseStore>,
    coordinator: EnrollmentCoordinator,
}

impl CourseLifecycle {
    #[must_use]
    pub fn new(courses: Arc<dyn CourseStore>, coordinator: EnrollmentCoordinator) -> Self {
        Self {
            courses,
            coordinator,
        }
    }

    /// Create a course and auto-enroll its teacher.
    ///
    /// The teacher edge is best-effort: a graph failure is logged and the
    /// created course is still returned.
    ///
    /// # Errors
    ///
    /// `Validation` for blank fields, `Conflict` if a course with the same
    /// name exists, `StoreUnavailable` if the document store fails.
    pub async fn create_course(&self, course: &NewCourse) -> Result<CourseDoc, ServiceError> {
        let course_name = validate_external_id("course_name", &course.course_name)?;
        let taught_by = validate_external_id("taught_by", &course.taught_by)?;

        let existing = self
            .courses
            .find_course_by_name(course_name)
            .await
            .map_err(ServiceError::store(StoreKind::Documents))?;
        if let Some(existing) = existing {
            return Err(ServiceError::Conflict(format!(
                "course '{course_name}' already exists ({})",
                existing.id
            )));
        }

        let doc = self
            .courses
            .insert_course(&NewCourse {
                course_name: course_name.to_string(),
                taught_by: taught_by.to_string(),
            })
            .await
            .map_err(ServiceError::store(StoreKind::Documents))?;
        tracing::info!(course_id = %doc.id, course_name, taught_by, "created course");

        if let Err(e) = self.coordinator.auto_enroll_teacher(&doc.id, taught_by).await {
            tracing::warn!(
                course_id = %doc.id,
                teacher = taught_by,
                error = %e,
                "teacher auto-enrollment failed; course created without teacher edge"
            );
        }
        Ok(doc)
    }

    /// Delete the course document, then cascade the graph cleanup.
    ///
    /// # Errors
    ///
    /// `NotFound` if the course document does not exist, `StoreUnavailable`
    /// if either store fails.
    pub async fn delete_course(&self, course_id: &str) -> Result<CascadeResponse, ServiceError> {
        let course_id = validate_external_id("course_id", course_id)?;
        let deleted = self
            .courses
            .delete_course(course_id)
            .await
            .map_err(ServiceError::store(StoreKind::Documents))?;
        if !deleted {
            return Err(ServiceError::not_found("course", course_id));
        }
        tracing::info!(course_id, "deleted course document");
        self.coordinator.cascade_delete_course(course_id).await
    }

    /// # Errors
    ///
    /// `NotFound` if absent, `StoreUnavailable` if the document store fails.
    pub async fn get_course(&self, course_id: &str) -> Result<CourseDoc, ServiceError> {
        let course_id = validate_external_id("course_id", course_id)?;
        self.courses
            .find_course_by_id(course_id)
            .await
            .map_err(ServiceError::store(StoreKind::Documents))?
            .ok_or_else(|| ServiceError::not_found("course", course_id))
    }

    /// # Errors
    ///
    /// `StoreUnavailable` if the document store fails.
    pub async fn list_courses(&self, limit: Option<u32>) -> Result<Vec<CourseDoc>, ServiceError> {
        self.courses
            .list_courses(limit)
            .await
            .map_err(ServiceError::store(StoreKind::Documents))
    }
}
