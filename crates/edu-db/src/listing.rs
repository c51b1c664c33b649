//! Lazy, restartable enrollment listings.
//!
//! The graph traversal runs once when the cursor is built. The document-store
//! lookup for display attributes runs per row, only when that row is pulled.

use std::sync::Arc;

use edu_core::entities::GraphNode;
use edu_core::enums::StoreKind;
use edu_core::responses::EnrollmentInfo;

use crate::documents::CourseStore;
use crate::error::ServiceError;

#[derive(Debug, Clone)]
enum Anchor {
    /// Rows are Course nodes reached from this user.
    User(String),
    /// Rows are User nodes reached backwards from this course.
    Course(String),
}

/// Sequence of [`EnrollmentInfo`] joined from graph rows and course documents.
///
/// A row whose course document is missing yields `course_name = None` rather
/// than an error: the graph edge is authoritative.
pub struct EnrollmentCursor {
    anchor: Anchor,
    rows: Vec<GraphNode>,
    position: usize,
    courses: Arc<dyn CourseStore>,
}

impl EnrollmentCursor {
    pub(crate) fn for_user(
        user_id: &str,
        rows: Vec<GraphNode>,
        courses: Arc<dyn CourseStore>,
    ) -> Self {
        Self {
            anchor: Anchor::User(user_id.to_string()),
            rows,
            position: 0,
            courses,
        }
    }

    pub(crate) fn for_course(
        course_id: &str,
        rows: Vec<GraphNode>,
        courses: Arc<dyn CourseStore>,
    ) -> Self {
        Self {
            anchor: Anchor::Course(course_id.to_string()),
            rows,
            position: 0,
            courses,
        }
    }

    /// Total number of rows, independent of the current position.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rows.len().saturating_sub(self.position)
    }

    /// Restart from the first row. Display attributes are looked up again.
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Pull the next joined row.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if the document store lookup fails. The position
    /// still advances past the failed row.
    pub async fn next(&mut self) -> Result<Option<EnrollmentInfo>, ServiceError> {
        let Some(node) = self.rows.get(self.position).cloned() else {
            return Ok(None);
        };
        self.position += 1;

        let info = match &self.anchor {
            Anchor::User(user_id) => EnrollmentInfo {
                user_id: user_id.clone(),
                course_name: self.course_name(&node.key).await?,
                course_id: node.key,
                user_name: None,
            },
            Anchor::Course(course_id) => EnrollmentInfo {
                user_id: node.key,
                course_id: course_id.clone(),
                course_name: self.course_name(course_id).await?,
                user_name: node.full_name,
            },
        };
        Ok(Some(info))
    }

    /// Drain the remaining rows into a `Vec`.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if any document store lookup fails.
    pub async fn collect_all(mut self) -> Result<Vec<EnrollmentInfo>, ServiceError> {
        let mut out = Vec::with_capacity(self.remaining());
        while let Some(info) = self.next().await? {
            out.push(info);
        }
        Ok(out)
    }

    async fn course_name(&self, course_id: &str) -> Result<Option<String>, ServiceError> {
        let doc = self
            .courses
            .find_course_by_id(course_id)
            .await
            .map_err(ServiceError::store(StoreKind::Documents))?;
        if doc.is_none() {
            tracing::debug!(course_id, "course document missing, omitting course name");
        }
        Ok(doc.map(|d| d.course_name))
    }
}

impl std::fmt::Debug for EnrollmentCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrollmentCursor")
            .field("anchor", &self.anchor)
            .field("rows", &self.rows.len())
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}
