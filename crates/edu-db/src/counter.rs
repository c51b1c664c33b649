//! Counter adapter over the document store's atomic increment.

use std::sync::Arc;

use crate::documents::CourseStore;
use crate::error::DatabaseError;

/// Whether a counter update changed the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterUpdate {
    Applied,
    /// The course document is missing, or the decrement hit the zero floor.
    Unchanged,
    /// The user teaches the course; teachers are never counted.
    Exempt,
}

impl CounterUpdate {
    const fn from_modified(modified: bool) -> Self {
        if modified { Self::Applied } else { Self::Unchanged }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Unchanged => "unchanged",
            Self::Exempt => "exempt",
        }
    }
}

/// `enrolled_count` maintenance on course documents.
#[derive(Clone)]
pub struct EnrolledCounter {
    courses: Arc<dyn CourseStore>,
}

impl EnrolledCounter {
    #[must_use]
    pub fn new(courses: Arc<dyn CourseStore>) -> Self {
        Self { courses }
    }

    /// Unconditional `+1`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the document store call fails.
    pub async fn increment(&self, course_id: &str) -> Result<CounterUpdate, DatabaseError> {
        let modified = self.courses.increment_enrolled_count(course_id, 1).await?;
        Ok(CounterUpdate::from_modified(modified))
    }

    /// `-1` only while the stored value is above zero.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the document store call fails.
    pub async fn decrement(&self, course_id: &str) -> Result<CounterUpdate, DatabaseError> {
        let modified = self.courses.increment_enrolled_count(course_id, -1).await?;
        Ok(CounterUpdate::from_modified(modified))
    }
}
