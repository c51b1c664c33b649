use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A course document as held by the document store.
///
/// `enrolled_count` is a denormalized copy of the number of student
/// Enrolled-in edges pointing at the course. It never goes below zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseDoc {
    pub id: String,
    pub course_name: String,
    pub taught_by: String,
    pub enrolled_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Inputs required to create a course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewCourse {
    pub course_name: String,
    pub taught_by: String,
}
