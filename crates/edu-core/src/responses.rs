//! Response types returned by coordinator and lifecycle operations.
//!
//! These are serialized as JSON by the `edu` CLI and are the shapes an HTTP
//! layer would return.

use serde::{Deserialize, Serialize};

/// Result of `enroll`.
///
/// Exactly one of `enrolled` / `already_enrolled` is true on success.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrollResponse {
    pub user_id: String,
    pub course_id: String,
    pub enrolled: bool,
    pub already_enrolled: bool,
    pub message: String,
}

impl EnrollResponse {
    #[must_use]
    pub fn enrolled(user_id: &str, course_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            enrolled: true,
            already_enrolled: false,
            message: "Student enrolled in course.".to_string(),
        }
    }

    #[must_use]
    pub fn already_enrolled(user_id: &str, course_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            enrolled: false,
            already_enrolled: true,
            message: "User was already enrolled in this course. No changes applied.".to_string(),
        }
    }
}

/// Result of `unenroll`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnenrollResponse {
    pub user_id: String,
    pub course_id: String,
    pub unenrolled: bool,
    pub message: String,
}

impl UnenrollResponse {
    #[must_use]
    pub fn unenrolled(user_id: &str, course_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            unenrolled: true,
            message: "Student unenrolled from course.".to_string(),
        }
    }

    #[must_use]
    pub fn not_enrolled(user_id: &str, course_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            unenrolled: false,
            message: "User is not enrolled in this course. No changes applied.".to_string(),
        }
    }
}

/// One row of an enrollment listing (graph edge joined with the course document).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrollmentInfo {
    pub user_id: String,
    pub course_id: String,
    /// `None` when the document store has no record for `course_id`.
    pub course_name: Option<String>,
    pub user_name: Option<String>,
}

/// Result of `auto_enroll_teacher`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AutoEnrollResponse {
    pub teacher: String,
    pub course_id: String,
    /// False when the teacher edge already existed.
    pub edge_created: bool,
}

/// Result of `cascade_delete_course`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CascadeResponse {
    pub course_id: String,
    /// False when the course had no graph presence.
    pub node_removed: bool,
    pub edges_removed: u64,
}

/// Outcome of reconciling one course's `enrolled_count` against the graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcileReport {
    pub course_id: String,
    pub recorded: u32,
    pub actual: u32,
    /// `actual - recorded`.
    pub drift: i64,
    pub corrected: bool,
}

impl ReconcileReport {
    #[must_use]
    pub const fn has_drift(&self) -> bool {
        self.drift != 0
    }
}
