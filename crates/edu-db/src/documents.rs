//! Document store: course documents and their denormalized `enrolled_count`.
//!
//! The engine only needs a handful of calls from this store. The one that
//! matters for consistency is [`CourseStore::increment_enrolled_count`], a
//! single guarded UPDATE that never lets the counter go below zero.

use async_trait::async_trait;
use chrono::Utc;
use edu_core::entities::{CourseDoc, NewCourse};
use edu_core::ids::PREFIX_COURSE;

use crate::error::DatabaseError;
use crate::helpers::parse_datetime;
use crate::retry::RetryConfig;
use crate::{EduDb, Schema};

const COURSE_COLUMNS: &str = "id, course_name, taught_by, enrolled_count, created_at";

/// Course documents keyed by `course_id`.
#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Insert a new course with `enrolled_count = 0` and a generated id.
    async fn insert_course(&self, course: &NewCourse) -> Result<CourseDoc, DatabaseError>;

    async fn find_course_by_id(&self, id: &str) -> Result<Option<CourseDoc>, DatabaseError>;

    async fn find_course_by_name(&self, name: &str) -> Result<Option<CourseDoc>, DatabaseError>;

    /// Courses in creation order.
    async fn list_courses(&self, limit: Option<u32>) -> Result<Vec<CourseDoc>, DatabaseError>;

    /// Returns whether a document was removed.
    async fn delete_course(&self, id: &str) -> Result<bool, DatabaseError>;

    /// Add `delta` to `enrolled_count` unless the result would be negative.
    ///
    /// Returns whether a document was modified: `false` means either no such
    /// course or the guard rejected the update.
    async fn increment_enrolled_count(&self, id: &str, delta: i64) -> Result<bool, DatabaseError>;

    /// Overwrite `enrolled_count`. Returns whether a document was modified.
    async fn set_enrolled_count(&self, id: &str, value: u32) -> Result<bool, DatabaseError>;
}

/// Document store backed by its own libSQL database.
pub struct LibsqlCourseStore {
    db: EduDb,
}

impl LibsqlCourseStore {
    #[must_use]
    pub const fn new(db: EduDb) -> Self {
        Self { db }
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or migrated.
    pub async fn open(path: &str, retry: RetryConfig) -> Result<Self, DatabaseError> {
        Ok(Self::new(EduDb::open_local(path, Schema::Documents, retry).await?))
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if migrations fail.
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(EduDb::open_in_memory(Schema::Documents).await?))
    }

    #[must_use]
    pub const fn db(&self) -> &EduDb {
        &self.db
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<CourseDoc>, DatabaseError> {
        let mut rows = self
            .db
            .query_with(
                &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE {column} = ?1 ORDER BY created_at, id LIMIT 1"),
                || [value],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_course(&row)?)),
            None => Ok(None),
        }
    }
}

fn row_to_course(row: &libsql::Row) -> Result<CourseDoc, DatabaseError> {
    let id = row.get::<String>(0)?;
    let raw_count = row.get::<i64>(3)?;
    let enrolled_count = u32::try_from(raw_count).map_err(|_| {
        DatabaseError::InvalidState(format!("course {id} has enrolled_count {raw_count}"))
    })?;
    Ok(CourseDoc {
        course_name: row.get::<String>(1)?,
        taught_by: row.get::<String>(2)?,
        enrolled_count,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
        id,
    })
}

#[async_trait]
impl CourseStore for LibsqlCourseStore {
    async fn insert_course(&self, course: &NewCourse) -> Result<CourseDoc, DatabaseError> {
        let doc = CourseDoc {
            id: self.db.generate_id(PREFIX_COURSE).await?,
            course_name: course.course_name.clone(),
            taught_by: course.taught_by.clone(),
            enrolled_count: 0,
            created_at: Utc::now(),
        };
        self.db
            .execute_with(
                "INSERT INTO courses (id, course_name, taught_by, enrolled_count, created_at)
                 VALUES (?1, ?2, ?3, 0, ?4)",
                || {
                    libsql::params![
                        doc.id.as_str(),
                        doc.course_name.as_str(),
                        doc.taught_by.as_str(),
                        doc.created_at.to_rfc3339()
                    ]
                },
            )
            .await?;
        Ok(doc)
    }

    async fn find_course_by_id(&self, id: &str) -> Result<Option<CourseDoc>, DatabaseError> {
        self.find_one("id", id).await
    }

    async fn find_course_by_name(&self, name: &str) -> Result<Option<CourseDoc>, DatabaseError> {
        self.find_one("course_name", name).await
    }

    async fn list_courses(&self, limit: Option<u32>) -> Result<Vec<CourseDoc>, DatabaseError> {
        let limit_clause = limit.map_or_else(String::new, |n| format!(" LIMIT {n}"));
        let mut rows = self
            .db
            .query_with(
                &format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at, id{limit_clause}"),
                || (),
            )
            .await?;
        let mut courses = Vec::new();
        while let Some(row) = rows.next().await? {
            courses.push(row_to_course(&row)?);
        }
        Ok(courses)
    }

    async fn delete_course(&self, id: &str) -> Result<bool, DatabaseError> {
        let deleted = self
            .db
            .execute_with("DELETE FROM courses WHERE id = ?1", || [id])
            .await?;
        Ok(deleted > 0)
    }

    async fn increment_enrolled_count(&self, id: &str, delta: i64) -> Result<bool, DatabaseError> {
        let updated = self
            .db
            .execute_with(
                "UPDATE courses SET enrolled_count = enrolled_count + ?2
                 WHERE id = ?1 AND enrolled_count + ?2 >= 0",
                || libsql::params![id, delta],
            )
            .await?;
        Ok(updated > 0)
    }

    async fn set_enrolled_count(&self, id: &str, value: u32) -> Result<bool, DatabaseError> {
        let updated = self
            .db
            .execute_with(
                "UPDATE courses SET enrolled_count = ?2 WHERE id = ?1",
                || libsql::params![id, i64::from(value)],
            )
            .await?;
        Ok(updated > 0)
    }
}
