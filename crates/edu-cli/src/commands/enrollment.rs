use edu_core::responses::EnrollmentInfo;
use edu_db::error::ServiceError;
use edu_db::listing::EnrollmentCursor;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::{CourseArgs, EnrollmentArgs, UserArgs};
use crate::context::AppContext;
use crate::output::output;

/// Handle `edu enroll`.
pub async fn handle_enroll(
    args: &EnrollmentArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let response = ctx
        .service
        .coordinator()
        .enroll(&args.user, &args.course)
        .await
        .map_err(|error| with_repair_hint(error, &args.course))?;
    output(&response, flags.format)
}

/// Handle `edu unenroll`.
pub async fn handle_unenroll(
    args: &EnrollmentArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let response = ctx
        .service
        .coordinator()
        .unenroll(&args.user, &args.course)
        .await
        .map_err(|error| with_repair_hint(error, &args.course))?;
    output(&response, flags.format)
}

/// Handle `edu enrollments`.
pub async fn handle_enrollments(
    args: &UserArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let cursor = ctx
        .service
        .coordinator()
        .list_enrollments_for_user(&args.user)
        .await?;
    let limit = flags.limit_or(ctx.default_limit());
    output(&take(cursor, limit).await?, flags.format)
}

/// Handle `edu students`.
pub async fn handle_students(
    args: &CourseArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let cursor = ctx
        .service
        .coordinator()
        .list_students_for_course(&args.course)
        .await?;
    let limit = flags.limit_or(ctx.default_limit());
    output(&take(cursor, limit).await?, flags.format)
}

/// Pull at most `limit` rows; course documents past the limit are never read.
async fn take(mut cursor: EnrollmentCursor, limit: u32) -> anyhow::Result<Vec<EnrollmentInfo>> {
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    let mut rows = Vec::with_capacity(cursor.len().min(limit));
    while rows.len() < limit {
        match cursor.next().await? {
            Some(row) => rows.push(row),
            None => break,
        }
    }
    Ok(rows)
}

fn with_repair_hint(error: ServiceError, course_id: &str) -> anyhow::Error {
    if error.is_partial_write() {
        let hint = format!(
            "enrollment edge was written but enrolled_count was not; run `edu reconcile --course {}`",
            course_id.trim()
        );
        return anyhow::Error::new(error).context(hint);
    }
    anyhow::Error::new(error)
}
