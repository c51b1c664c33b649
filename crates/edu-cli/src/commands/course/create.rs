use edu_core::entities::NewCourse;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(
    name: &str,
    teacher: &str,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let course = ctx
        .service
        .lifecycle()
        .create_course(&NewCourse {
            course_name: name.to_string(),
            taught_by: teacher.to_string(),
        })
        .await?;
    output(&course, flags.format)
}
