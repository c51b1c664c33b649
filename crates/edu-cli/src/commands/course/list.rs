use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let limit = flags.limit_or(ctx.default_limit());
    let courses = ctx.service.lifecycle().list_courses(Some(limit)).await?;
    output(&courses, flags.format)
}
