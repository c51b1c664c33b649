use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(id: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let course = ctx.service.lifecycle().get_course(id).await?;
    output(&course, flags.format)
}
