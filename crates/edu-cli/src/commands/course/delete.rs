use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(id: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let cascade = ctx.service.lifecycle().delete_course(id).await?;
    output(&cascade, flags.format)
}
