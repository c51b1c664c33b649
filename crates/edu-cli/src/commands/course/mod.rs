mod create;
mod delete;
mod get;
mod list;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::CourseCommands;
use crate::context::AppContext;

/// Handle `edu course`.
pub async fn handle(
    action: &CourseCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        CourseCommands::Create { name, teacher } => create::run(name, teacher, ctx, flags).await,
        CourseCommands::Delete { id } => delete::run(id, ctx, flags).await,
        CourseCommands::Get { id } => get::run(id, ctx, flags).await,
        CourseCommands::List => list::run(ctx, flags).await,
    }
}
