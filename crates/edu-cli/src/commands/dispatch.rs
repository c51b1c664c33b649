use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Enroll(args) => commands::enrollment::handle_enroll(&args, ctx, flags).await,
        Commands::Unenroll(args) => commands::enrollment::handle_unenroll(&args, ctx, flags).await,
        Commands::Enrollments(args) => {
            commands::enrollment::handle_enrollments(&args, ctx, flags).await
        }
        Commands::Students(args) => commands::enrollment::handle_students(&args, ctx, flags).await,
        Commands::Course { action } => commands::course::handle(&action, ctx, flags).await,
        Commands::User { action } => commands::user::handle(&action, ctx, flags).await,
        Commands::Reconcile(args) => commands::reconcile::handle(&args, ctx, flags).await,
        Commands::Audit(args) => commands::audit::handle(&args, ctx, flags).await,
    }
}
