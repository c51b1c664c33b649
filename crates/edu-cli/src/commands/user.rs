use edu_core::entities::UserProfile;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::UserCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `edu user`.
pub async fn handle(
    action: &UserCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        UserCommands::Register { user, name, role } => {
            let node = ctx
                .service
                .resolver()
                .register_user(&UserProfile {
                    user_id: user.clone(),
                    full_name: name.clone(),
                    role: *role,
                })
                .await?;
            output(&node, flags.format)
        }
    }
}
