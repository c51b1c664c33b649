use clap::Subcommand;
use edu_core::enums::Role;

/// User node commands.
#[derive(Clone, Debug, Subcommand)]
pub enum UserCommands {
    /// Create or update a user's display name and role.
    Register {
        /// External user id (e.g. email).
        user: String,
        #[arg(long)]
        name: String,
        /// student, teacher or admin
        #[arg(long, default_value = "student", value_parser = parse_role)]
        role: Role,
    },
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::parse(raw).ok_or_else(|| format!("unknown role '{raw}' (student, teacher, admin)"))
}
