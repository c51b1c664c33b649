use clap::Subcommand;

/// Course lifecycle commands.
#[derive(Clone, Debug, Subcommand)]
pub enum CourseCommands {
    /// Create a course and auto-enroll its teacher.
    Create {
        #[arg(long)]
        name: String,
        /// Teacher's user id.
        #[arg(long)]
        teacher: String,
    },
    /// Delete a course and cascade its enrollments.
    Delete { id: String },
    /// Show one course.
    Get { id: String },
    /// List courses.
    List,
}
