use chrono::NaiveDate;
use clap::{Args, Subcommand};

use crate::cli::subcommands::{CourseCommands, UserCommands};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Enroll a user in a course.
    Enroll(EnrollmentArgs),
    /// Remove a user from a course.
    Unenroll(EnrollmentArgs),
    /// List the courses a user is enrolled in.
    Enrollments(UserArgs),
    /// List the users enrolled in a course.
    Students(CourseArgs),
    /// Course documents.
    Course {
        #[command(subcommand)]
        action: CourseCommands,
    },
    /// User nodes.
    User {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Recompute enrolled_count from the enrollment graph.
    Reconcile(ReconcileArgs),
    /// Query the audit log.
    Audit(AuditArgs),
}

#[derive(Clone, Debug, Args)]
pub struct EnrollmentArgs {
    /// External user id (e.g. email).
    pub user: String,
    /// Course id.
    pub course: String,
}

#[derive(Clone, Debug, Args)]
pub struct UserArgs {
    pub user: String,
}

#[derive(Clone, Debug, Args)]
pub struct CourseArgs {
    pub course: String,
}

#[derive(Clone, Debug, Args)]
pub struct ReconcileArgs {
    /// Only this course (default: every course).
    #[arg(long)]
    pub course: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct AuditArgs {
    /// Filter by actor (user id).
    #[arg(long)]
    pub actor: Option<String>,
    /// Filter by action: enrolled-in, unenrolled-from.
    #[arg(long)]
    pub action: Option<String>,
    /// Day partition, YYYY-MM-DD.
    #[arg(long, value_parser = parse_day)]
    pub date: Option<NaiveDate>,
}

fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}
