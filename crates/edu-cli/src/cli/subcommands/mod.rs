mod course;
mod user;

pub use course::CourseCommands;
pub use user::UserCommands;
