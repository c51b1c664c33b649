//! Entity structs for the enrollment engine.
//!
//! Graph nodes live in the relationship store, course documents in the
//! document store, audit records in the audit sink. The only key shared across
//! stores is the course identifier.

mod audit;
mod course;
mod node;

pub use audit::AuditRecord;
pub use course::{CourseDoc, NewCourse};
pub use node::{GraphNode, NodeHandle, UserProfile};
