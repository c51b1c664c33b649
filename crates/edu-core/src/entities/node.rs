use std::fmt;

use serde::{Deserialize, Serialize};

use crate::enums::{NodeType, Role};

/// Store-assigned handle of a graph node (e.g. `usr-3f9a01bc`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeHandle(String);

impl NodeHandle {
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A node matched by a graph pattern query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphNode {
    pub uid: NodeHandle,
    pub node_type: NodeType,
    /// External identifier: `user_id` for users, `course_id` for courses.
    pub key: String,
    pub full_name: Option<String>,
    pub role: Option<Role>,
}

/// Display attributes attached to a User node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: String,
    pub full_name: String,
    pub role: Role,
}
