//! Relationship store client.
//!
//! The graph side of the engine speaks two operations: a pattern-match
//! [`query`](GraphStore::query) and a batched [`mutate`](GraphStore::mutate).
//! Everything the coordinator and resolver need is expressed through those
//! two calls, so any store that can answer them can back the engine.

mod libsql_store;

use std::collections::HashMap;

use async_trait::async_trait;
use edu_core::entities::{GraphNode, NodeHandle};
use edu_core::enums::{NodeType, Predicate, Role};

use crate::error::DatabaseError;

pub use libsql_store::LibsqlGraphStore;

/// A read-only pattern evaluated by [`GraphStore::query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Nodes of `node_type` whose external key equals `key`.
    NodeByKey { node_type: NodeType, key: String },
    /// Targets of `predicate` edges leaving the node identified by
    /// (`node_type`, `key`). With `filter_key`, only targets whose external
    /// key equals it.
    Outgoing {
        node_type: NodeType,
        key: String,
        predicate: Predicate,
        filter_key: Option<String>,
    },
    /// Sources of `predicate` edges arriving at the node identified by
    /// (`node_type`, `key`). This is the reverse view (`~enrolled_in`).
    Incoming {
        node_type: NodeType,
        key: String,
        predicate: Predicate,
    },
}

impl Pattern {
    #[must_use]
    pub fn user(user_id: &str) -> Self {
        Self::NodeByKey {
            node_type: NodeType::User,
            key: user_id.to_string(),
        }
    }

    #[must_use]
    pub fn course(course_id: &str) -> Self {
        Self::NodeByKey {
            node_type: NodeType::Course,
            key: course_id.to_string(),
        }
    }

    /// Courses the user is enrolled in.
    #[must_use]
    pub fn enrollments_of(user_id: &str) -> Self {
        Self::Outgoing {
            node_type: NodeType::User,
            key: user_id.to_string(),
            predicate: Predicate::EnrolledIn,
            filter_key: None,
        }
    }

    /// The single course node if the user is enrolled in `course_id`.
    #[must_use]
    pub fn enrollment(user_id: &str, course_id: &str) -> Self {
        Self::Outgoing {
            node_type: NodeType::User,
            key: user_id.to_string(),
            predicate: Predicate::EnrolledIn,
            filter_key: Some(course_id.to_string()),
        }
    }

    /// Users enrolled in the course.
    #[must_use]
    pub fn students_of(course_id: &str) -> Self {
        Self::Incoming {
            node_type: NodeType::Course,
            key: course_id.to_string(),
            predicate: Predicate::EnrolledIn,
        }
    }
}

/// A node to create (or update) in a mutation, addressed by a blank label
/// until the store assigns its handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub blank: String,
    pub node_type: NodeType,
    pub key: String,
    pub full_name: Option<String>,
    pub role: Option<Role>,
}

impl NodeSpec {
    #[must_use]
    pub fn new(blank: &str, node_type: NodeType, key: &str) -> Self {
        Self {
            blank: blank.to_string(),
            node_type,
            key: key.to_string(),
            full_name: None,
            role: None,
        }
    }

    #[must_use]
    pub fn with_profile(mut self, full_name: &str, role: Role) -> Self {
        self.full_name = Some(full_name.to_string());
        self.role = Some(role);
        self
    }
}

/// Either an existing handle or a blank label declared in the same mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRef {
    Uid(NodeHandle),
    Blank(String),
}

impl From<&NodeHandle> for NodeRef {
    fn from(handle: &NodeHandle) -> Self {
        Self::Uid(handle.clone())
    }
}

/// `subject -[predicate]-> object`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeSpec {
    pub subject: NodeRef,
    pub predicate: Predicate,
    pub object: NodeRef,
}

/// A batch of writes applied in one store-local transaction.
///
/// Order of application: node sets, edge sets, edge deletes, node deletes.
/// Deleting a node removes every edge touching it (`<uid> * *`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mutation {
    pub set_nodes: Vec<NodeSpec>,
    pub set_edges: Vec<EdgeSpec>,
    pub delete_edges: Vec<EdgeSpec>,
    pub delete_nodes: Vec<NodeHandle>,
}

impl Mutation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set_node(mut self, node: NodeSpec) -> Self {
        self.set_nodes.push(node);
        self
    }

    #[must_use]
    pub fn set_edge(mut self, subject: NodeRef, predicate: Predicate, object: NodeRef) -> Self {
        self.set_edges.push(EdgeSpec {
            subject,
            predicate,
            object,
        });
        self
    }

    #[must_use]
    pub fn delete_edge(mut self, subject: NodeRef, predicate: Predicate, object: NodeRef) -> Self {
        self.delete_edges.push(EdgeSpec {
            subject,
            predicate,
            object,
        });
        self
    }

    #[must_use]
    pub fn delete_node(mut self, uid: NodeHandle) -> Self {
        self.delete_nodes.push(uid);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set_nodes.is_empty()
            && self.set_edges.is_empty()
            && self.delete_edges.is_empty()
            && self.delete_nodes.is_empty()
    }
}

/// Outcome of a [`Mutation`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationResult {
    /// Blank label -> handle of the node now holding that key.
    pub uids: HashMap<String, NodeHandle>,
    /// Nodes that did not exist before this mutation.
    pub nodes_created: u64,
    /// Edges that did not exist before this mutation.
    pub edges_added: u64,
    /// Edge writes skipped because an endpoint node no longer exists.
    pub edges_dangling: u64,
    /// Edges removed, including those removed by node deletes.
    pub edges_removed: u64,
    pub nodes_deleted: u64,
}

impl MutationResult {
    #[must_use]
    pub fn uid(&self, blank: &str) -> Option<&NodeHandle> {
        self.uids.get(blank)
    }
}

/// Pattern-match queries and batched mutations against the relationship store.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Evaluate a read-only pattern.
    async fn query(&self, pattern: &Pattern) -> Result<Vec<GraphNode>, DatabaseError>;

    /// Apply a mutation atomically.
    async fn mutate(&self, mutation: Mutation) -> Result<MutationResult, DatabaseError>;
}
