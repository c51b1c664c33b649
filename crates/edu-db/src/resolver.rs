//! Node resolver: external identifier -> graph node handle.
//!
//! Resolution is query-then-upsert. The graph store enforces one node per
//! (type, key), so two racing first-time resolutions converge on the same
//! handle instead of producing duplicates.

use std::sync::Arc;

use edu_core::entities::{GraphNode, NodeHandle, UserProfile};
use edu_core::enums::{NodeType, StoreKind};
use edu_core::ids::validate_external_id;

use crate::error::{DatabaseError, ServiceError};
use crate::graph::{GraphStore, Mutation, MutationResult, NodeSpec, Pattern};

const BLANK_USER: &str = "newuser";
const BLANK_COURSE: &str = "newcourse";

/// Maps `user_id` / `course_id` onto graph node handles.
#[derive(Clone)]
pub struct NodeResolver {
    graph: Arc<dyn GraphStore>,
}

impl NodeResolver {
    #[must_use]
    pub fn new(graph: Arc<dyn GraphStore>) -> Self {
        Self { graph }
    }

    /// Handle of the User node for `user_id`, creating the node if absent.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank id, `StoreUnavailable` if the graph store fails.
    pub async fn resolve_or_create_user(&self, user_id: &str) -> Result<NodeHandle, ServiceError> {
        self.resolve_or_create(NodeType::User, user_id).await
    }

    /// Handle of the Course node for `course_id`, creating the node if absent.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank id, `StoreUnavailable` if the graph store fails.
    pub async fn resolve_or_create_course(
        &self,
        course_id: &str,
    ) -> Result<NodeHandle, ServiceError> {
        self.resolve_or_create(NodeType::Course, course_id).await
    }

    /// Existing User node, without creating one.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank id, `StoreUnavailable` if the graph store fails.
    pub async fn lookup_user(&self, user_id: &str) -> Result<Option<GraphNode>, ServiceError> {
        self.lookup(NodeType::User, user_id).await
    }

    /// Existing Course node, without creating one.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank id, `StoreUnavailable` if the graph store fails.
    pub async fn lookup_course(&self, course_id: &str) -> Result<Option<GraphNode>, ServiceError> {
        self.lookup(NodeType::Course, course_id).await
    }

    /// Create or update the User node carrying display name and role.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank id or name, `StoreUnavailable` if the graph
    /// store fails.
    pub async fn register_user(&self, profile: &UserProfile) -> Result<GraphNode, ServiceError> {
        let user_id = validate_external_id("user_id", &profile.user_id)?;
        let full_name = validate_external_id("full_name", &profile.full_name)?;

        let result = self
            .graph
            .mutate(Mutation::new().set_node(
                NodeSpec::new(BLANK_USER, NodeType::User, user_id)
                    .with_profile(full_name, profile.role),
            ))
            .await
            .map_err(ServiceError::store(StoreKind::Graph))?;
        let uid = assigned(&result, BLANK_USER)?;
        tracing::info!(user_id, %uid, role = %profile.role, "registered user");

        Ok(GraphNode {
            uid,
            node_type: NodeType::User,
            key: user_id.to_string(),
            full_name: Some(full_name.to_string()),
            role: Some(profile.role),
        })
    }

    async fn lookup(
        &self,
        node_type: NodeType,
        key: &str,
    ) -> Result<Option<GraphNode>, ServiceError> {
        let key = validate_external_id(node_type.key_attribute(), key)?;
        let pattern = Pattern::NodeByKey {
            node_type,
            key: key.to_string(),
        };
        let nodes = self
            .graph
            .query(&pattern)
            .await
            .map_err(ServiceError::store(StoreKind::Graph))?;
        Ok(nodes.into_iter().next())
    }

    async fn resolve_or_create(
        &self,
        node_type: NodeType,
        key: &str,
    ) -> Result<NodeHandle, ServiceError> {
        if let Some(node) = self.lookup(node_type, key).await? {
            tracing::debug!(%node_type, key, uid = %node.uid, "resolved existing node");
            return Ok(node.uid);
        }

        let key = validate_external_id(node_type.key_attribute(), key)?;
        let blank = match node_type {
            NodeType::User => BLANK_USER,
            NodeType::Course => BLANK_COURSE,
        };
        let result = self
            .graph
            .mutate(Mutation::new().set_node(NodeSpec::new(blank, node_type, key)))
            .await
            .map_err(ServiceError::store(StoreKind::Graph))?;
        let uid = assigned(&result, blank)?;
        if result.nodes_created == 0 {
            tracing::debug!(%node_type, key, %uid, "node created concurrently, reusing it");
        } else {
            tracing::debug!(%node_type, key, %uid, "created node");
        }
        Ok(uid)
    }
}

fn assigned(result: &MutationResult, blank: &str) -> Result<NodeHandle, ServiceError> {
    result.uid(blank).cloned().ok_or_else(|| ServiceError::StoreUnavailable {
        store: StoreKind::Graph,
        source: DatabaseError::InvalidState(format!("mutation returned no handle for _:{blank}")),
    })
}
