//! libSQL implementation of the relationship store.
//!
//! Nodes are unique per (`node_type`, `external_key`), so node creation is an
//! upsert that always yields the surviving handle. Edges are unique per
//! (subject, predicate, object), so writing an existing edge is a no-op that
//! reports `edges_added = 0`.

use async_trait::async_trait;
use chrono::Utc;
use edu_core::entities::{GraphNode, NodeHandle};
use edu_core::enums::{NodeType, Role};
use edu_core::ids::{PREFIX_COURSE_NODE, PREFIX_USER_NODE};
use tokio::sync::Mutex;

use super::{GraphStore, Mutation, MutationResult, NodeRef, Pattern};
use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_node_type, parse_opt_role};
use crate::retry::{RetryConfig, with_retry};
use crate::{EduDb, Schema};

const NODE_COLUMNS: &str = "n.uid, n.node_type, n.external_key, n.full_name, n.role";

/// Relationship store backed by its own libSQL database.
pub struct LibsqlGraphStore {
    db: EduDb,
    /// Serializes writers so concurrent mutations touching the same node
    /// apply one after the other.
    write_lock: Mutex<()>,
}

impl LibsqlGraphStore {
    #[must_use]
    pub fn new(db: EduDb) -> Self {
        Self {
            db,
            write_lock: Mutex::new(()),
        }
    }

    /// Open (or create) the graph database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or migrated.
    pub async fn open(path: &str, retry: RetryConfig) -> Result<Self, DatabaseError> {
        Ok(Self::new(EduDb::open_local(path, Schema::Graph, retry).await?))
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if migrations fail.
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(EduDb::open_in_memory(Schema::Graph).await?))
    }

    #[must_use]
    pub const fn db(&self) -> &EduDb {
        &self.db
    }

    async fn apply(&self, mutation: &Mutation) -> Result<MutationResult, DatabaseError> {
        let tx = self.db.conn().transaction().await?;
        match Self::apply_in(&tx, mutation).await {
            Ok(result) => {
                tx.commit().await?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(error = %rollback, "graph mutation rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn nodes_exist(
        tx: &libsql::Transaction,
        subject: &str,
        object: &str,
    ) -> Result<bool, DatabaseError> {
        let mut rows = tx
            .query(
                "SELECT EXISTS (SELECT 1 FROM graph_nodes WHERE uid = ?1)
                    AND EXISTS (SELECT 1 FROM graph_nodes WHERE uid = ?2)",
                libsql::params![subject, object],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<i64>(0)? != 0)
    }

    async fn apply_in(
        tx: &libsql::Transaction,
        mutation: &Mutation,
    ) -> Result<MutationResult, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let mut result = MutationResult::default();

        for node in &mutation.set_nodes {
            let created = tx
                .execute(
                    "INSERT INTO graph_nodes (uid, node_type, external_key, full_name, role, created_at)
                     VALUES (?1 || '-' || lower(hex(randomblob(4))), ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(node_type, external_key) DO NOTHING",
                    libsql::params![
                        uid_prefix(node.node_type),
                        node.node_type.as_str(),
                        node.key.as_str(),
                        node.full_name.as_deref(),
                        node.role.map(Role::as_str),
                        now.as_str()
                    ],
                )
                .await?;
            result.nodes_created += created;

            if created == 0 && (node.full_name.is_some() || node.role.is_some()) {
                tx.execute(
                    "UPDATE graph_nodes
                     SET full_name = COALESCE(?3, full_name), role = COALESCE(?4, role)
                     WHERE node_type = ?1 AND external_key = ?2",
                    libsql::params![
                        node.node_type.as_str(),
                        node.key.as_str(),
                        node.full_name.as_deref(),
                        node.role.map(Role::as_str)
                    ],
                )
                .await?;
            }

            let uid = {
                let mut rows = tx
                    .query(
                        "SELECT uid FROM graph_nodes WHERE node_type = ?1 AND external_key = ?2",
                        libsql::params![node.node_type.as_str(), node.key.as_str()],
                    )
                    .await?;
                let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
                row.get::<String>(0)?
            };
            result
                .uids
                .insert(node.blank.clone(), NodeHandle::new(uid));
        }

        for edge in &mutation.set_edges {
            let subject = resolve_ref(&edge.subject, &result)?;
            let object = resolve_ref(&edge.object, &result)?;
            let added = tx
                .execute(
                    "INSERT OR IGNORE INTO graph_edges (subject, predicate, object, created_at)
                     SELECT ?1, ?2, ?3, ?4
                     WHERE EXISTS (SELECT 1 FROM graph_nodes WHERE uid = ?1)
                       AND EXISTS (SELECT 1 FROM graph_nodes WHERE uid = ?3)",
                    libsql::params![
                        subject.as_str(),
                        edge.predicate.as_str(),
                        object.as_str(),
                        now.as_str()
                    ],
                )
                .await?;
            if added == 0 && !Self::nodes_exist(tx, &subject, &object).await? {
                tracing::debug!(%subject, %object, "edge endpoint missing, write skipped");
                result.edges_dangling += 1;
            }
            result.edges_added += added;
        }

        for edge in &mutation.delete_edges {
            let subject = resolve_ref(&edge.subject, &result)?;
            let object = resolve_ref(&edge.object, &result)?;
            result.edges_removed += tx
                .execute(
                    "DELETE FROM graph_edges WHERE subject = ?1 AND predicate = ?2 AND object = ?3",
                    libsql::params![subject, edge.predicate.as_str(), object],
                )
                .await?;
        }

        for uid in &mutation.delete_nodes {
            result.edges_removed += tx
                .execute(
                    "DELETE FROM graph_edges WHERE subject = ?1 OR object = ?1",
                    [uid.as_str()],
                )
                .await?;
            result.nodes_deleted += tx
                .execute("DELETE FROM graph_nodes WHERE uid = ?1", [uid.as_str()])
                .await?;
        }

        Ok(result)
    }
}

const fn uid_prefix(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::User => PREFIX_USER_NODE,
        NodeType::Course => PREFIX_COURSE_NODE,
    }
}

fn resolve_ref(node: &NodeRef, result: &MutationResult) -> Result<String, DatabaseError> {
    match node {
        NodeRef::Uid(uid) => Ok(uid.as_str().to_string()),
        NodeRef::Blank(label) => result
            .uid(label)
            .map(|uid| uid.as_str().to_string())
            .ok_or_else(|| {
                DatabaseError::InvalidState(format!("blank node _:{label} is not declared"))
            }),
    }
}

fn row_to_node(row: &libsql::Row) -> Result<GraphNode, DatabaseError> {
    Ok(GraphNode {
        uid: NodeHandle::new(row.get::<String>(0)?),
        node_type: parse_node_type(&row.get::<String>(1)?)?,
        key: row.get::<String>(2)?,
        full_name: get_opt_string(row, 3)?,
        role: parse_opt_role(get_opt_string(row, 4)?.as_deref())?,
    })
}

#[async_trait]
impl GraphStore for LibsqlGraphStore {
    async fn query(&self, pattern: &Pattern) -> Result<Vec<GraphNode>, DatabaseError> {
        let mut rows = match pattern {
            Pattern::NodeByKey { node_type, key } => {
                self.db
                    .query_with(
                        &format!(
                            "SELECT {NODE_COLUMNS} FROM graph_nodes n
                             WHERE n.node_type = ?1 AND n.external_key = ?2"
                        ),
                        || libsql::params![node_type.as_str(), key.as_str()],
                    )
                    .await?
            }
            Pattern::Outgoing {
                node_type,
                key,
                predicate,
                filter_key: None,
            } => {
                self.db
                    .query_with(
                        &format!(
                            "SELECT {NODE_COLUMNS} FROM graph_nodes s
                             JOIN graph_edges e ON e.subject = s.uid AND e.predicate = ?3
                             JOIN graph_nodes n ON n.uid = e.object
                             WHERE s.node_type = ?1 AND s.external_key = ?2
                             ORDER BY e.rowid"
                        ),
                        || libsql::params![node_type.as_str(), key.as_str(), predicate.as_str()],
                    )
                    .await?
            }
            Pattern::Outgoing {
                node_type,
                key,
                predicate,
                filter_key: Some(target),
            } => {
                self.db
                    .query_with(
                        &format!(
                            "SELECT {NODE_COLUMNS} FROM graph_nodes s
                             JOIN graph_edges e ON e.subject = s.uid AND e.predicate = ?3
                             JOIN graph_nodes n ON n.uid = e.object
                             WHERE s.node_type = ?1 AND s.external_key = ?2 AND n.external_key = ?4
                             ORDER BY e.rowid"
                        ),
                        || {
                            libsql::params![
                                node_type.as_str(),
                                key.as_str(),
                                predicate.as_str(),
                                target.as_str()
                            ]
                        },
                    )
                    .await?
            }
            Pattern::Incoming {
                node_type,
                key,
                predicate,
            } => {
                self.db
                    .query_with(
                        &format!(
                            "SELECT {NODE_COLUMNS} FROM graph_nodes t
                             JOIN graph_edges e ON e.object = t.uid AND e.predicate = ?3
                             JOIN graph_nodes n ON n.uid = e.subject
                             WHERE t.node_type = ?1 AND t.external_key = ?2
                             ORDER BY e.rowid"
                        ),
                        || libsql::params![node_type.as_str(), key.as_str(), predicate.as_str()],
                    )
                    .await?
            }
        };

        let mut nodes = Vec::new();
        while let Some(row) = rows.next().await? {
            nodes.push(row_to_node(&row)?);
        }
        Ok(nodes)
    }

    async fn mutate(&self, mutation: Mutation) -> Result<MutationResult, DatabaseError> {
        if mutation.is_empty() {
            return Ok(MutationResult::default());
        }
        let _guard = self.write_lock.lock().await;
        let mutation = &mutation;
        with_retry(self.db.retry_config(), DatabaseError::is_transient, || {
            self.apply(mutation)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::graph::NodeSpec;
    use edu_core::enums::Predicate;
    use pretty_assertions::assert_eq;

    fn blank(label: &str) -> NodeRef {
        NodeRef::Blank(label.to_string())
    }

    async fn enroll(store: &LibsqlGraphStore, user: &str, course: &str) -> MutationResult {
        store
            .mutate(
                Mutation::new()
                    .set_node(NodeSpec::new("u", NodeType::User, user))
                    .set_node(NodeSpec::new("c", NodeType::Course, course))
                    .set_edge(blank("u"), Predicate::EnrolledIn, blank("c")),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn node_creation_is_an_upsert() {
        let store = LibsqlGraphStore::in_memory().await.unwrap();
        let spec = NodeSpec::new("newuser", NodeType::User, "s1@x.edu");

        let first = store.mutate(Mutation::new().set_node(spec.clone())).await.unwrap();
        let second = store.mutate(Mutation::new().set_node(spec)).await.unwrap();

        assert_eq!(first.nodes_created, 1);
        assert_eq!(second.nodes_created, 0);
        assert_eq!(first.uid("newuser"), second.uid("newuser"));
        assert!(edu_core::ids::has_prefix(
            first.uid("newuser").unwrap().as_str(),
            PREFIX_USER_NODE
        ));
        assert_eq!(store.query(&Pattern::user("s1@x.edu")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn same_key_different_type_is_a_different_node() {
        let store = LibsqlGraphStore::in_memory().await.unwrap();
        let result = store
            .mutate(
                Mutation::new()
                    .set_node(NodeSpec::new("u", NodeType::User, "x1"))
                    .set_node(NodeSpec::new("c", NodeType::Course, "x1")),
            )
            .await
            .unwrap();
        assert_eq!(result.nodes_created, 2);
        assert_ne!(result.uid("u"), result.uid("c"));
    }

    #[tokio::test]
    async fn profile_attributes_are_updated_on_existing_node() {
        let store = LibsqlGraphStore::in_memory().await.unwrap();
        store
            .mutate(Mutation::new().set_node(NodeSpec::new("u", NodeType::User, "t@x.edu")))
            .await
            .unwrap();
        store
            .mutate(Mutation::new().set_node(
                NodeSpec::new("u", NodeType::User, "t@x.edu").with_profile("Ada", Role::Teacher),
            ))
            .await
            .unwrap();

        let nodes = store.query(&Pattern::user("t@x.edu")).await.unwrap();
        assert_eq!(nodes[0].full_name.as_deref(), Some("Ada"));
        assert_eq!(nodes[0].role, Some(Role::Teacher));

        // A bare resolve must not wipe the profile.
        store
            .mutate(Mutation::new().set_node(NodeSpec::new("u", NodeType::User, "t@x.edu")))
            .await
            .unwrap();
        let nodes = store.query(&Pattern::user("t@x.edu")).await.unwrap();
        assert_eq!(nodes[0].full_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn duplicate_edge_write_reports_nothing_added() {
        let store = LibsqlGraphStore::in_memory().await.unwrap();
        assert_eq!(enroll(&store, "s1", "c1").await.edges_added, 1);
        assert_eq!(enroll(&store, "s1", "c1").await.edges_added, 0);
        assert_eq!(
            store.query(&Pattern::students_of("c1")).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn forward_reverse_and_filtered_traversals() {
        let store = LibsqlGraphStore::in_memory().await.unwrap();
        enroll(&store, "s1", "c1").await;
        enroll(&store, "s1", "c2").await;
        enroll(&store, "s2", "c1").await;

        let courses: Vec<String> = store
            .query(&Pattern::enrollments_of("s1"))
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.key)
            .collect();
        assert_eq!(courses, vec!["c1", "c2"]);

        let students: Vec<String> = store
            .query(&Pattern::students_of("c1"))
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.key)
            .collect();
        assert_eq!(students, vec!["s1", "s2"]);

        let hit = store.query(&Pattern::enrollment("s2", "c1")).await.unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].node_type, NodeType::Course);
        assert!(store
            .query(&Pattern::enrollment("s2", "c2"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn node_delete_removes_every_touching_edge() {
        let store = LibsqlGraphStore::in_memory().await.unwrap();
        let first = enroll(&store, "s1", "c1").await;
        enroll(&store, "s2", "c1").await;
        enroll(&store, "s2", "c2").await;

        let course = first.uid("c").unwrap().clone();
        let result = store
            .mutate(Mutation::new().delete_node(course))
            .await
            .unwrap();

        assert_eq!(result.nodes_deleted, 1);
        assert_eq!(result.edges_removed, 2);
        assert!(store.query(&Pattern::course("c1")).await.unwrap().is_empty());
        assert!(store.query(&Pattern::students_of("c1")).await.unwrap().is_empty());
        assert_eq!(
            store.query(&Pattern::enrollments_of("s2")).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn edge_onto_deleted_node_is_not_written() {
        let store = LibsqlGraphStore::in_memory().await.unwrap();
        let first = enroll(&store, "s1", "c1").await;
        let user = first.uid("u").unwrap().clone();
        let course = first.uid("c").unwrap().clone();
        store
            .mutate(Mutation::new().delete_node(course.clone()))
            .await
            .unwrap();

        let stale = store
            .mutate(Mutation::new().set_edge(
                NodeRef::from(&user),
                Predicate::EnrolledIn,
                NodeRef::from(&course),
            ))
            .await
            .unwrap();

        assert_eq!(stale.edges_added, 0);
        assert_eq!(stale.edges_dangling, 1);
        let mut rows = store
            .db()
            .conn()
            .query("SELECT COUNT(*) FROM graph_edges", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_edge_is_not_dangling() {
        let store = LibsqlGraphStore::in_memory().await.unwrap();
        enroll(&store, "s1", "c1").await;
        let again = enroll(&store, "s1", "c1").await;
        assert_eq!(again.edges_added, 0);
        assert_eq!(again.edges_dangling, 0);
    }

    #[tokio::test]
    async fn delete_edge_by_handles() {
        let store = LibsqlGraphStore::in_memory().await.unwrap();
        let created = enroll(&store, "s1", "c1").await;
        let user = NodeRef::from(created.uid("u").unwrap());
        let course = NodeRef::from(created.uid("c").unwrap());

        let removed = store
            .mutate(Mutation::new().delete_edge(user.clone(), Predicate::EnrolledIn, course.clone()))
            .await
            .unwrap();
        assert_eq!(removed.edges_removed, 1);

        let again = store
            .mutate(Mutation::new().delete_edge(user, Predicate::EnrolledIn, course))
            .await
            .unwrap();
        assert_eq!(again.edges_removed, 0);
    }

    #[tokio::test]
    async fn undeclared_blank_rolls_back_the_whole_mutation() {
        let store = LibsqlGraphStore::in_memory().await.unwrap();
        let result = store
            .mutate(
                Mutation::new()
                    .set_node(NodeSpec::new("u", NodeType::User, "s1"))
                    .set_edge(blank("u"), Predicate::EnrolledIn, blank("missing")),
            )
            .await;

        assert!(matches!(result, Err(DatabaseError::InvalidState(_))));
        assert!(store.query(&Pattern::user("s1")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_creation_converges_on_one_node() {
        let store = Arc::new(LibsqlGraphStore::in_memory().await.unwrap());
        let spec = || Mutation::new().set_node(NodeSpec::new("c", NodeType::Course, "c9"));

        let (a, b) = tokio::join!(store.mutate(spec()), store.mutate(spec()));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.uid("c"), b.uid("c"));
        assert_eq!(a.nodes_created + b.nodes_created, 1);
        assert_eq!(store.query(&Pattern::course("c9")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_mutation_is_a_noop() {
        let store = LibsqlGraphStore::in_memory().await.unwrap();
        let result = store.mutate(Mutation::new()).await.unwrap();
        assert_eq!(result, MutationResult::default());
    }
}
