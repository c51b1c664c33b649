//! Database migration runner.
//!
//! Embeds the SQL migration files at compile time and executes them on
//! database open. All statements use `IF NOT EXISTS` for idempotent re-running.
//! Each store owns its own database file, so each gets only its own schema.

use crate::EduDb;
use crate::error::DatabaseError;

const MIGRATION_GRAPH: &str = include_str!("../migrations/001_graph.sql");
const MIGRATION_DOCUMENTS: &str = include_str!("../migrations/002_documents.sql");
const MIGRATION_AUDIT: &str = include_str!("../migrations/003_audit.sql");

/// Which schema a database file carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// `graph_nodes` and `graph_edges`.
    Graph,
    /// `courses`.
    Documents,
    /// `query_audit`.
    Audit,
}

impl Schema {
    const fn migration(self) -> (&'static str, &'static str) {
        match self {
            Self::Graph => ("001_graph", MIGRATION_GRAPH),
            Self::Documents => ("002_documents", MIGRATION_DOCUMENTS),
            Self::Audit => ("003_audit", MIGRATION_AUDIT),
        }
    }
}

impl EduDb {
    /// Run the embedded migration for `schema`.
    pub(crate) async fn run_migrations(&self, schema: Schema) -> Result<(), DatabaseError> {
        let (name, sql) = schema.migration();
        self.conn()
            .execute_batch(sql)
            .await
            .map_err(|e| DatabaseError::Migration(format!("{name}: {e}")))?;
        Ok(())
    }
}
