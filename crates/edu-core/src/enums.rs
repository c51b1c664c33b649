//! Node types, predicates, audit actions, roles and store kinds.
//!
//! Graph-facing enums serialize to the tags stored in the relationship store
//! (`User`, `Course`, `enrolled_in`). Audit actions serialize to the
//! upper-case tags written to the audit sink (`ENROLLED_IN`, `UNENROLLED_FROM`).

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// NodeType
// ---------------------------------------------------------------------------

/// Type tag carried by every node in the relationship store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    User,
    Course,
}

impl NodeType {
    /// Return the type tag used in graph storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Course => "Course",
        }
    }

    /// Name of the indexed attribute holding the external identifier.
    #[must_use]
    pub const fn key_attribute(self) -> &'static str {
        match self {
            Self::User => "user_id",
            Self::Course => "course_id",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Predicate
// ---------------------------------------------------------------------------

/// Edge predicate in the relationship store.
///
/// Only one relation exists: `User -[enrolled_in]-> Course`, indexed in both
/// directions so the reverse view `Course -[~enrolled_in]-> User` is cheap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    EnrolledIn,
}

impl Predicate {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnrolledIn => "enrolled_in",
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditAction
// ---------------------------------------------------------------------------

/// Action tag recorded in the audit sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    EnrolledIn,
    UnenrolledFrom,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnrolledIn => "ENROLLED_IN",
            Self::UnenrolledFrom => "UNENROLLED_FROM",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Role attribute stored on User nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Student,
    Teacher,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Teacher => "Teacher",
            Self::Admin => "Admin",
        }
    }

    /// Parse a role tag, ignoring ASCII case.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        [Self::Student, Self::Teacher, Self::Admin]
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StoreKind
// ---------------------------------------------------------------------------

/// The independently-owned stores the engine talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Graph,
    Documents,
    Audit,
}

impl StoreKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::Documents => "documents",
            Self::Audit => "audit",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    macro_rules! test_serde_roundtrip {
        ($name:ident, $ty:ty, $variant:expr, $expected_str:expr) => {
            #[test]
            fn $name() {
                let val = $variant;
                let json = serde_json::to_string(&val).unwrap();
                assert_eq!(json, format!("\"{}\"", $expected_str));
                let recovered: $ty = serde_json::from_str(&json).unwrap();
                assert_eq!(recovered, val);
            }
        };
    }

    test_serde_roundtrip!(node_type_user, NodeType, NodeType::User, "User");
    test_serde_roundtrip!(predicate_enrolled_in, Predicate, Predicate::EnrolledIn, "enrolled_in");
    test_serde_roundtrip!(
        audit_enrolled_in,
        AuditAction,
        AuditAction::EnrolledIn,
        "ENROLLED_IN"
    );
    test_serde_roundtrip!(
        audit_unenrolled_from,
        AuditAction,
        AuditAction::UnenrolledFrom,
        "UNENROLLED_FROM"
    );
    test_serde_roundtrip!(store_documents, StoreKind, StoreKind::Documents, "documents");

    #[test]
    fn display_matches_as_str() {
        assert_eq!(format!("{}", NodeType::Course), "Course");
        assert_eq!(format!("{}", Predicate::EnrolledIn), "enrolled_in");
        assert_eq!(format!("{}", AuditAction::UnenrolledFrom), "UNENROLLED_FROM");
        assert_eq!(format!("{}", Role::Teacher), "Teacher");
        assert_eq!(format!("{}", StoreKind::Graph), "graph");
    }

    #[test]
    fn key_attributes_match_join_keys() {
        assert_eq!(NodeType::User.key_attribute(), "user_id");
        assert_eq!(NodeType::Course.key_attribute(), "course_id");
    }

    #[test]
    fn role_parse_ignores_case() {
        assert_eq!(Role::parse("teacher"), Some(Role::Teacher));
        assert_eq!(Role::parse(" ADMIN "), Some(Role::Admin));
        assert_eq!(Role::parse("janitor"), None);
        assert_eq!(Role::default(), Role::Student);
    }
}
