//! # edu-core
//!
//! Core types, identifiers, and error types for the online-edu enrollment engine.
//!
//! This crate provides the foundational types shared across all edu crates:
//! - Graph node, course document and audit record structs
//! - Node type, predicate, audit action and store kind enums
//! - ID prefix constants and external identifier validation
//! - Cross-cutting error types
//! - Response types returned by coordinator and lifecycle operations

pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod responses;
