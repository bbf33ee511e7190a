//! Schema Snapshot Module
//!
//! The structural description of a database schema at one point in time:
//! - Snapshot model (tables, fields, indexes, constraints, relationships)
//! - Canonical content hashing
//! - Structural validation of submitted snapshots

pub mod snapshot;
mod validation;

pub use snapshot::{
    Constraint, ConstraintKind, Field, Index, Relationship, SchemaSnapshot, Table,
};
