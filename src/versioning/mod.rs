//! Schema Versioning Module
//!
//! Provides versioned schema history and change planning:
//! - Version store (immutable, content-addressed, semantic version order)
//! - Diff engine and breaking-change classification
//! - Migration / rollback plan generation
//! - Advisory analysis, audit trail and events

pub mod analysis;
pub mod apply;
pub mod audit;
pub mod classifier;
pub mod diff;
pub mod engine;
pub mod events;
pub mod planner;
pub mod statements;
pub mod store;
pub mod types;

pub use audit::AuditEntry;
pub use engine::VersioningEngine;
pub use types::*;
