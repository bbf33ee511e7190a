//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::versioning::VersioningEngine;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// The single versioning engine for this process
    pub engine: VersioningEngine,
}

impl AppState {
    pub fn new(engine: VersioningEngine) -> Self {
        Self { engine }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
