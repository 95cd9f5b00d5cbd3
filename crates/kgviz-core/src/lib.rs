//! Kgviz Core Library
//!
//! This crate provides the core functionality for kgviz, including:
//! - Graph domain model (entities, relationships, domains)
//! - Bulk import / merge engine with configurable conflict policies
//! - Pre-import fragment validation
//! - Storage (SQLite via sqlx, plus an in-memory store)
//! - Commands for import, export, statistics, and clearing a domain
//! - The JSON request/response envelope consumed by the web layer

pub mod api;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::graph::{Entity, GraphStore, Relationship};
    pub use crate::domain::import::{
        ConflictPolicy, ImportEngine, ImportReport, ImportRequest, ImportStrategy,
    };
    pub use crate::error::{Error, Result};
}
