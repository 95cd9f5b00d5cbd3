//! Bulk import / merge
//!
//! Merges an incoming `{nodes, links}` fragment into one domain of the graph.
//! Node id collisions are settled by a [`ConflictPolicy`], existing links by
//! an [`ImportStrategy`], and everything that happened is summarized in an
//! [`ImportReport`].

mod engine;
mod fragment;
mod id_allocator;
mod policy;
mod report;
mod resolver;

pub use engine::ImportEngine;
pub use fragment::{
    EdgeRecord, GraphFragment, GraphLink, GraphNode, ImportRequest, NodeRecord, RecordError,
};
pub use id_allocator::{allocate, allocate_entity_id, candidate};
pub use policy::{ConflictPolicy, ImportStrategy};
pub use report::{ConflictKind, ConflictRecord, EntityStats, ImportReport, RelationshipStats};
pub use resolver::{Decision, EdgeDecision, EntityChanges, resolve, resolve_edge};
