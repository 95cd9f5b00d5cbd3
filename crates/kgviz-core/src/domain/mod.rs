//! Domain layer
//!
//! - `graph`: entities, relationships, and the `GraphStore` unit-of-work trait
//! - `import`: the bulk import / merge engine and its report
//! - `validation`: pre-import fragment checks

pub mod graph;
pub mod import;
pub mod validation;
