//! Graph domain module
//!
//! Entities and typed relationships partitioned by domain. Uniqueness is always
//! scoped to a domain: an entity is identified by `(id, domain)` and a
//! relationship by `(source, target, type, domain)`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kgviz_core::domain::graph::{Entity, GraphStore};
//!
//! let entity = Entity::new("e1", "Alice", "people").with_type("person");
//! store.insert_entity(&entity).await?;
//! assert!(store.entity_exists("e1", "people").await?);
//! ```

mod entity;
mod relationship;
mod store;

pub use entity::{DEFAULT_DOMAIN, Entity, normalize_domain};
pub use relationship::{NewRelationship, Relationship, RelationshipKey};
pub use store::{GraphStore, InsertOutcome};
