//! Storage trait for the graph
//!
//! A `GraphStore` value is one unit of work: every call made through it is
//! observed together or not at all, depending on how the owner finishes it
//! (commit or rollback). Implementations live in `crate::infrastructure::graph`.

use async_trait::async_trait;

use crate::error::Result;

use super::entity::Entity;
use super::relationship::{NewRelationship, Relationship, RelationshipKey};

/// Outcome of an insert against a uniqueness key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was written; carries the store-assigned id for relationships
    /// (always 0 for entities)
    Inserted(i64),
    /// A row with the same key already exists
    Duplicate,
}

impl InsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// Keyed storage for entities and relationships
#[async_trait]
pub trait GraphStore: Send {
    // ========== Entity Operations ==========

    /// Get an entity by `(id, domain)`
    async fn get_entity(&mut self, id: &str, domain: &str) -> Result<Option<Entity>>;

    /// Check whether `(id, domain)` is taken
    async fn entity_exists(&mut self, id: &str, domain: &str) -> Result<bool> {
        Ok(self.get_entity(id, domain).await?.is_some())
    }

    /// Insert a new entity; never overwrites an existing one
    async fn insert_entity(&mut self, entity: &Entity) -> Result<InsertOutcome>;

    /// Persist name, type, description, and `updated_at` of an existing entity
    async fn update_entity(&mut self, entity: &Entity) -> Result<()>;

    /// List all entities in a domain, ordered by id
    async fn list_entities(&mut self, domain: &str) -> Result<Vec<Entity>>;

    // ========== Relationship Operations ==========

    /// Get a relationship by its uniqueness key
    async fn get_relationship(&mut self, key: &RelationshipKey) -> Result<Option<Relationship>>;

    /// Insert a new relationship; never overwrites an existing one
    async fn insert_relationship(&mut self, relationship: &NewRelationship)
    -> Result<InsertOutcome>;

    /// Replace the description of a stored relationship
    async fn update_relationship_description(&mut self, id: i64, description: &str)
    -> Result<()>;

    /// List all relationships in a domain, ordered by id
    async fn list_relationships(&mut self, domain: &str) -> Result<Vec<Relationship>>;

    // ========== Bulk Operations ==========

    /// Delete every relationship and entity of a domain.
    ///
    /// Returns `(entities_deleted, relationships_deleted)`.
    async fn clear_domain(&mut self, domain: &str) -> Result<(u64, u64)>;
}
