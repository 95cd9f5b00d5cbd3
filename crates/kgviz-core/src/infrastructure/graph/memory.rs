//! In-memory `GraphStore`
//!
//! Ordered maps keep listings deterministic. Cloning the store takes a
//! snapshot, which is how callers emulate rollback.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::domain::graph::{
    Entity, GraphStore, InsertOutcome, NewRelationship, Relationship, RelationshipKey,
};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct MemoryGraphStore {
    /// Keyed by `(domain, id)`
    entities: BTreeMap<(String, String), Entity>,
    relationships: BTreeMap<i64, Relationship>,
    relationship_index: BTreeMap<RelationshipKey, i64>,
    next_relationship_id: i64,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self {
            next_relationship_id: 1,
            ..Default::default()
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    fn entity_key(id: &str, domain: &str) -> (String, String) {
        (domain.to_string(), id.to_string())
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn get_entity(&mut self, id: &str, domain: &str) -> Result<Option<Entity>> {
        Ok(self.entities.get(&Self::entity_key(id, domain)).cloned())
    }

    async fn insert_entity(&mut self, entity: &Entity) -> Result<InsertOutcome> {
        let key = Self::entity_key(&entity.id, &entity.domain);
        if self.entities.contains_key(&key) {
            return Ok(InsertOutcome::Duplicate);
        }
        self.entities.insert(key, entity.clone());
        Ok(InsertOutcome::Inserted(0))
    }

    async fn update_entity(&mut self, entity: &Entity) -> Result<()> {
        match self.entities.get_mut(&Self::entity_key(&entity.id, &entity.domain)) {
            Some(stored) => {
                stored.name = entity.name.clone();
                stored.entity_type = entity.entity_type.clone();
                stored.description = entity.description.clone();
                stored.updated_at = entity.updated_at;
                Ok(())
            }
            None => Err(Error::EntityNotFound(format!(
                "{} (domain '{}')",
                entity.id, entity.domain
            ))),
        }
    }

    async fn list_entities(&mut self, domain: &str) -> Result<Vec<Entity>> {
        Ok(self
            .entities
            .iter()
            .filter(|((d, _), _)| d == domain)
            .map(|(_, e)| e.clone())
            .collect())
    }

    async fn get_relationship(&mut self, key: &RelationshipKey) -> Result<Option<Relationship>> {
        Ok(self
            .relationship_index
            .get(key)
            .and_then(|id| self.relationships.get(id))
            .cloned())
    }

    async fn insert_relationship(
        &mut self,
        relationship: &NewRelationship,
    ) -> Result<InsertOutcome> {
        let key = &relationship.key;
        if key.source_id == key.target_id {
            return Err(Error::InvalidInput(format!(
                "relationship source and target are both '{}'",
                key.source_id
            )));
        }
        for endpoint in [&key.source_id, &key.target_id] {
            if !self
                .entities
                .contains_key(&Self::entity_key(endpoint, &key.domain))
            {
                return Err(Error::EntityNotFound(format!(
                    "{} (domain '{}')",
                    endpoint, key.domain
                )));
            }
        }
        if self.relationship_index.contains_key(key) {
            return Ok(InsertOutcome::Duplicate);
        }

        let id = self.next_relationship_id.max(1);
        self.next_relationship_id = id + 1;
        self.relationship_index.insert(key.clone(), id);
        self.relationships
            .insert(id, relationship.clone().into_relationship(id));
        Ok(InsertOutcome::Inserted(id))
    }

    async fn update_relationship_description(
        &mut self,
        id: i64,
        description: &str,
    ) -> Result<()> {
        match self.relationships.get_mut(&id) {
            Some(rel) => {
                rel.description = description.to_string();
                Ok(())
            }
            None => Err(Error::EntityNotFound(format!("relationship {}", id))),
        }
    }

    async fn list_relationships(&mut self, domain: &str) -> Result<Vec<Relationship>> {
        Ok(self
            .relationships
            .values()
            .filter(|r| r.domain == domain)
            .cloned()
            .collect())
    }

    async fn clear_domain(&mut self, domain: &str) -> Result<(u64, u64)> {
        let before_rels = self.relationships.len();
        self.relationships.retain(|_, r| r.domain != domain);
        self.relationship_index.retain(|k, _| k.domain != domain);
        let before_entities = self.entities.len();
        self.entities.retain(|(d, _), _| d != domain);

        Ok((
            (before_entities - self.entities.len()) as u64,
            (before_rels - self.relationships.len()) as u64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_entity_is_reported() {
        let mut store = MemoryGraphStore::new();
        let e = Entity::new("a", "A", "d");
        assert!(store.insert_entity(&e).await.unwrap().is_inserted());
        assert_eq!(store.insert_entity(&e).await.unwrap(), InsertOutcome::Duplicate);
        assert_eq!(store.entity_count(), 1);
    }

    #[tokio::test]
    async fn test_relationship_requires_endpoints() {
        let mut store = MemoryGraphStore::new();
        store.insert_entity(&Entity::new("a", "A", "d")).await.unwrap();

        let dangling = NewRelationship::new(RelationshipKey::new("a", "b", "t", "d"));
        assert!(matches!(
            store.insert_relationship(&dangling).await,
            Err(Error::EntityNotFound(_))
        ));

        let self_loop = NewRelationship::new(RelationshipKey::new("a", "a", "t", "d"));
        assert!(store.insert_relationship(&self_loop).await.is_err());
        assert_eq!(store.relationship_count(), 0);
    }

    #[tokio::test]
    async fn test_relationship_ids_increase() {
        let mut store = MemoryGraphStore::new();
        for id in ["a", "b"] {
            store.insert_entity(&Entity::new(id, id, "d")).await.unwrap();
        }
        let first = NewRelationship::new(RelationshipKey::new("a", "b", "t1", "d"));
        let second = NewRelationship::new(RelationshipKey::new("a", "b", "t2", "d"));
        assert_eq!(
            store.insert_relationship(&first).await.unwrap(),
            InsertOutcome::Inserted(1)
        );
        assert_eq!(
            store.insert_relationship(&second).await.unwrap(),
            InsertOutcome::Inserted(2)
        );
        assert_eq!(
            store.insert_relationship(&first).await.unwrap(),
            InsertOutcome::Duplicate
        );
    }

    #[tokio::test]
    async fn test_clear_domain_leaves_other_domains() {
        let mut store = MemoryGraphStore::new();
        for domain in ["d", "keep"] {
            for id in ["a", "b"] {
                store.insert_entity(&Entity::new(id, id, domain)).await.unwrap();
            }
            store
                .insert_relationship(&NewRelationship::new(RelationshipKey::new(
                    "a", "b", "t", domain,
                )))
                .await
                .unwrap();
        }

        assert_eq!(store.clear_domain("d").await.unwrap(), (2, 1));
        assert_eq!(store.list_entities("keep").await.unwrap().len(), 2);
        assert_eq!(store.list_relationships("keep").await.unwrap().len(), 1);
        assert!(
            store
                .get_relationship(&RelationshipKey::new("a", "b", "t", "d"))
                .await
                .unwrap()
                .is_none()
        );
    }
}
