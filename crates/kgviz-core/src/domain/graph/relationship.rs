//! Typed relationships between entities
//!
//! Both endpoints of a relationship live in the relationship's own domain and
//! must differ from each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored relationship between two entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Store-assigned identifier
    pub id: i64,
    /// ID of the source entity
    pub source_id: String,
    /// ID of the target entity
    pub target_id: String,
    /// Relationship type (never empty)
    #[serde(rename = "type")]
    pub relationship_type: String,
    /// Free-form description; empty when unknown
    #[serde(default)]
    pub description: String,
    /// Partition key shared with both endpoints
    pub domain: String,
    /// When the relationship was created
    pub created_at: DateTime<Utc>,
}

impl Relationship {
    /// The uniqueness key of this relationship
    pub fn key(&self) -> RelationshipKey {
        RelationshipKey {
            source_id: self.source_id.clone(),
            target_id: self.target_id.clone(),
            relationship_type: self.relationship_type.clone(),
            domain: self.domain.clone(),
        }
    }
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -[{}]-> {}",
            self.source_id, self.relationship_type, self.target_id
        )
    }
}

/// Uniqueness key of a relationship: `(source, target, type, domain)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationshipKey {
    pub source_id: String,
    pub target_id: String,
    pub relationship_type: String,
    pub domain: String,
}

impl RelationshipKey {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relationship_type: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relationship_type: relationship_type.into(),
            domain: domain.into(),
        }
    }
}

/// A relationship that has not been stored yet (no id assigned)
#[derive(Debug, Clone, PartialEq)]
pub struct NewRelationship {
    pub key: RelationshipKey,
    pub description: String,
}

impl NewRelationship {
    pub fn new(key: RelationshipKey) -> Self {
        Self {
            key,
            description: String::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Materialize with a store-assigned id
    pub fn into_relationship(self, id: i64) -> Relationship {
        Relationship {
            id,
            source_id: self.key.source_id,
            target_id: self.key.target_id,
            relationship_type: self.key.relationship_type,
            description: self.description,
            domain: self.key.domain,
            created_at: Utc::now(),
        }
    }
}
