//! Graph entities
//!
//! An entity is a node of the knowledge graph. Its identity is the compound
//! key `(id, domain)`; the same id may exist independently in several domains.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Domain used when a caller does not name one
pub const DEFAULT_DOMAIN: &str = "default";

/// Map an empty or missing domain name to [`DEFAULT_DOMAIN`]
pub fn normalize_domain(domain: Option<&str>) -> String {
    match domain.map(str::trim) {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => DEFAULT_DOMAIN.to_string(),
    }
}

/// A knowledge graph entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Identifier, unique within `domain`
    pub id: String,
    /// Display name (never empty)
    pub name: String,
    /// Free-form entity type; empty when unknown
    #[serde(rename = "type", default)]
    pub entity_type: String,
    /// Free-form description; empty when unknown
    #[serde(default)]
    pub description: String,
    /// Partition key
    pub domain: String,
    /// When the entity was created
    pub created_at: DateTime<Utc>,
    /// When the entity was last updated
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    /// Create a new entity with empty type and description
    pub fn new(id: impl Into<String>, name: impl Into<String>, domain: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            entity_type: String::new(),
            description: String::new(),
            domain: domain.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the entity type
    pub fn with_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = entity_type.into();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the entity as modified now
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
