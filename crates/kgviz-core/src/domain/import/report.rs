//! The import report: counters, conflict log, and id remap table

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-outcome counters for imported nodes
///
/// Every node lands in exactly one of `created`, `updated`, `skipped`,
/// `errors`. `conflicts` counts the renamed subset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStats {
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub conflicts: u64,
    pub errors: u64,
}

impl EntityStats {
    /// Number of node records accounted for
    pub fn processed(&self) -> u64 {
        self.created + self.updated + self.skipped + self.errors
    }
}

/// Per-outcome counters for imported links
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipStats {
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: u64,
}

impl RelationshipStats {
    /// Number of link records accounted for
    pub fn processed(&self) -> u64 {
        self.created + self.updated + self.skipped + self.errors
    }
}

/// Category of a conflict log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// An incoming node id was taken and the node was stored under a new id
    EntityIdConflict,
    /// Inserting an entity failed and the entity could not be found afterwards
    EntityCreationError,
    /// A node record was malformed
    EntityValidationError,
    /// A link record was malformed or a self-loop
    RelationshipValidationError,
    /// A link references a node id that is not part of this import
    RelationshipReferenceError,
    /// A link endpoint is missing from the store
    RelationshipEntityNotFound,
    /// Inserting a relationship failed and it could not be found afterwards
    RelationshipCreationError,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EntityIdConflict => "entity_id_conflict",
            Self::EntityCreationError => "entity_creation_error",
            Self::EntityValidationError => "entity_validation_error",
            Self::RelationshipValidationError => "relationship_validation_error",
            Self::RelationshipReferenceError => "relationship_reference_error",
            Self::RelationshipEntityNotFound => "relationship_entity_not_found",
            Self::RelationshipCreationError => "relationship_creation_error",
        }
    }
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of the conflict log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub message: String,
}

impl ConflictRecord {
    /// Entry about a node
    pub fn entity(kind: ConflictKind, original_id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            original_id,
            source: None,
            target: None,
            message: message.into(),
        }
    }

    /// Entry about a link
    pub fn relationship(
        kind: ConflictKind,
        source: Option<String>,
        target: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            original_id: None,
            source,
            target,
            message: message.into(),
        }
    }
}

/// Everything that happened during one import
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub entities: EntityStats,
    pub relationships: RelationshipStats,
    /// Conflict log, in processing order
    pub conflicts: Vec<ConflictRecord>,
    /// Original incoming node id -> id the node ended up stored under
    #[serde(rename = "entity_id_mapping")]
    pub id_mapping: BTreeMap<String, String>,
}

impl ImportReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record where an incoming node id ended up
    pub fn map_id(&mut self, original: impl Into<String>, resolved: impl Into<String>) {
        self.id_mapping.insert(original.into(), resolved.into());
    }

    /// Resolve an incoming node id through the remap table
    pub fn resolve_id(&self, original: &str) -> Option<&str> {
        self.id_mapping.get(original).map(String::as_str)
    }

    pub fn log_conflict(&mut self, record: ConflictRecord) {
        self.conflicts.push(record);
    }

    /// Conflict log entries of one kind
    pub fn conflicts_of(&self, kind: ConflictKind) -> impl Iterator<Item = &ConflictRecord> {
        self.conflicts.iter().filter(move |c| c.kind == kind)
    }

    /// Whether the import changed nothing in the store
    pub fn is_noop(&self) -> bool {
        self.entities.created == 0
            && self.entities.updated == 0
            && self.relationships.created == 0
            && self.relationships.updated == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processed_excludes_conflicts() {
        let stats = EntityStats {
            created: 2,
            updated: 1,
            skipped: 3,
            conflicts: 2,
            errors: 1,
        };
        assert_eq!(stats.processed(), 7);
    }

    #[test]
    fn test_conflict_record_serialization() {
        let record = ConflictRecord::entity(
            ConflictKind::EntityIdConflict,
            Some("e1".into()),
            "renamed",
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "entity_id_conflict");
        assert_eq!(json["original_id"], "e1");
        assert!(json.get("source").is_none());

        let record = ConflictRecord::relationship(
            ConflictKind::RelationshipEntityNotFound,
            Some("a".into()),
            Some("b".into()),
            "missing",
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["source"], "a");
        assert_eq!(json["target"], "b");
        assert!(json.get("original_id").is_none());
    }

    #[test]
    fn test_remap_table() {
        let mut report = ImportReport::new();
        report.map_id("a", "a_1");
        assert_eq!(report.resolve_id("a"), Some("a_1"));
        assert_eq!(report.resolve_id("b"), None);
        assert!(report.is_noop());
    }
}
