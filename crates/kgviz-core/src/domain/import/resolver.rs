//! Conflict resolution decisions
//!
//! Pure functions: they look at the incoming record and the stored record (if
//! any) and say what should happen. All storage mutation happens in the engine.

use crate::domain::graph::{Entity, Relationship};

use super::fragment::{EdgeRecord, NodeRecord};
use super::policy::{ConflictPolicy, ImportStrategy};

/// Field updates staged by the `merge_data` policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityChanges {
    pub entity_type: Option<String>,
    pub description: Option<String>,
}

impl EntityChanges {
    pub fn is_empty(&self) -> bool {
        self.entity_type.is_none() && self.description.is_none()
    }

    /// Names of the staged fields
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.entity_type.is_some() {
            fields.push("type");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        fields
    }

    /// Apply the staged fields to a stored entity
    pub fn apply(&self, entity: &mut Entity) {
        if let Some(entity_type) = &self.entity_type {
            entity.entity_type = entity_type.clone();
        }
        if let Some(description) = &self.description {
            entity.description = description.clone();
        }
        entity.touch();
    }
}

/// What to do with one incoming node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// No stored entity: insert under the incoming id
    Create,
    /// Stored entity gains the staged fields
    Update(EntityChanges),
    /// Stored entity stays as it is
    Skip,
    /// Store the incoming data under a freshly allocated id
    Rename,
}

/// Decide how to reconcile an incoming node with the stored entity.
///
/// `incoming` has already passed validation.
pub fn resolve(existing: Option<&Entity>, incoming: &NodeRecord, policy: ConflictPolicy) -> Decision {
    let Some(existing) = existing else {
        return Decision::Create;
    };

    match policy {
        ConflictPolicy::Skip => Decision::Skip,
        ConflictPolicy::AutoId => Decision::Rename,
        ConflictPolicy::MergeData => {
            let changes = stage_changes(existing, incoming);
            if changes.is_empty() {
                Decision::Skip
            } else {
                Decision::Update(changes)
            }
        }
    }
}

fn stage_changes(existing: &Entity, incoming: &NodeRecord) -> EntityChanges {
    let fill = |current: &str, candidate: &str| {
        (current.is_empty() && !candidate.is_empty()).then(|| candidate.to_string())
    };

    EntityChanges {
        entity_type: fill(&existing.entity_type, &incoming.entity_type),
        description: fill(&existing.description, &incoming.description),
    }
}

/// What to do with one incoming link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeDecision {
    /// No stored relationship: insert it
    Create,
    /// Replace the stored description with this one
    Update(String),
    /// Stored relationship stays as it is
    Skip,
}

/// Decide how to reconcile an incoming link with the stored relationship
pub fn resolve_edge(
    existing: Option<&Relationship>,
    incoming: &EdgeRecord,
    strategy: ImportStrategy,
) -> EdgeDecision {
    let Some(existing) = existing else {
        return EdgeDecision::Create;
    };

    let replace = match strategy {
        ImportStrategy::Skip | ImportStrategy::CreateNew => false,
        ImportStrategy::Merge => {
            existing.description.is_empty() && !incoming.description.is_empty()
        }
        ImportStrategy::Overwrite => {
            !incoming.description.is_empty() && incoming.description != existing.description
        }
    };

    if replace {
        EdgeDecision::Update(incoming.description.clone())
    } else {
        EdgeDecision::Skip
    }
}
