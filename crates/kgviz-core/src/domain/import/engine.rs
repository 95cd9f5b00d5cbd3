//! Bulk import / merge engine
//!
//! Runs one import against one `GraphStore` unit of work. Nodes are processed
//! first, in input order, building the id remap table; links are processed
//! afterwards and resolve their endpoints through that table. Per-record
//! problems are tallied in the report; only storage failures abort.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::graph::{Entity, GraphStore, InsertOutcome, NewRelationship, RelationshipKey};
use crate::error::Result;

use super::fragment::{EdgeRecord, ImportRequest, NodeRecord, raw_str_field};
use super::id_allocator::allocate_entity_id;
use super::policy::{ConflictPolicy, ImportStrategy};
use super::report::{ConflictKind, ConflictRecord, ImportReport};
use super::resolver::{Decision, EdgeDecision, resolve, resolve_edge};

/// Import settings for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEngine {
    domain: String,
    strategy: ImportStrategy,
    conflict_policy: ConflictPolicy,
}

impl ImportEngine {
    pub fn new(
        domain: impl Into<String>,
        strategy: ImportStrategy,
        conflict_policy: ConflictPolicy,
    ) -> Self {
        Self {
            domain: domain.into(),
            strategy,
            conflict_policy,
        }
    }

    /// Engine configured from a parsed request
    pub fn for_request(request: &ImportRequest) -> Self {
        Self::new(
            request.domain.clone(),
            request.strategy,
            request.conflict_resolution,
        )
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn strategy(&self) -> ImportStrategy {
        self.strategy
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.conflict_policy
    }

    /// Import `nodes` then `links` into the store.
    ///
    /// The caller owns the unit of work and decides whether to commit it.
    pub async fn import<S>(&self, store: &mut S, nodes: &[Value], links: &[Value]) -> Result<ImportReport>
    where
        S: GraphStore + ?Sized,
    {
        let mut report = ImportReport::new();

        for raw in nodes {
            self.import_node(store, raw, &mut report).await?;
        }
        for raw in links {
            self.import_link(store, raw, &mut report).await?;
        }

        info!(
            domain = %self.domain,
            strategy = %self.strategy,
            conflict_resolution = %self.conflict_policy,
            entities_created = report.entities.created,
            entities_updated = report.entities.updated,
            entities_skipped = report.entities.skipped,
            entity_conflicts = report.entities.conflicts,
            entity_errors = report.entities.errors,
            relationships_created = report.relationships.created,
            relationships_updated = report.relationships.updated,
            relationships_skipped = report.relationships.skipped,
            relationship_errors = report.relationships.errors,
            "Import finished"
        );
        Ok(report)
    }

    // ========== Node Pass ==========

    async fn import_node<S>(&self, store: &mut S, raw: &Value, report: &mut ImportReport) -> Result<()>
    where
        S: GraphStore + ?Sized,
    {
        let record = match NodeRecord::from_value(raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Rejected node record");
                report.entities.errors += 1;
                report.log_conflict(ConflictRecord::entity(
                    ConflictKind::EntityValidationError,
                    raw_str_field(raw, "id"),
                    format!("Invalid node: {}", e),
                ));
                return Ok(());
            }
        };

        let existing = store.get_entity(&record.id, &self.domain).await?;
        let decision = resolve(existing.as_ref(), &record, self.conflict_policy);
        debug!(entity_id = %record.id, decision = ?decision, "Resolved node");

        match (decision, existing) {
            (Decision::Create, _) => {
                let entity = record.to_entity(&record.id, &self.domain);
                self.insert_node(store, &record.id, &entity, report).await?;
            }
            (Decision::Update(changes), Some(mut entity)) => {
                changes.apply(&mut entity);
                store.update_entity(&entity).await?;
                debug!(entity_id = %entity.id, fields = ?changes.fields(), "Merged node data");
                report.entities.updated += 1;
                report.map_id(&record.id, &record.id);
            }
            (Decision::Skip, _) | (Decision::Update(_), None) => {
                report.entities.skipped += 1;
                report.map_id(&record.id, &record.id);
            }
            (Decision::Rename, _) => {
                let fresh_id = allocate_entity_id(store, &record.id, &self.domain).await?;
                report.entities.conflicts += 1;
                report.log_conflict(ConflictRecord::entity(
                    ConflictKind::EntityIdConflict,
                    Some(record.id.clone()),
                    format!(
                        "Entity ID '{}' already exists in domain '{}', imported as '{}'",
                        record.id, self.domain, fresh_id
                    ),
                ));
                let entity = record.to_entity(&fresh_id, &self.domain);
                self.insert_node(store, &record.id, &entity, report).await?;
            }
        }
        Ok(())
    }

    /// Insert a node, recovering from a concurrent insert of the same key
    async fn insert_node<S>(
        &self,
        store: &mut S,
        original_id: &str,
        entity: &Entity,
        report: &mut ImportReport,
    ) -> Result<()>
    where
        S: GraphStore + ?Sized,
    {
        match store.insert_entity(entity).await? {
            InsertOutcome::Inserted(_) => {
                report.entities.created += 1;
                report.map_id(original_id, &entity.id);
            }
            InsertOutcome::Duplicate => {
                if store.entity_exists(&entity.id, &self.domain).await? {
                    warn!(entity_id = %entity.id, "Entity appeared during import, treating as skipped");
                    report.entities.skipped += 1;
                    report.map_id(original_id, &entity.id);
                } else {
                    report.entities.errors += 1;
                    report.log_conflict(ConflictRecord::entity(
                        ConflictKind::EntityCreationError,
                        Some(original_id.to_string()),
                        format!("Failed to create entity '{}'", entity.id),
                    ));
                }
            }
        }
        Ok(())
    }

    // ========== Link Pass ==========

    async fn import_link<S>(&self, store: &mut S, raw: &Value, report: &mut ImportReport) -> Result<()>
    where
        S: GraphStore + ?Sized,
    {
        let record = match EdgeRecord::from_value(raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Rejected link record");
                report.relationships.errors += 1;
                report.log_conflict(ConflictRecord::relationship(
                    ConflictKind::RelationshipValidationError,
                    raw_str_field(raw, "source"),
                    raw_str_field(raw, "target"),
                    format!("Invalid link: {}", e),
                ));
                return Ok(());
            }
        };

        let (source_id, target_id) = match (
            report.resolve_id(&record.source),
            report.resolve_id(&record.target),
        ) {
            (Some(s), Some(t)) => (s.to_string(), t.to_string()),
            (source, _) => {
                let missing = if source.is_none() {
                    &record.source
                } else {
                    &record.target
                };
                let message = format!("Link references '{}', which is not among the imported nodes", missing);
                report.relationships.errors += 1;
                report.log_conflict(ConflictRecord::relationship(
                    ConflictKind::RelationshipReferenceError,
                    Some(record.source.clone()),
                    Some(record.target.clone()),
                    message,
                ));
                return Ok(());
            }
        };

        if source_id == target_id {
            report.relationships.errors += 1;
            report.log_conflict(ConflictRecord::relationship(
                ConflictKind::RelationshipValidationError,
                Some(record.source.clone()),
                Some(record.target.clone()),
                format!("Link endpoints both resolve to '{}'", source_id),
            ));
            return Ok(());
        }

        let source = store.get_entity(&source_id, &self.domain).await?;
        let target = store.get_entity(&target_id, &self.domain).await?;
        if source.is_none() || target.is_none() {
            report.relationships.errors += 1;
            report.log_conflict(ConflictRecord::relationship(
                ConflictKind::RelationshipEntityNotFound,
                Some(source_id.clone()),
                Some(target_id.clone()),
                format!(
                    "Endpoint entity not found in domain '{}': {} -> {}",
                    self.domain, source_id, target_id
                ),
            ));
            return Ok(());
        }

        let key = RelationshipKey::new(
            source_id,
            target_id,
            record.relationship_type.clone(),
            self.domain.clone(),
        );
        let existing = store.get_relationship(&key).await?;

        match (resolve_edge(existing.as_ref(), &record, self.strategy), existing) {
            (EdgeDecision::Create, _) => {
                let new_rel = NewRelationship::new(key).with_description(&record.description);
                self.insert_link(store, &new_rel, report).await?;
            }
            (EdgeDecision::Update(description), Some(rel)) => {
                store.update_relationship_description(rel.id, &description).await?;
                debug!(relationship = %rel, "Updated relationship description");
                report.relationships.updated += 1;
            }
            (EdgeDecision::Skip, _) | (EdgeDecision::Update(_), None) => {
                report.relationships.skipped += 1;
            }
        }
        Ok(())
    }

    async fn insert_link<S>(
        &self,
        store: &mut S,
        relationship: &NewRelationship,
        report: &mut ImportReport,
    ) -> Result<()>
    where
        S: GraphStore + ?Sized,
    {
        match store.insert_relationship(relationship).await? {
            InsertOutcome::Inserted(id) => {
                debug!(relationship_id = id, "Relationship created");
                report.relationships.created += 1;
            }
            InsertOutcome::Duplicate => {
                if store.get_relationship(&relationship.key).await?.is_some() {
                    warn!(
                        source = %relationship.key.source_id,
                        target = %relationship.key.target_id,
                        "Relationship appeared during import, treating as skipped"
                    );
                    report.relationships.skipped += 1;
                } else {
                    report.relationships.errors += 1;
                    report.log_conflict(ConflictRecord::relationship(
                        ConflictKind::RelationshipCreationError,
                        Some(relationship.key.source_id.clone()),
                        Some(relationship.key.target_id.clone()),
                        format!(
                            "Failed to create relationship of type '{}'",
                            relationship.key.relationship_type
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}
