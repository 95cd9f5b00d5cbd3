//! Graph commands: import, export, statistics, clear
//!
//! Each command runs in its own unit of work against the database.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::graph::GraphStore;
use crate::domain::import::{
    ConflictPolicy, GraphFragment, ImportEngine, ImportReport, ImportRequest, ImportStrategy,
};
use crate::error::Result;
use crate::infrastructure::graph::SqliteUnitOfWork;
use crate::storage::Database;

/// Result of one import call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub report: ImportReport,
    pub domain: String,
    pub strategy: ImportStrategy,
    pub conflict_resolution: ConflictPolicy,
    /// Writes were rolled back
    pub dry_run: bool,
}

/// Rows removed by a domain clear
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearResult {
    pub entities_deleted: u64,
    pub relationships_deleted: u64,
}

/// Statistics about one domain of the graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub domain: String,
    pub total_entities: u64,
    pub total_relationships: u64,
    /// Entity count per type; untyped entities are counted under ""
    pub entities_by_type: BTreeMap<String, u64>,
    pub relationships_by_type: BTreeMap<String, u64>,
}

/// Import a fragment in a single transaction.
///
/// Fatal errors roll everything back. A dry run returns the report it would
/// have produced and rolls back as well.
pub async fn import_graph(db: &Database, request: ImportRequest) -> Result<ImportOutcome> {
    let engine = ImportEngine::for_request(&request);
    let mut uow = SqliteUnitOfWork::begin(db.pool()).await?;

    let report = match engine.import(&mut uow, &request.nodes, &request.links).await {
        Ok(report) => report,
        Err(e) => {
            warn!(error = %e, domain = %request.domain, "Import aborted, rolling back");
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "Rollback after failed import also failed");
            }
            return Err(e);
        }
    };

    if request.dry_run {
        uow.rollback().await?;
        info!(domain = %request.domain, "Dry run complete, changes discarded");
    } else {
        uow.commit().await?;
    }

    Ok(ImportOutcome {
        report,
        domain: request.domain,
        strategy: request.strategy,
        conflict_resolution: request.conflict_resolution,
        dry_run: request.dry_run,
    })
}

/// Export a domain as a `{nodes, links}` document
pub async fn export_domain(db: &Database, domain: &str) -> Result<GraphFragment> {
    let mut uow = SqliteUnitOfWork::begin(db.pool()).await?;
    let fragment = export_from(&mut uow, domain).await?;
    uow.rollback().await?;
    Ok(fragment)
}

/// Export a domain from any store
pub async fn export_from<S>(store: &mut S, domain: &str) -> Result<GraphFragment>
where
    S: GraphStore + ?Sized,
{
    let entities = store.list_entities(domain).await?;
    let relationships = store.list_relationships(domain).await?;
    Ok(GraphFragment::from_graph(entities, relationships))
}

/// Delete every entity and relationship of a domain
pub async fn clear_domain(db: &Database, domain: &str) -> Result<ClearResult> {
    let mut uow = SqliteUnitOfWork::begin(db.pool()).await?;
    let (entities_deleted, relationships_deleted) = uow.clear_domain(domain).await?;
    uow.commit().await?;

    Ok(ClearResult {
        entities_deleted,
        relationships_deleted,
    })
}

/// Get statistics for a domain
pub async fn graph_stats(db: &Database, domain: &str) -> Result<GraphStatistics> {
    let mut uow = SqliteUnitOfWork::begin(db.pool()).await?;
    let stats = stats_from(&mut uow, domain).await?;
    uow.rollback().await?;
    Ok(stats)
}

/// Compute statistics for a domain from any store
pub async fn stats_from<S>(store: &mut S, domain: &str) -> Result<GraphStatistics>
where
    S: GraphStore + ?Sized,
{
    let entities = store.list_entities(domain).await?;
    let relationships = store.list_relationships(domain).await?;

    let mut entities_by_type = BTreeMap::new();
    for entity in &entities {
        *entities_by_type.entry(entity.entity_type.clone()).or_insert(0) += 1;
    }

    let mut relationships_by_type = BTreeMap::new();
    for rel in &relationships {
        *relationships_by_type
            .entry(rel.relationship_type.clone())
            .or_insert(0) += 1;
    }

    Ok(GraphStatistics {
        domain: domain.to_string(),
        total_entities: entities.len() as u64,
        total_relationships: relationships.len() as u64,
        entities_by_type,
        relationships_by_type,
    })
}
