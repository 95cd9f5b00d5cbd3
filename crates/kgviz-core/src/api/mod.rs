//! JSON response envelope for the web layer
//!
//! Every handler answers with `{ret, msg, data}`: `ret` is 0 on success and 1
//! on failure, and failures carry no `data`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::commands::graph::{self, ImportOutcome};
use crate::domain::graph::normalize_domain;
use crate::domain::import::{
    ConflictPolicy, ConflictRecord, EntityStats, GraphFragment, ImportRequest, ImportStrategy,
    RelationshipStats,
};
use crate::error::Error;
use crate::storage::Database;

pub const RET_OK: i32 = 0;
pub const RET_ERROR: i32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ret: i32,
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(msg: impl Into<String>, data: T) -> Self {
        Self {
            ret: RET_OK,
            msg: msg.into(),
            data: Some(data),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            ret: RET_ERROR,
            msg: msg.into(),
            data: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ret == RET_OK
    }
}

impl<T> From<Error> for ApiResponse<T> {
    fn from(e: Error) -> Self {
        Self::error(e.to_string())
    }
}

/// Counters and conflict log of an import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportStats {
    pub entities: EntityStats,
    pub relationships: RelationshipStats,
    pub conflicts: Vec<ConflictRecord>,
}

/// `data` payload of a successful import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportData {
    pub import_stats: ImportStats,
    pub entity_id_mapping: BTreeMap<String, String>,
    pub domain: String,
    pub strategy: ImportStrategy,
    pub conflict_resolution: ConflictPolicy,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
}

impl From<ImportOutcome> for ImportData {
    fn from(outcome: ImportOutcome) -> Self {
        let report = outcome.report;
        Self {
            import_stats: ImportStats {
                entities: report.entities,
                relationships: report.relationships,
                conflicts: report.conflicts,
            },
            entity_id_mapping: report.id_mapping,
            domain: outcome.domain,
            strategy: outcome.strategy,
            conflict_resolution: outcome.conflict_resolution,
            dry_run: outcome.dry_run,
        }
    }
}

/// Handle an import request body
pub async fn handle_import(db: &Database, body: &str) -> ApiResponse<ImportData> {
    let request = match ImportRequest::from_json(body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejected import request");
            return e.into();
        }
    };

    match graph::import_graph(db, request).await {
        Ok(outcome) => ApiResponse::ok("import completed", outcome.into()),
        Err(e) => {
            warn!(error = %e, "Import failed");
            e.into()
        }
    }
}

/// Handle a graph data request for one domain
pub async fn handle_graph_data(db: &Database, domain: Option<&str>) -> ApiResponse<GraphFragment> {
    let domain = normalize_domain(domain);
    match graph::export_domain(db, &domain).await {
        Ok(fragment) => ApiResponse::ok("success", fragment),
        Err(e) => e.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_import_envelope_shape() {
        let db = Database::in_memory().await.unwrap();
        let body = json!({
            "nodes": [{"id": "a", "name": "A"}, {"id": "b", "name": "B"}],
            "links": [{"source": "a", "target": "b", "type": "knows"}],
            "domain": "d"
        })
        .to_string();

        let response = handle_import(&db, &body).await;
        assert!(response.is_ok());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["ret"], 0);
        assert_eq!(json["msg"], "import completed");
        assert_eq!(json["data"]["import_stats"]["entities"]["created"], 2);
        assert_eq!(json["data"]["import_stats"]["relationships"]["created"], 1);
        assert_eq!(json["data"]["entity_id_mapping"]["a"], "a");
        assert_eq!(json["data"]["domain"], "d");
        assert_eq!(json["data"]["strategy"], "merge");
        assert_eq!(json["data"]["conflict_resolution"], "auto_id");
        assert!(json["data"].get("dry_run").is_none());
    }

    #[tokio::test]
    async fn test_structural_failure_has_no_data() {
        let db = Database::in_memory().await.unwrap();
        for body in [
            "not json",
            r#"{"nodes": []}"#,
            r#"{"nodes": {}, "links": []}"#,
            r#"{"nodes": [], "links": [], "strategy": "replace"}"#,
        ] {
            let response = handle_import(&db, body).await;
            assert_eq!(response.ret, RET_ERROR);
            let json = serde_json::to_value(&response).unwrap();
            assert!(json.get("data").is_none());
        }
    }

    #[tokio::test]
    async fn test_graph_data_defaults_domain() {
        let db = Database::in_memory().await.unwrap();
        let body = json!({"nodes": [{"id": "a", "name": "A"}], "links": []}).to_string();
        handle_import(&db, &body).await;

        let response = handle_graph_data(&db, None).await;
        let data = response.data.unwrap();
        assert_eq!(data.nodes.len(), 1);
        assert_eq!(data.nodes[0].domain, "default");

        let json: Value = serde_json::to_value(&data).unwrap();
        assert_eq!(json["nodes"][0]["type"], "");
    }
}
