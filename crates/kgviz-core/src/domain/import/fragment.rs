//! Import payloads: the request envelope and per-record parsing
//!
//! The request is checked structurally up front (`ImportRequest::from_json`).
//! Individual node and link elements stay raw JSON until the engine reaches
//! them, so one malformed record never blocks the rest of the batch.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::graph::{DEFAULT_DOMAIN, Entity, Relationship, normalize_domain};
use crate::error::{Error, Result};

use super::policy::{ConflictPolicy, ImportStrategy};

/// Why a single node or link record was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The array element is not a JSON object
    NotAnObject,
    /// A field has the wrong JSON type
    WrongType(String),
    /// A required field is missing or empty
    MissingField(&'static str),
    /// A link whose source and target are the same entity
    SelfLoop,
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "record must be an object"),
            Self::WrongType(detail) => write!(f, "invalid field type: {}", detail),
            Self::MissingField(field) => write!(f, "missing required field '{}'", field),
            Self::SelfLoop => write!(f, "source and target must differ"),
        }
    }
}

#[derive(Deserialize)]
struct RawNode {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    entity_type: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct RawLink {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    target: Option<String>,
    #[serde(rename = "type", default)]
    relationship_type: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

fn required(value: Option<String>, field: &'static str) -> std::result::Result<String, RecordError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(RecordError::MissingField(field)),
    }
}

/// Best-effort string field of a raw record, for conflict log entries
pub(crate) fn raw_str_field(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_string)
}

/// A validated incoming node: `id` and `name` are non-empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub id: String,
    pub name: String,
    pub entity_type: String,
    pub description: String,
}

impl NodeRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            entity_type: String::new(),
            description: String::new(),
        }
    }

    pub fn with_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = entity_type.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Parse and validate one element of the `nodes` array
    pub fn from_value(value: &Value) -> std::result::Result<Self, RecordError> {
        if !value.is_object() {
            return Err(RecordError::NotAnObject);
        }
        let raw: RawNode = serde_json::from_value(value.clone())
            .map_err(|e| RecordError::WrongType(e.to_string()))?;

        Ok(Self {
            id: required(raw.id, "id")?,
            name: required(raw.name, "name")?,
            entity_type: raw.entity_type.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
        })
    }

    /// Build the entity this record describes, stored under `id` in `domain`
    pub fn to_entity(&self, id: &str, domain: &str) -> Entity {
        Entity::new(id, &self.name, domain)
            .with_type(&self.entity_type)
            .with_description(&self.description)
    }
}

/// A validated incoming link: `source`, `target`, `type` are non-empty and
/// `source != target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub relationship_type: String,
    pub description: String,
}

impl EdgeRecord {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relationship_type: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relationship_type: relationship_type.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Parse and validate one element of the `links` array
    pub fn from_value(value: &Value) -> std::result::Result<Self, RecordError> {
        if !value.is_object() {
            return Err(RecordError::NotAnObject);
        }
        let raw: RawLink = serde_json::from_value(value.clone())
            .map_err(|e| RecordError::WrongType(e.to_string()))?;

        let record = Self {
            source: required(raw.source, "source")?,
            target: required(raw.target, "target")?,
            relationship_type: required(raw.relationship_type, "type")?,
            description: raw.description.unwrap_or_default(),
        };
        if record.source == record.target {
            return Err(RecordError::SelfLoop);
        }
        Ok(record)
    }
}

/// A structurally valid import request
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRequest {
    /// Raw node records, validated one by one during import
    pub nodes: Vec<Value>,
    /// Raw link records, validated one by one during import
    pub links: Vec<Value>,
    /// Edge-level strategy
    pub strategy: ImportStrategy,
    /// Target partition
    pub domain: String,
    /// Node-level conflict policy
    pub conflict_resolution: ConflictPolicy,
    /// Run the import and discard its writes
    pub dry_run: bool,
}

impl ImportRequest {
    /// Create a request with default domain, strategy, and policy
    pub fn new(nodes: Vec<Value>, links: Vec<Value>) -> Self {
        Self {
            nodes,
            links,
            strategy: ImportStrategy::default(),
            domain: DEFAULT_DOMAIN.to_string(),
            conflict_resolution: ConflictPolicy::default(),
            dry_run: false,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        let domain: String = domain.into();
        self.domain = normalize_domain(Some(&domain));
        self
    }

    pub fn with_strategy(mut self, strategy: ImportStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_conflict_resolution(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_resolution = policy;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Parse a request body
    pub fn from_json(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)?;
        Self::from_value(value)
    }

    /// Check the top-level shape of a request.
    ///
    /// Any failure here is fatal for the whole import.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(Error::InvalidPayload(
                "request body must be a JSON object".into(),
            ));
        };

        let nodes = take_array(&mut map, "nodes")?;
        let links = take_array(&mut map, "links")?;

        let strategy = match optional_str(&map, "strategy")? {
            Some(s) => ImportStrategy::parse(s)?,
            None => ImportStrategy::default(),
        };
        let conflict_resolution = match optional_str(&map, "conflict_resolution")? {
            Some(s) => ConflictPolicy::parse(s)?,
            None => ConflictPolicy::default(),
        };
        let domain = normalize_domain(optional_str(&map, "domain")?);
        let dry_run = match map.get("dry_run") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                return Err(Error::InvalidPayload("'dry_run' must be a boolean".into()));
            }
        };

        Ok(Self {
            nodes,
            links,
            strategy,
            domain,
            conflict_resolution,
            dry_run,
        })
    }
}

fn take_array(map: &mut Map<String, Value>, field: &str) -> Result<Vec<Value>> {
    match map.remove(field) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(Error::InvalidPayload(format!("'{}' must be an array", field))),
        None => Err(Error::InvalidPayload(format!(
            "missing required field '{}'",
            field
        ))),
    }
}

fn optional_str<'a>(map: &'a Map<String, Value>, field: &str) -> Result<Option<&'a str>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(Error::InvalidPayload(format!("'{}' must be a string", field))),
    }
}

/// Node as rendered for the front-end graph view and for export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub entity_type: String,
    #[serde(default)]
    pub description: String,
    pub domain: String,
}

/// Link as rendered for the front-end graph view and for export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub id: i64,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub relationship_type: String,
    #[serde(default)]
    pub description: String,
    pub domain: String,
}

/// A D3-friendly `{nodes, links}` document. Exported fragments can be fed
/// straight back into an import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphFragment {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl GraphFragment {
    pub fn from_graph(entities: Vec<Entity>, relationships: Vec<Relationship>) -> Self {
        let nodes = entities
            .into_iter()
            .map(|e| GraphNode {
                id: e.id,
                name: e.name,
                entity_type: e.entity_type,
                description: e.description,
                domain: e.domain,
            })
            .collect();
        let links = relationships
            .into_iter()
            .map(|r| GraphLink {
                id: r.id,
                source: r.source_id,
                target: r.target_id,
                relationship_type: r.relationship_type,
                description: r.description,
                domain: r.domain,
            })
            .collect();
        Self { nodes, links }
    }

    /// Turn this fragment into an import request with default settings
    pub fn into_request(self) -> Result<ImportRequest> {
        let nodes = self
            .nodes
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let links = self
            .links
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ImportRequest::new(nodes, links))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_record_parsing() {
        let node = NodeRecord::from_value(&json!({
            "id": "e1", "name": "Alice", "type": "person", "extra": 42
        }))
        .unwrap();
        assert_eq!(node, NodeRecord::new("e1", "Alice").with_type("person"));
    }

    #[test]
    fn test_node_record_rejects_missing_and_empty_fields() {
        assert_eq!(
            NodeRecord::from_value(&json!({"name": "Alice"})),
            Err(RecordError::MissingField("id"))
        );
        assert_eq!(
            NodeRecord::from_value(&json!({"id": "e1", "name": ""})),
            Err(RecordError::MissingField("name"))
        );
        assert_eq!(
            NodeRecord::from_value(&json!("e1")),
            Err(RecordError::NotAnObject)
        );
        assert!(matches!(
            NodeRecord::from_value(&json!({"id": 5, "name": "Alice"})),
            Err(RecordError::WrongType(_))
        ));
    }

    #[test]
    fn test_edge_record_rejects_self_loop() {
        assert_eq!(
            EdgeRecord::from_value(&json!({"source": "a", "target": "a", "type": "t"})),
            Err(RecordError::SelfLoop)
        );
        assert_eq!(
            EdgeRecord::from_value(&json!({"source": "a", "target": "b"})),
            Err(RecordError::MissingField("type"))
        );
    }

    #[test]
    fn test_request_defaults() {
        let req = ImportRequest::from_json(r#"{"nodes": [], "links": []}"#).unwrap();
        assert_eq!(req.domain, DEFAULT_DOMAIN);
        assert_eq!(req.strategy, ImportStrategy::Merge);
        assert_eq!(req.conflict_resolution, ConflictPolicy::AutoId);
        assert!(!req.dry_run);
    }

    #[test]
    fn test_request_structural_errors() {
        for body in [
            "not json",
            "[]",
            r#"{"links": []}"#,
            r#"{"nodes": {}, "links": []}"#,
            r#"{"nodes": [], "links": "x"}"#,
            r#"{"nodes": [], "links": [], "strategy": "replace"}"#,
            r#"{"nodes": [], "links": [], "conflict_resolution": "rename"}"#,
            r#"{"nodes": [], "links": [], "domain": 3}"#,
        ] {
            let err = ImportRequest::from_json(body).unwrap_err();
            assert!(matches!(err, Error::InvalidPayload(_)), "body: {}", body);
        }
    }

    #[test]
    fn test_request_keeps_malformed_records_for_later() {
        let req = ImportRequest::from_json(
            r#"{"nodes": [{"id": "a"}, 7], "links": [], "domain": "d", "dry_run": true}"#,
        )
        .unwrap();
        assert_eq!(req.nodes.len(), 2);
        assert_eq!(req.domain, "d");
        assert!(req.dry_run);
    }

    #[test]
    fn test_fragment_round_trips_into_request() {
        let entity = Entity::new("a", "A", "d");
        let fragment = GraphFragment::from_graph(vec![entity], Vec::new());
        let req = fragment.into_request().unwrap();
        assert_eq!(
            NodeRecord::from_value(&req.nodes[0]).unwrap(),
            NodeRecord::new("a", "A")
        );
    }
}
