//! Pre-import fragment checks
//!
//! `validate_fragment` inspects a `{nodes, links}` document without touching
//! storage. Errors cover structure, field types, duplicate node ids and
//! dangling link endpoints; oversized ids or names, self-loops and repeated
//! links are only warnings.
//!
//! This is a structural check, not a dry run. An import additionally rejects
//! empty `id`/`name` strings and self-loop links, so a fragment can pass
//! validation and still produce per-record errors. Use `dry_run` on the
//! import itself for the exact outcome.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Node ids longer than this many characters draw a warning
pub const MAX_ID_CHARS: usize = 100;

/// Node names longer than this many characters draw a warning
pub const MAX_NAME_CHARS: usize = 200;

/// Per-collection counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStats {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub nodes: RecordStats,
    pub links: RecordStats,
}

/// Outcome of validating one fragment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: ValidationStats,
}

impl ValidationReport {
    /// A fragment is valid when nothing was reported as an error
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a `{nodes, links}` document
pub fn validate_fragment(data: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    let Value::Object(map) = data else {
        report.errors.push("data must be a JSON object".to_string());
        return report;
    };
    let (Some(nodes), Some(links)) = (map.get("nodes"), map.get("links")) else {
        report
            .errors
            .push("data must contain both 'nodes' and 'links'".to_string());
        return report;
    };
    let (Value::Array(nodes), Value::Array(links)) = (nodes, links) else {
        report
            .errors
            .push("'nodes' and 'links' must be arrays".to_string());
        return report;
    };

    let node_ids = validate_nodes(nodes, &mut report);
    validate_links(links, &node_ids, &mut report);
    report
}

/// Required string field; `Err` carries the message for the error list
fn required_str<'a>(
    record: &'a Map<String, Value>,
    field: &str,
    label: &str,
) -> Result<&'a str, String> {
    match record.get(field) {
        None => Err(format!("{} is missing '{}'", label, field)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(format!("{} field '{}' must be a string", label, field)),
    }
}

fn optional_str(record: &Map<String, Value>, field: &str, label: &str) -> Result<(), String> {
    match record.get(field) {
        Some(v) if !v.is_string() => Err(format!("{} field '{}' must be a string", label, field)),
        _ => Ok(()),
    }
}

fn validate_nodes<'a>(nodes: &'a [Value], report: &mut ValidationReport) -> HashSet<&'a str> {
    let mut node_ids = HashSet::new();
    report.stats.nodes.total = nodes.len();

    for (i, node) in nodes.iter().enumerate() {
        match check_node(i, node, &node_ids, report) {
            Ok(id) => {
                node_ids.insert(id);
                report.stats.nodes.valid += 1;
            }
            Err(message) => {
                report.errors.push(message);
                report.stats.nodes.invalid += 1;
            }
        }
    }
    node_ids
}

fn check_node<'a>(
    index: usize,
    node: &'a Value,
    seen: &HashSet<&str>,
    report: &mut ValidationReport,
) -> Result<&'a str, String> {
    let label = format!("node {}", index);
    let Value::Object(record) = node else {
        return Err(format!("{} must be an object", label));
    };

    let id = required_str(record, "id", &label)?;
    let name = required_str(record, "name", &label)?;

    if seen.contains(id) {
        return Err(format!("duplicate node id: {}", id));
    }

    let id_chars = id.chars().count();
    if id_chars > MAX_ID_CHARS {
        report
            .warnings
            .push(format!("node id is long: {} ({} characters)", id, id_chars));
    }
    let name_chars = name.chars().count();
    if name_chars > MAX_NAME_CHARS {
        report
            .warnings
            .push(format!("node name is long: {} ({} characters)", name, name_chars));
    }

    optional_str(record, "type", &label)?;
    optional_str(record, "description", &label)?;
    Ok(id)
}

fn validate_links(links: &[Value], node_ids: &HashSet<&str>, report: &mut ValidationReport) {
    let mut seen_links = HashSet::new();
    report.stats.links.total = links.len();

    for (i, link) in links.iter().enumerate() {
        match check_link(i, link, node_ids, &mut seen_links, report) {
            Ok(()) => report.stats.links.valid += 1,
            Err(message) => {
                report.errors.push(message);
                report.stats.links.invalid += 1;
            }
        }
    }
}

fn check_link<'a>(
    index: usize,
    link: &'a Value,
    node_ids: &HashSet<&str>,
    seen_links: &mut HashSet<(&'a str, &'a str, &'a str)>,
    report: &mut ValidationReport,
) -> Result<(), String> {
    let label = format!("link {}", index);
    let Value::Object(record) = link else {
        return Err(format!("{} must be an object", label));
    };

    let source = required_str(record, "source", &label)?;
    let target = required_str(record, "target", &label)?;
    let rel_type = required_str(record, "type", &label)?;

    if !node_ids.contains(source) {
        return Err(format!("{} source node does not exist: {}", label, source));
    }
    if !node_ids.contains(target) {
        return Err(format!("{} target node does not exist: {}", label, target));
    }

    if source == target {
        report
            .warnings
            .push(format!("{} is a self-loop: {} -> {}", label, source, target));
    }
    if !seen_links.insert((source, target, rel_type)) {
        report.warnings.push(format!(
            "duplicate link: {} -[{}]-> {}",
            source, rel_type, target
        ));
    }

    optional_str(record, "description", &label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_fragment() {
        let report = validate_fragment(&json!({
            "nodes": [
                {"id": "a", "name": "A", "type": "person"},
                {"id": "b", "name": "B", "description": "second"}
            ],
            "links": [{"source": "a", "target": "b", "type": "knows"}]
        }));

        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
        assert_eq!(report.stats.nodes.valid, 2);
        assert_eq!(report.stats.links.valid, 1);
    }

    #[test]
    fn test_structural_errors_have_no_stats() {
        for data in [
            json!([]),
            json!({"nodes": []}),
            json!({"nodes": {}, "links": []}),
        ] {
            let report = validate_fragment(&data);
            assert_eq!(report.errors.len(), 1);
            assert_eq!(report.stats, ValidationStats::default());
        }
    }

    #[test]
    fn test_node_errors() {
        let report = validate_fragment(&json!({
            "nodes": [
                {"id": "a", "name": "A"},
                {"id": "a", "name": "again"},
                {"name": "no id"},
                {"id": 7, "name": "numeric"},
                {"id": "b", "name": "B", "type": 3},
                "not an object"
            ],
            "links": []
        }));

        assert!(!report.is_valid());
        assert_eq!(report.errors.len(), 5);
        assert_eq!(report.stats.nodes.total, 6);
        assert_eq!(report.stats.nodes.valid, 1);
        assert_eq!(report.stats.nodes.invalid, 5);
        assert!(report.errors.iter().any(|e| e.contains("duplicate node id: a")));
    }

    #[test]
    fn test_long_id_and_name_are_warnings() {
        let long_id = "x".repeat(MAX_ID_CHARS + 1);
        let long_name = "名".repeat(MAX_NAME_CHARS + 1);
        let report = validate_fragment(&json!({
            "nodes": [{"id": long_id, "name": long_name}],
            "links": []
        }));

        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 2);

        // exactly at the limit, counted in characters
        let report = validate_fragment(&json!({
            "nodes": [{"id": "i", "name": "名".repeat(MAX_NAME_CHARS)}],
            "links": []
        }));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_link_checks() {
        let report = validate_fragment(&json!({
            "nodes": [{"id": "a", "name": "A"}, {"id": "b", "name": "B"}],
            "links": [
                {"source": "a", "target": "b", "type": "t"},
                {"source": "a", "target": "b", "type": "t"},
                {"source": "a", "target": "a", "type": "t"},
                {"source": "a", "target": "zz", "type": "t"},
                {"source": "a", "target": "b"},
                {"source": "a", "target": "b", "type": "u", "description": 1}
            ]
        }));

        assert_eq!(report.stats.links.valid, 3);
        assert_eq!(report.stats.links.invalid, 3);
        assert_eq!(report.errors.len(), 3);
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings.iter().any(|w| w.contains("self-loop")));
        assert!(report.warnings.iter().any(|w| w.contains("duplicate link")));
    }

    #[test]
    fn test_links_to_invalid_nodes_are_errors() {
        let report = validate_fragment(&json!({
            "nodes": [{"id": "a", "name": "A"}, {"id": "b"}],
            "links": [{"source": "a", "target": "b", "type": "t"}]
        }));
        assert_eq!(report.stats.links.invalid, 1);
        assert!(report.errors.iter().any(|e| e.contains("target node does not exist: b")));
    }

    #[test]
    fn test_empty_strings_and_self_loops_are_not_errors() {
        let report = validate_fragment(&json!({
            "nodes": [{"id": "", "name": ""}, {"id": "a", "name": "A"}],
            "links": [{"source": "a", "target": "a", "type": "t"}]
        }));
        assert!(report.is_valid());
        assert_eq!(report.stats.nodes.valid, 2);
        assert_eq!(report.warnings.len(), 1);
    }
}
