//! Foreign workflow import.
//!
//! [`convert`] translates an externally authored workflow export into the
//! internal graph model and surfaces everything the caller must ask the user
//! about before the workflow can run. The conversion is a single-pass, pure
//! function: identical input and credential table always yield an identical
//! result, modulo freshly generated connection identifiers (opaque to
//! callers).
//!
//! Only a structurally broken top-level document is fatal. Unknown node
//! types degrade to the catch-all kind with the original type preserved, and
//! connections with unresolvable endpoints are dropped and counted; a
//! partially convertible document is more useful than a rejection.

use crate::connection::Connection;
use crate::error::ImportError;
use crate::foreign::{ForeignNode, ForeignWorkflow};
use crate::mapping;
use crate::node::{Node, NodeId, NodeKind, ORIGINAL_TYPE_KEY};
use regex::Regex;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

/// `{{ $env.NAME }}` placeholder: templating delimiters around the fixed
/// `$env.` accessor prefix and a variable identifier.
static ENV_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*\$env\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}")
        .expect("env placeholder pattern is valid")
});

/// The outcome of a foreign workflow conversion.
///
/// All fields are freshly constructed per call; nothing references back into
/// the input document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportResult {
    /// One internal node per foreign node, in document order.
    pub nodes: Vec<Node>,
    /// Converted connections; entries with unresolvable endpoints are absent.
    pub connections: Vec<Connection>,
    /// Credential references not present in the available set:
    /// service name -> unresolved reference id (first occurrence wins).
    pub missing_credentials: BTreeMap<String, String>,
    /// Environment-variable placeholders found in parameter values:
    /// variable name -> placeholder text as it appears in the document.
    pub missing_env_vars: BTreeMap<String, String>,
}

impl ImportResult {
    /// Whether the caller must collect configuration before the workflow is
    /// usable.
    #[must_use]
    pub fn needs_configuration(&self) -> bool {
        !self.missing_credentials.is_empty() || !self.missing_env_vars.is_empty()
    }
}

/// Converts a parsed foreign workflow document into the internal graph model.
///
/// `document` must already be valid JSON; parsing and syntax errors are the
/// caller's responsibility. `available_credentials` is the full set of
/// locally known credential reference ids.
///
/// # Errors
///
/// Returns [`ImportError::MalformedInput`] only for top-level shape problems
/// (a missing or non-sequence `nodes` field). Per-node and per-connection
/// anomalies are absorbed into the result.
pub fn convert(
    document: &JsonValue,
    available_credentials: &HashSet<String>,
) -> Result<ImportResult, ImportError> {
    let foreign = ForeignWorkflow::from_value(document)?;

    let ids = assign_node_ids(&foreign.nodes);

    // Name->id index for connection resolution. First occurrence wins when
    // two nodes share a display name.
    let mut name_index: HashMap<&str, &NodeId> = HashMap::new();
    let mut known_ids: HashSet<&NodeId> = HashSet::new();
    for (node, id) in foreign.nodes.iter().zip(&ids) {
        if let Some(name) = node.name.as_deref() {
            name_index.entry(name).or_insert(id);
        }
        known_ids.insert(id);
    }

    let nodes: Vec<Node> = foreign
        .nodes
        .iter()
        .zip(&ids)
        .map(|(node, id)| convert_node(node, id.clone()))
        .collect();

    let mut connections = Vec::new();
    let mut dropped = 0usize;
    for entry in foreign.connection_entries() {
        let Some(source) = resolve_endpoint(&entry.source_key, &name_index, &known_ids) else {
            dropped += 1;
            tracing::warn!(
                source = %entry.source_key,
                "dropping connection with unresolvable source"
            );
            continue;
        };
        let Some(target) = resolve_endpoint(&entry.target.node, &name_index, &known_ids) else {
            dropped += 1;
            tracing::warn!(
                target = %entry.target.node,
                "dropping connection with unresolvable target"
            );
            continue;
        };

        let (source_port, target_port) = mapping::ports_for(&entry.output_kind);
        connections.push(Connection::new(
            source.clone(),
            target.clone(),
            source_port,
            target_port,
        ));
    }
    if dropped > 0 {
        tracing::warn!(dropped, "some connections were dropped during import");
    }

    // Missing-configuration detection runs over the original foreign nodes
    // so parameter renames cannot hide anything.
    let missing_credentials =
        detect_missing_credentials(&foreign.nodes, available_credentials);
    let missing_env_vars = detect_env_placeholders(&foreign.nodes);

    Ok(ImportResult {
        nodes,
        connections,
        missing_credentials,
        missing_env_vars,
    })
}

/// Assigns internal identifiers to foreign nodes in document order.
///
/// A node keeps its foreign id when present; otherwise its name, then its
/// document position (`node_{i}`). Collisions are resolved deterministically
/// by appending `_2`, `_3`, ... until the id is unused.
fn assign_node_ids(nodes: &[ForeignNode]) -> Vec<NodeId> {
    let mut used: HashSet<String> = HashSet::new();
    nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let base = node
                .id
                .clone()
                .filter(|id| !id.is_empty())
                .or_else(|| node.name.clone().filter(|name| !name.is_empty()))
                .unwrap_or_else(|| format!("node_{index}"));

            let mut candidate = base.clone();
            let mut suffix = 1u32;
            while !used.insert(candidate.clone()) {
                suffix += 1;
                candidate = format!("{base}_{suffix}");
            }
            NodeId::new(candidate)
        })
        .collect()
}

/// Converts a single foreign node. Never fails: unmapped types become the
/// catch-all kind with the original type string preserved in the config.
fn convert_node(foreign: &ForeignNode, id: NodeId) -> Node {
    let segment = mapping::terminal_segment(&foreign.node_type);
    let kind = mapping::node_kind_for(segment).unwrap_or_else(|| {
        tracing::debug!(
            node_type = %foreign.node_type,
            "no internal mapping for foreign node type, importing as custom"
        );
        NodeKind::Custom
    });

    let mut config: BTreeMap<String, JsonValue> = foreign
        .parameters
        .iter()
        .map(|(key, value)| (mapping::config_key_for(key).to_string(), value.clone()))
        .collect();
    if kind == NodeKind::Custom && !foreign.node_type.is_empty() {
        config.insert(
            ORIGINAL_TYPE_KEY.to_string(),
            JsonValue::String(foreign.node_type.clone()),
        );
    }

    let title = foreign
        .name
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| kind.label().to_string());
    let configured = Node::config_satisfies(kind, &config);

    Node {
        id,
        kind,
        position: foreign.position.into(),
        title,
        subtitle: (!segment.is_empty()).then(|| segment.to_string()),
        config,
        configured,
    }
}

/// Resolves a connection endpoint: the name index first, then the key taken
/// directly as an id.
fn resolve_endpoint<'a>(
    key: &str,
    name_index: &HashMap<&str, &'a NodeId>,
    known_ids: &HashSet<&'a NodeId>,
) -> Option<&'a NodeId> {
    name_index
        .get(key)
        .copied()
        .or_else(|| known_ids.get(&NodeId::new(key)).copied())
}

/// Collects credential references absent from the available set, keyed by
/// service name. First occurrence wins for duplicated services.
fn detect_missing_credentials(
    nodes: &[ForeignNode],
    available: &HashSet<String>,
) -> BTreeMap<String, String> {
    let mut missing = BTreeMap::new();
    for node in nodes {
        for (service, reference) in &node.credentials {
            let reference_id = reference.reference_id();
            if !available.contains(reference_id) {
                missing
                    .entry(service.clone())
                    .or_insert_with(|| reference_id.to_string());
            }
        }
    }
    missing
}

/// Scans every string parameter value, recursively through nested objects and
/// arrays, for `{{ $env.NAME }}` placeholders.
fn detect_env_placeholders(nodes: &[ForeignNode]) -> BTreeMap<String, String> {
    let mut found = BTreeMap::new();
    for node in nodes {
        for value in node.parameters.values() {
            scan_value(value, &mut found);
        }
    }
    found
}

fn scan_value(value: &JsonValue, found: &mut BTreeMap<String, String>) {
    match value {
        JsonValue::String(text) => {
            for capture in ENV_PLACEHOLDER.captures_iter(text) {
                found
                    .entry(capture[1].to_string())
                    .or_insert_with(|| capture[0].to_string());
            }
        }
        JsonValue::Array(items) => {
            for item in items {
                scan_value(item, found);
            }
        }
        JsonValue::Object(map) => {
            for item in map.values() {
                scan_value(item, found);
            }
        }
        JsonValue::Null | JsonValue::Bool(_) | JsonValue::Number(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_credentials() -> HashSet<String> {
        HashSet::new()
    }

    fn credentials(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| (*id).to_string()).collect()
    }

    #[test]
    fn webhook_scenario() {
        let doc = json!({
            "nodes": [{
                "id": "1",
                "type": "n8n-nodes-base.webhook",
                "position": { "x": 0, "y": 0 },
                "parameters": {}
            }],
            "connections": {}
        });

        let result = convert(&doc, &no_credentials()).expect("valid import");
        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.nodes[0].id.as_str(), "1");
        assert_eq!(result.nodes[0].kind, NodeKind::Webhook);
        assert!(result.connections.is_empty());
        assert!(result.missing_credentials.is_empty());
        assert!(result.missing_env_vars.is_empty());
    }

    #[test]
    fn empty_document_is_malformed() {
        let err = convert(&json!({}), &no_credentials()).unwrap_err();
        assert!(matches!(err, ImportError::MalformedInput { .. }));
    }

    #[test]
    fn empty_connections_yield_no_connections() {
        let doc = json!({
            "nodes": [
                { "id": "a", "type": "n8n-nodes-base.httpRequest", "parameters": {} },
                { "id": "b", "type": "n8n-nodes-base.code", "parameters": {} }
            ],
            "connections": {}
        });

        let result = convert(&doc, &no_credentials()).expect("valid import");
        assert_eq!(result.nodes.len(), 2);
        assert!(result.connections.is_empty());
    }

    #[test]
    fn unknown_type_becomes_custom_with_original_type() {
        let doc = json!({
            "nodes": [{
                "id": "s1",
                "type": "n8n-nodes-base.spreadsheetFile",
                "parameters": { "operation": "read" }
            }],
            "connections": {}
        });

        let result = convert(&doc, &no_credentials()).expect("valid import");
        let node = &result.nodes[0];
        assert_eq!(node.kind, NodeKind::Custom);
        assert_eq!(
            node.config.get(ORIGINAL_TYPE_KEY),
            Some(&json!("n8n-nodes-base.spreadsheetFile"))
        );
        assert_eq!(node.config.get("operation"), Some(&json!("read")));
    }

    #[test]
    fn no_foreign_node_is_ever_dropped() {
        let doc = json!({
            "nodes": [
                { "type": "n8n-nodes-base.webhook" },
                { "type": "" },
                { "type": "something.unheard.of" }
            ],
            "connections": {}
        });

        let result = convert(&doc, &no_credentials()).expect("valid import");
        assert_eq!(result.nodes.len(), 3);
    }

    #[test]
    fn broken_node_elements_degrade_instead_of_aborting() {
        let doc = json!({
            "nodes": [
                { "id": "w1", "type": "n8n-nodes-base.webhook" },
                42,
                { "id": "p1", "type": "n8n-nodes-base.code", "position": null }
            ],
            "connections": {}
        });

        let result = convert(&doc, &no_credentials()).expect("valid import");
        assert_eq!(result.nodes.len(), 3);
        assert_eq!(result.nodes[0].kind, NodeKind::Webhook);
        assert_eq!(result.nodes[1].kind, NodeKind::Custom);
        assert_eq!(result.nodes[1].id.as_str(), "node_1");
        assert_eq!(result.nodes[2].kind, NodeKind::Code);
        assert_eq!(result.nodes[2].position, crate::node::Position::default());
    }

    #[test]
    fn connections_resolve_by_name_with_mapped_ports() {
        let doc = json!({
            "nodes": [
                { "id": "1", "name": "Webhook", "type": "n8n-nodes-base.webhook" },
                { "id": "2", "name": "Fetch", "type": "n8n-nodes-base.httpRequest" },
                { "id": "3", "name": "Agent", "type": "@n8n/n8n-nodes-langchain.agent" },
                { "id": "4", "name": "Search", "type": "@n8n/n8n-nodes-langchain.toolHttpRequest" }
            ],
            "connections": {
                "Webhook": { "main": [[{ "node": "Fetch", "type": "main", "index": 0 }]] },
                "Search": { "ai_tool": [[{ "node": "Agent", "type": "ai_tool", "index": 0 }]] }
            }
        });

        let result = convert(&doc, &no_credentials()).expect("valid import");
        assert_eq!(result.connections.len(), 2);

        let main = result
            .connections
            .iter()
            .find(|c| c.source.as_str() == "1")
            .expect("main connection");
        assert_eq!(main.target.as_str(), "2");
        assert_eq!(main.source_port, "output");
        assert_eq!(main.target_port, "input");

        let tool = result
            .connections
            .iter()
            .find(|c| c.source.as_str() == "4")
            .expect("tool connection");
        assert_eq!(tool.target.as_str(), "3");
        assert_eq!(tool.source_port, "tool");
        assert_eq!(tool.target_port, "input");
    }

    #[test]
    fn connection_source_key_falls_back_to_id() {
        let doc = json!({
            "nodes": [
                { "id": "a", "type": "n8n-nodes-base.webhook" },
                { "id": "b", "type": "n8n-nodes-base.code" }
            ],
            "connections": {
                "a": { "main": [[{ "node": "b", "type": "main", "index": 0 }]] }
            }
        });

        let result = convert(&doc, &no_credentials()).expect("valid import");
        assert_eq!(result.connections.len(), 1);
        assert_eq!(result.connections[0].source.as_str(), "a");
        assert_eq!(result.connections[0].target.as_str(), "b");
    }

    #[test]
    fn unresolvable_target_drops_only_that_connection() {
        let doc = json!({
            "nodes": [
                { "id": "1", "name": "Webhook", "type": "n8n-nodes-base.webhook" },
                { "id": "2", "name": "Fetch", "type": "n8n-nodes-base.httpRequest" }
            ],
            "connections": {
                "Webhook": { "main": [[
                    { "node": "Fetch", "type": "main", "index": 0 },
                    { "node": "Deleted Node", "type": "main", "index": 0 }
                ]] }
            }
        });

        let result = convert(&doc, &no_credentials()).expect("valid import");
        assert_eq!(result.nodes.len(), 2);
        assert_eq!(result.connections.len(), 1);
        assert_eq!(result.connections[0].target.as_str(), "2");
    }

    #[test]
    fn every_connection_endpoint_exists_in_node_list() {
        let doc = json!({
            "nodes": [
                { "id": "1", "name": "Webhook", "type": "n8n-nodes-base.webhook" },
                { "id": "2", "name": "Code", "type": "n8n-nodes-base.code" }
            ],
            "connections": {
                "Webhook": { "main": [[{ "node": "Code", "index": 0 }]] },
                "Ghost": { "main": [[{ "node": "Code", "index": 0 }]] }
            }
        });

        let result = convert(&doc, &no_credentials()).expect("valid import");
        let ids: HashSet<&str> = result.nodes.iter().map(|n| n.id.as_str()).collect();
        for conn in &result.connections {
            assert!(ids.contains(conn.source.as_str()));
            assert!(ids.contains(conn.target.as_str()));
        }
        assert_eq!(result.connections.len(), 1);
    }

    #[test]
    fn duplicate_node_ids_are_suffixed_in_document_order() {
        let doc = json!({
            "nodes": [
                { "id": "a", "type": "n8n-nodes-base.webhook" },
                { "id": "a", "type": "n8n-nodes-base.code" },
                { "id": "a", "type": "n8n-nodes-base.code" }
            ],
            "connections": {}
        });

        let result = convert(&doc, &no_credentials()).expect("valid import");
        let ids: Vec<&str> = result.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a_2", "a_3"]);
    }

    #[test]
    fn suffixed_id_never_collides_with_a_literal_one() {
        let doc = json!({
            "nodes": [
                { "id": "a", "type": "n8n-nodes-base.webhook" },
                { "id": "a_2", "type": "n8n-nodes-base.code" },
                { "id": "a", "type": "n8n-nodes-base.code" }
            ],
            "connections": {}
        });

        let result = convert(&doc, &no_credentials()).expect("valid import");
        let ids: Vec<&str> = result.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a_2", "a_3"]);
    }

    #[test]
    fn missing_id_falls_back_to_name_then_position() {
        let doc = json!({
            "nodes": [
                { "name": "Fetch", "type": "n8n-nodes-base.httpRequest" },
                { "type": "n8n-nodes-base.code" }
            ],
            "connections": {}
        });

        let result = convert(&doc, &no_credentials()).expect("valid import");
        assert_eq!(result.nodes[0].id.as_str(), "Fetch");
        assert_eq!(result.nodes[1].id.as_str(), "node_1");
    }

    #[test]
    fn parameters_copy_with_renames() {
        let doc = json!({
            "nodes": [{
                "id": "c1",
                "type": "n8n-nodes-base.code",
                "parameters": { "jsCode": "return items;", "mode": "runOnceForAllItems" }
            }],
            "connections": {}
        });

        let result = convert(&doc, &no_credentials()).expect("valid import");
        let node = &result.nodes[0];
        assert_eq!(node.config.get("code"), Some(&json!("return items;")));
        assert_eq!(node.config.get("mode"), Some(&json!("runOnceForAllItems")));
        assert!(!node.config.contains_key("jsCode"));
        assert!(node.configured);
    }

    #[test]
    fn configured_flag_reflects_required_config() {
        let doc = json!({
            "nodes": [
                { "id": "1", "type": "n8n-nodes-base.httpRequest", "parameters": { "url": "https://api.example.com" } },
                { "id": "2", "type": "n8n-nodes-base.httpRequest", "parameters": {} },
                { "id": "3", "type": "@n8n/n8n-nodes-langchain.lmChatOpenAi", "parameters": { "model": "gpt-4o" } }
            ],
            "connections": {}
        });

        let result = convert(&doc, &no_credentials()).expect("valid import");
        assert!(result.nodes[0].configured);
        assert!(!result.nodes[1].configured);
        assert!(result.nodes[2].configured);
    }

    #[test]
    fn missing_credentials_detected_against_available_set() {
        let doc = json!({
            "nodes": [{
                "id": "1",
                "type": "@n8n/n8n-nodes-langchain.lmChatOpenAi",
                "parameters": {},
                "credentials": { "openAiApi": "cred_123" }
            }],
            "connections": {}
        });

        let result = convert(&doc, &credentials(&["cred_456"])).expect("valid import");
        assert_eq!(
            result.missing_credentials.get("openAiApi"),
            Some(&"cred_123".to_string())
        );

        let result = convert(&doc, &credentials(&["cred_123"])).expect("valid import");
        assert!(result.missing_credentials.is_empty());
    }

    #[test]
    fn first_credential_occurrence_wins() {
        let doc = json!({
            "nodes": [
                {
                    "id": "1",
                    "type": "n8n-nodes-base.slack",
                    "credentials": { "slackApi": "cred_a" }
                },
                {
                    "id": "2",
                    "type": "n8n-nodes-base.slack",
                    "credentials": { "slackApi": "cred_b" }
                }
            ],
            "connections": {}
        });

        let result = convert(&doc, &no_credentials()).expect("valid import");
        assert_eq!(
            result.missing_credentials.get("slackApi"),
            Some(&"cred_a".to_string())
        );
    }

    #[test]
    fn env_placeholder_detected_in_nested_parameters() {
        let doc = json!({
            "nodes": [{
                "id": "1",
                "type": "n8n-nodes-base.httpRequest",
                "parameters": {
                    "url": "https://api.example.com",
                    "headers": [
                        { "name": "Authorization", "value": "Bearer {{ $env.API_KEY }}" }
                    ],
                    "options": { "proxy": "{{$env.PROXY_URL}}" }
                }
            }],
            "connections": {}
        });

        let result = convert(&doc, &no_credentials()).expect("valid import");
        assert_eq!(
            result.missing_env_vars.get("API_KEY"),
            Some(&"{{ $env.API_KEY }}".to_string())
        );
        assert!(result.missing_env_vars.contains_key("PROXY_URL"));
    }

    #[test]
    fn no_env_placeholders_means_empty_manifest() {
        let doc = json!({
            "nodes": [{
                "id": "1",
                "type": "n8n-nodes-base.httpRequest",
                "parameters": { "url": "https://example.com/{{ $json.path }}" }
            }],
            "connections": {}
        });

        let result = convert(&doc, &no_credentials()).expect("valid import");
        assert!(result.missing_env_vars.is_empty());
    }

    #[test]
    fn conversion_is_deterministic_modulo_connection_ids() {
        let doc = json!({
            "nodes": [
                { "id": "1", "name": "Webhook", "type": "n8n-nodes-base.webhook" },
                {
                    "id": "2",
                    "name": "Fetch",
                    "type": "n8n-nodes-base.httpRequest",
                    "parameters": { "url": "{{ $env.BASE_URL }}/items" },
                    "credentials": { "httpBasicAuth": "cred_9" }
                }
            ],
            "connections": {
                "Webhook": { "main": [[{ "node": "Fetch", "index": 0 }]] }
            }
        });

        let available = no_credentials();
        let first = convert(&doc, &available).expect("valid import");
        let second = convert(&doc, &available).expect("valid import");

        assert_eq!(first.nodes, second.nodes);
        assert_eq!(first.missing_credentials, second.missing_credentials);
        assert_eq!(first.missing_env_vars, second.missing_env_vars);
        assert_eq!(first.connections.len(), second.connections.len());
        for (a, b) in first.connections.iter().zip(&second.connections) {
            assert_eq!(a.source, b.source);
            assert_eq!(a.target, b.target);
            assert_eq!(a.source_port, b.source_port);
            assert_eq!(a.target_port, b.target_port);
        }
    }

    #[test]
    fn needs_configuration_reflects_manifests() {
        let doc = json!({
            "nodes": [{ "id": "1", "type": "n8n-nodes-base.webhook" }],
            "connections": {}
        });

        let clean = convert(&doc, &no_credentials()).expect("valid import");
        assert!(!clean.needs_configuration());

        let doc = json!({
            "nodes": [{
                "id": "1",
                "type": "n8n-nodes-base.slack",
                "credentials": { "slackApi": "cred_1" }
            }],
            "connections": {}
        });
        let pending = convert(&doc, &no_credentials()).expect("valid import");
        assert!(pending.needs_configuration());
    }
}
