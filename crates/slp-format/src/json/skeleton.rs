//! Skeleton decoder (spec §4.2): node/edge/symmetry reconstruction from
//! the top-level metadata JSON, including the pickle-style edge-type
//! encoding described in spec §4.2 and §9.

use crate::error::{Result, SlpError};
use crate::model::skeleton::{Edge, Node, Skeleton, Symmetry};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// typeId assigned to a symmetry link; anything else is an edge.
const SYMMETRY_TYPE_ID: u64 = 2;
/// Default typeId for shapes this decoder doesn't recognize, or for a
/// `py/id` forward reference that hasn't been assigned yet (spec §9:
/// "Reject unknown tag shapes by defaulting to 'edge' ... for forward
/// compatibility"; the source doesn't guard against forward references
/// either, so a dangling `py/id` degrades to "edge" rather than erroring).
const DEFAULT_TYPE_ID: u64 = 1;

/// Sequential id counter for the pickle-style `{py/reduce|py/tuple|py/id}`
/// encoding of an edge's `type` field. One instance is shared across every
/// link within a single skeleton entry, matching the traversal-order
/// numbering the producer used when it serialized the skeleton.
#[derive(Default)]
struct PickleState {
    next_id: u64,
    assigned: HashMap<u64, u64>,
}

impl PickleState {
    fn new() -> Self {
        Self {
            next_id: 1,
            assigned: HashMap::new(),
        }
    }

    fn resolve_type(&mut self, v: &Value) -> u64 {
        let Some(obj) = v.as_object() else {
            return DEFAULT_TYPE_ID;
        };

        if let Some(reduce) = obj.get("py/reduce") {
            let type_id = extract_tuple_type_id(reduce).unwrap_or(DEFAULT_TYPE_ID);
            let id = self.next_id;
            self.next_id += 1;
            self.assigned.insert(id, type_id);
            return type_id;
        }

        if let Some(tuple) = obj.get("py/tuple") {
            let type_id = first_number(tuple).unwrap_or(DEFAULT_TYPE_ID);
            let id = self.next_id;
            self.next_id += 1;
            self.assigned.insert(id, type_id);
            return type_id;
        }

        if let Some(id_ref) = obj.get("py/id").and_then(Value::as_u64) {
            return self.assigned.get(&id_ref).copied().unwrap_or(DEFAULT_TYPE_ID);
        }

        DEFAULT_TYPE_ID
    }
}

/// Searches a `py/reduce` array (whatever shape its other elements take)
/// for the nested `{"py/tuple": [typeId, ...]}` that carries the actual id.
fn extract_tuple_type_id(reduce: &Value) -> Option<u64> {
    let arr = reduce.as_array()?;
    for el in arr {
        if let Some(tuple) = el.get("py/tuple") {
            if let Some(id) = first_number(tuple) {
                return Some(id);
            }
        }
    }
    None
}

fn first_number(v: &Value) -> Option<u64> {
    v.as_array()?.first()?.as_u64()
}

/// Resolves a node reference (source/target/skeleton-node-list entry) to
/// a producer-local global node id.
fn node_ref_id(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::Object(map) => map
            .get("id")
            .and_then(Value::as_u64)
            .or_else(|| map.get("py/id").and_then(Value::as_u64)),
        _ => None,
    }
}

fn global_node_name(nodes: &[Value], id: u64) -> Option<String> {
    let entry = nodes.get(id as usize)?;
    match entry {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Decodes every skeleton entry from the top-level metadata JSON
/// (`metadata.json` -> `{"nodes": [...], "skeletons": [...]}`).
pub fn decode_skeletons(metadata: &Value) -> Result<Vec<Skeleton>> {
    let global_nodes = metadata
        .get("nodes")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let entries = metadata
        .get("skeletons")
        .and_then(Value::as_array)
        .ok_or_else(|| SlpError::InvalidSlp("metadata.json missing 'skeletons'".into()))?;

    entries.iter().map(|e| decode_one(e, &global_nodes)).collect()
}

fn decode_one(entry: &Value, global_nodes: &[Value]) -> Result<Skeleton> {
    let node_refs = entry
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or_else(|| SlpError::InvalidSlp("skeleton entry missing 'nodes'".into()))?;

    let mut producer_to_pos = HashMap::new();
    let mut nodes = Vec::with_capacity(node_refs.len());
    for (pos, node_ref) in node_refs.iter().enumerate() {
        let producer_id = node_ref_id(node_ref)
            .ok_or_else(|| SlpError::InvalidSlp("unrecognized skeleton node reference shape".into()))?;
        let name = global_node_name(global_nodes, producer_id)
            .ok_or_else(|| SlpError::InvalidSlp(format!("no global node for id {producer_id}")))?;
        producer_to_pos.insert(producer_id, pos);
        nodes.push(Node { name });
    }

    let mut edges = Vec::new();
    let mut symmetries = Vec::new();
    let mut seen_symmetries: HashSet<(usize, usize)> = HashSet::new();
    let mut pickle = PickleState::new();

    if let Some(links) = entry.get("links").and_then(Value::as_array) {
        for link in links {
            let source_id = link.get("source").and_then(node_ref_id);
            let target_id = link.get("target").and_then(node_ref_id);
            let (Some(source_id), Some(target_id)) = (source_id, target_id) else {
                continue;
            };
            let (Some(&source), Some(&target)) =
                (producer_to_pos.get(&source_id), producer_to_pos.get(&target_id))
            else {
                continue;
            };

            let type_id = link
                .get("type")
                .map(|t| pickle.resolve_type(t))
                .unwrap_or(DEFAULT_TYPE_ID);

            if type_id == SYMMETRY_TYPE_ID {
                let sym = Symmetry { a: source, b: target };
                if seen_symmetries.insert(sym.key()) {
                    symmetries.push(sym);
                }
            } else {
                edges.push(Edge { source, target });
            }
        }
    }

    let name = entry
        .get("graph")
        .and_then(|g| g.get("name"))
        .and_then(Value::as_str)
        .or_else(|| entry.get("name").and_then(Value::as_str))
        .map(str::to_string);

    Ok(Skeleton::new(name, nodes, edges, symmetries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_minimal_skeleton_with_one_edge() {
        let metadata = json!({
            "nodes": [{"name": "A"}, {"name": "B"}],
            "skeletons": [{
                "graph": {"name": "animal"},
                "nodes": [0, 1],
                "links": [
                    {"source": 0, "target": 1, "type": {"py/tuple": [1]}},
                ],
            }],
        });

        let skeletons = decode_skeletons(&metadata).unwrap();
        assert_eq!(skeletons.len(), 1);
        assert_eq!(skeletons[0].node_names(), vec!["A", "B"]);
        assert_eq!(skeletons[0].edges().len(), 1);
        assert_eq!(skeletons[0].name.as_deref(), Some("animal"));
    }

    #[test]
    fn symmetry_type_id_two_deduplicates_unordered_pairs() {
        let metadata = json!({
            "nodes": [{"name": "L"}, {"name": "R"}],
            "skeletons": [{
                "name": "sym",
                "nodes": [0, 1],
                "links": [
                    {"source": 0, "target": 1, "type": {"py/tuple": [2]}},
                    {"source": 1, "target": 0, "type": {"py/tuple": [2]}},
                ],
            }],
        });

        let skeletons = decode_skeletons(&metadata).unwrap();
        assert_eq!(skeletons[0].symmetries().len(), 1);
        assert!(skeletons[0].edges().is_empty());
    }

    #[test]
    fn py_id_back_reference_resolves_previously_assigned_type() {
        let metadata = json!({
            "nodes": [{"name": "A"}, {"name": "B"}, {"name": "C"}],
            "skeletons": [{
                "name": "s",
                "nodes": [0, 1, 2],
                "links": [
                    {"source": 0, "target": 1, "type": {"py/reduce": [{}, {"py/tuple": [2]}]}},
                    {"source": 1, "target": 2, "type": {"py/id": 1}},
                ],
            }],
        });

        let skeletons = decode_skeletons(&metadata).unwrap();
        // Both links resolve to typeId 2 (symmetry): the first assigns id 1,
        // the second's py/id: 1 looks it back up.
        assert_eq!(skeletons[0].symmetries().len(), 2);
    }

    #[test]
    fn unrecognized_type_shape_defaults_to_edge() {
        let metadata = json!({
            "nodes": [{"name": "A"}, {"name": "B"}],
            "skeletons": [{
                "name": "s",
                "nodes": [0, 1],
                "links": [{"source": 0, "target": 1, "type": {"unexpected": true}}],
            }],
        });

        let skeletons = decode_skeletons(&metadata).unwrap();
        assert_eq!(skeletons[0].edges().len(), 1);
        assert!(skeletons[0].symmetries().is_empty());
    }
}
