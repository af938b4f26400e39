use super::refs::ReferenceExtractor;
use crate::tree::{ActivityKind, Constant, PipelineTree, SourceType};
use ahash::AHashSet;
use indexmap::IndexMap;
use serde_json::{Value, json};
use std::mem;

/// Builds the flat map of every value in the tree that may reference a variable.
///
/// Keys are `{node id}_{field}`: component data fields of service activities, the
/// shown constants of subprocesses, and the condition expressions of exclusive and
/// conditional parallel gateways.
pub fn reference_namespace(tree: &PipelineTree) -> IndexMap<String, Value> {
    let mut namespace = IndexMap::new();

    for activity in tree.activities() {
        match activity.kind {
            ActivityKind::ServiceActivity => {
                if let Some(component) = &activity.component {
                    for (field, value) in &component.data {
                        namespace.insert(format!("{}_{}", activity.id, field), value.clone());
                    }
                }
            }
            ActivityKind::SubProcess => {
                for (key, value) in activity.constants.iter().flatten() {
                    if value.get("show_type").and_then(Value::as_str) == Some("show") {
                        namespace.insert(format!("{}_{}", activity.id, key), value.clone());
                    }
                }
            }
        }
    }

    for gateway in tree.gateways().filter(|g| g.kind.is_conditional()) {
        for (flow_id, condition) in gateway.conditions.iter().flatten() {
            namespace.insert(
                format!("{}_{}", gateway.id, flow_id),
                json!({ "value": condition.evaluate }),
            );
        }
    }

    namespace
}

/// Keys of every constant reachable from the tree, directly or through other constants.
pub fn referenced_constants(
    tree: &PipelineTree,
    extractor: &dyn ReferenceExtractor,
) -> AHashSet<String> {
    let mut retained = AHashSet::new();
    let mut pending: Vec<Value> = reference_namespace(tree).into_values().collect();

    while let Some(value) = pending.pop() {
        for key in extractor.extract_refs(&value) {
            let Some(constant) = tree.constants.get(&key) else {
                continue;
            };
            if retained.insert(key) {
                pending.push(constant.value.clone());
            }
        }
    }

    retained
}

/// Drops the constants nothing in the tree refers to any more.
///
/// `component_outputs` constants always stay. Survivors are renumbered in their original
/// declaration order and lose any `source_info` entry pointing at an excluded node.
/// When `remove_outputs_without_refs` is false, custom constants that were declared as
/// outputs are kept even if unreferenced.
///
/// Returns the constants that were removed, keyed as before.
pub fn prune_constants(
    tree: &mut PipelineTree,
    excluded_ids: &[String],
    remove_outputs_without_refs: bool,
    extractor: &dyn ReferenceExtractor,
) -> IndexMap<String, Constant> {
    let mut retained = referenced_constants(tree, extractor);
    retained.extend(
        tree.constants
            .iter()
            .filter(|(_, c)| c.source_type == SourceType::ComponentOutputs)
            .map(|(key, _)| key.clone()),
    );

    let original_outputs = mem::take(&mut tree.outputs);
    tree.outputs = original_outputs
        .iter()
        .filter(|key| retained.contains(*key))
        .cloned()
        .collect();

    let mut remaining = mem::take(&mut tree.constants);
    let mut kept_keys: Vec<String> = remaining
        .keys()
        .filter(|key| retained.contains(*key))
        .cloned()
        .collect();
    kept_keys.sort_by_key(|key| remaining.get(key).map(|c| c.index));

    let mut kept = IndexMap::with_capacity(kept_keys.len());
    for (position, key) in kept_keys.into_iter().enumerate() {
        if let Some(mut constant) = remaining.shift_remove(&key) {
            constant.index = position as i64;
            if let Some(source_info) = constant.source_info.as_mut() {
                for id in excluded_ids {
                    source_info.shift_remove(id);
                }
            }
            kept.insert(key, constant);
        }
    }

    if !remove_outputs_without_refs {
        let readmit: Vec<String> = remaining
            .iter()
            .filter(|(key, c)| {
                c.source_type == SourceType::Custom && original_outputs.contains(*key)
            })
            .map(|(key, _)| key.clone())
            .collect();
        for key in readmit {
            if let Some(constant) = remaining.shift_remove(&key) {
                tree.outputs.push(key.clone());
                kept.insert(key, constant);
            }
        }
    }

    tree.constants = kept;
    remaining
}
