//! Tests for subprocess reference cycle detection against a template store.
mod common;
use common::*;
use pipeline_preview::prelude::*;
use pipeline_preview::store::{MemoryTemplateStore, TemplateRecord};
use serde_json::json;

fn template(id: &str, scope: Option<(&str, &str)>) -> TemplateRecord {
    TemplateRecord {
        id: id.to_string(),
        space_id: 1,
        scope_type: scope.map(|(t, _)| t.to_string()),
        scope_value: scope.map(|(_, v)| v.to_string()),
        is_deleted: false,
    }
}

/// Templates 1 -> 2 -> 3 -> 1 in project p1.
fn cyclic_store() -> MemoryTemplateStore {
    let scope = Some(("project", "p1"));
    MemoryTemplateStore::new()
        .with_template(template("1", scope))
        .with_template(template("2", scope))
        .with_template(template("3", scope))
        .with_reference("1", "2")
        .with_reference("2", "3")
        .with_reference("3", "1")
}

#[test]
fn test_cycle_back_to_current_template_is_reported() {
    let tree = subprocess_tree(json!(2));
    let report =
        is_circular_reference(&tree, Some("1"), 1, Some("project"), Some("p1"), &cyclic_store())
            .unwrap();

    assert!(report.has_cycle);
    assert_eq!(report.node_key.as_deref(), Some("sp"));
    assert_eq!(report.node_name.as_deref(), Some("child flow"));
    assert_eq!(report.template_id.as_deref(), Some("2"));
    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        json!({"has_cycle": true, "node_key": "sp", "node_name": "child flow", "template_id": "2"})
    );
}

#[test]
fn test_acyclic_references_pass() {
    let scope = Some(("project", "p1"));
    let store = MemoryTemplateStore::new()
        .with_template(template("1", scope))
        .with_template(template("2", scope))
        .with_template(template("3", scope))
        .with_reference("2", "3")
        .with_reference("1", "3");
    let tree = subprocess_tree(json!("2"));

    let report =
        is_circular_reference(&tree, Some("1"), 1, Some("project"), Some("p1"), &store).unwrap();
    assert_eq!(report, CycleReport::acyclic());
}

#[test]
fn test_edges_outside_the_scope_are_ignored() {
    let tree = subprocess_tree(json!("2"));
    let report =
        is_circular_reference(&tree, Some("1"), 1, Some("project"), Some("p2"), &cyclic_store())
            .unwrap();
    assert!(!report.has_cycle);
}

#[test]
fn test_deleted_templates_are_ignored() {
    let mut store = cyclic_store();
    store.templates[2].is_deleted = true;
    let tree = subprocess_tree(json!("2"));

    let report =
        is_circular_reference(&tree, Some("1"), 1, Some("project"), Some("p1"), &store).unwrap();
    assert!(!report.has_cycle);
}

#[test]
fn test_unscoped_lookup_selects_unscoped_templates() {
    let store = MemoryTemplateStore::new()
        .with_template(template("1", None))
        .with_template(template("2", None))
        .with_reference("2", "1");
    let tree = subprocess_tree(json!("2"));

    assert!(is_circular_reference(&tree, Some("1"), 1, None, None, &store)
        .unwrap()
        .has_cycle);
    assert!(!is_circular_reference(&tree, None, 1, None, None, &store)
        .unwrap()
        .has_cycle);
}

#[test]
fn test_store_file_accepts_numeric_ids() {
    let store: MemoryTemplateStore = serde_json::from_value(json!({
        "templates": [{"id": 5, "space_id": 1}, {"id": 6, "space_id": 1}],
        "references": [{"root_template_id": 6, "subprocess_template_id": "5"}]
    }))
    .unwrap();
    let tree = subprocess_tree(json!(6));

    let report = is_circular_reference(&tree, Some("5"), 1, None, None, &store).unwrap();
    assert!(report.has_cycle);
    assert_eq!(report.template_id.as_deref(), Some("6"));
}
