//! Common test utilities for building pipeline trees.
use pipeline_preview::prelude::*;
use serde_json::{Value, json};

/// An empty exclusion batch.
#[allow(dead_code)]
pub const NO_EXCLUSIONS: &[&str] = &[];

#[allow(dead_code)]
pub fn load(document: Value) -> PipelineTree {
    document
        .into_pipeline_tree()
        .expect("test tree should load")
}

fn line(id: &str, source: &str, target: &str) -> Value {
    json!({"id": id, "source": {"arrow": "Right", "id": source}, "target": {"arrow": "Left", "id": target}})
}

fn location(id: &str) -> Value {
    json!({"id": id, "type": "tasknode", "x": 0, "y": 0})
}

fn flow(id: &str, source: &str, target: &str) -> Value {
    json!({"id": id, "source": source, "target": target, "is_default": false})
}

fn service(id: &str, incoming: Value, outgoing: &str, optional: bool, data: Value) -> Value {
    json!({
        "id": id,
        "type": "ServiceActivity",
        "name": format!("task {}", id),
        "incoming": incoming,
        "outgoing": outgoing,
        "optional": optional,
        "component": {"code": "job_execute", "data": data}
    })
}

/// `s -l0-> n1 -l1-> n2 -l2-> n3 -l3-> e`
///
/// `n1` and `n2` are optional, `n3` is not. Incoming refs of `n1` are a list, the
/// others scalars, and every node and flow has a canvas entry.
#[allow(dead_code)]
pub fn linear_document() -> Value {
    json!({
        "start_event": {"id": "s", "type": "EmptyStartEvent", "incoming": "", "outgoing": "l0"},
        "end_event": {"id": "e", "type": "EmptyEndEvent", "incoming": "l3", "outgoing": ""},
        "activities": {
            "n1": service("n1", json!(["l0"]), "l1", true, json!({})),
            "n2": service("n2", json!("l1"), "l2", true, json!({})),
            "n3": service("n3", json!("l2"), "l3", false, json!({}))
        },
        "gateways": {},
        "flows": {
            "l0": flow("l0", "s", "n1"),
            "l1": flow("l1", "n1", "n2"),
            "l2": flow("l2", "n2", "n3"),
            "l3": flow("l3", "n3", "e")
        },
        "constants": {},
        "outputs": [],
        "location": [location("s"), location("n1"), location("n2"), location("n3"), location("e")],
        "line": [line("l0", "s", "n1"), line("l1", "n1", "n2"), line("l2", "n2", "n3"), line("l3", "n3", "e")]
    })
}

#[allow(dead_code)]
pub fn linear_tree() -> PipelineTree {
    load(linear_document())
}

/// `s -l0-> pg`, `pg -l1-> a1 -l3-> cg`, `pg -l2-> a2 -l4-> cg`, `cg -l5-> n3 -l6-> e`
///
/// `a1` and `a2` are optional, `n3` is not.
#[allow(dead_code)]
pub fn parallel_tree() -> PipelineTree {
    load(json!({
        "start_event": {"id": "s", "incoming": "", "outgoing": "l0"},
        "end_event": {"id": "e", "incoming": "l6", "outgoing": ""},
        "activities": {
            "a1": service("a1", json!("l1"), "l3", true, json!({})),
            "a2": service("a2", json!("l2"), "l4", true, json!({})),
            "n3": service("n3", json!("l5"), "l6", false, json!({}))
        },
        "gateways": {
            "pg": {"id": "pg", "type": "ParallelGateway", "incoming": "l0", "outgoing": ["l1", "l2"]},
            "cg": {"id": "cg", "type": "ConvergeGateway", "incoming": ["l3", "l4"], "outgoing": "l5"}
        },
        "flows": {
            "l0": flow("l0", "s", "pg"),
            "l1": flow("l1", "pg", "a1"),
            "l2": flow("l2", "pg", "a2"),
            "l3": flow("l3", "a1", "cg"),
            "l4": flow("l4", "a2", "cg"),
            "l5": flow("l5", "cg", "n3"),
            "l6": flow("l6", "n3", "e")
        },
        "location": [location("s"), location("pg"), location("a1"), location("a2"), location("cg"), location("n3"), location("e")],
        "line": [
            line("l0", "s", "pg"), line("l1", "pg", "a1"), line("l2", "pg", "a2"),
            line("l3", "a1", "cg"), line("l4", "a2", "cg"), line("l5", "cg", "n3"), line("l6", "n3", "e")
        ]
    }))
}

/// An outer parallel pair around an inner one:
///
/// `s -l0-> po`, `po -l1-> pi`, `po -l2-> b1 -l3-> co`,
/// `pi -l4-> a1 -l5-> ci`, `pi -l6-> a2 -l7-> ci`, `ci -l8-> co`, `co -l9-> e`
///
/// Every activity is optional.
#[allow(dead_code)]
pub fn nested_parallel_tree() -> PipelineTree {
    load(json!({
        "start_event": {"id": "s", "outgoing": "l0"},
        "end_event": {"id": "e", "incoming": "l9"},
        "activities": {
            "a1": service("a1", json!("l4"), "l5", true, json!({})),
            "a2": service("a2", json!("l6"), "l7", true, json!({})),
            "b1": service("b1", json!("l2"), "l3", true, json!({}))
        },
        "gateways": {
            "po": {"id": "po", "type": "ParallelGateway", "incoming": "l0", "outgoing": ["l1", "l2"]},
            "pi": {"id": "pi", "type": "ParallelGateway", "incoming": "l1", "outgoing": ["l4", "l6"]},
            "ci": {"id": "ci", "type": "ConvergeGateway", "incoming": ["l5", "l7"], "outgoing": "l8"},
            "co": {"id": "co", "type": "ConvergeGateway", "incoming": ["l8", "l3"], "outgoing": "l9"}
        },
        "flows": {
            "l0": flow("l0", "s", "po"),
            "l1": flow("l1", "po", "pi"),
            "l2": flow("l2", "po", "b1"),
            "l3": flow("l3", "b1", "co"),
            "l4": flow("l4", "pi", "a1"),
            "l5": flow("l5", "a1", "ci"),
            "l6": flow("l6", "pi", "a2"),
            "l7": flow("l7", "a2", "ci"),
            "l8": flow("l8", "ci", "co"),
            "l9": flow("l9", "co", "e")
        }
    }))
}

/// `s -l0-> xg`, `xg -l1-> a1 -l3-> cg`, `xg -l2-> a2 -l4-> cg`, `cg -l5-> e`
///
/// `xg` is exclusive with a condition on each branch that reads `${x}`.
#[allow(dead_code)]
pub fn exclusive_tree() -> PipelineTree {
    load(json!({
        "start_event": {"id": "s", "outgoing": "l0"},
        "end_event": {"id": "e", "incoming": "l5"},
        "activities": {
            "a1": service("a1", json!("l1"), "l3", true, json!({})),
            "a2": service("a2", json!("l2"), "l4", true, json!({}))
        },
        "gateways": {
            "xg": {
                "id": "xg", "type": "ExclusiveGateway", "incoming": "l0", "outgoing": ["l1", "l2"],
                "conditions": {"l1": {"evaluate": "${x} > 1"}, "l2": {"evaluate": "${x} <= 1"}}
            },
            "cg": {"id": "cg", "type": "ConvergeGateway", "incoming": ["l3", "l4"], "outgoing": "l5"}
        },
        "flows": {
            "l0": flow("l0", "s", "xg"),
            "l1": flow("l1", "xg", "a1"),
            "l2": flow("l2", "xg", "a2"),
            "l3": flow("l3", "a1", "cg"),
            "l4": flow("l4", "a2", "cg"),
            "l5": flow("l5", "cg", "e")
        },
        "constants": {
            "${x}": {"value": "3", "index": 0, "source_type": "custom"},
            "${unused}": {"value": "", "index": 1, "source_type": "custom"}
        }
    }))
}

/// `s -l0-> n1 -l1-> n2 -l2-> e` with a variable set exercising every pruning rule.
///
/// - `${a}` is only read by the optional `n1`.
/// - `${b}` is read by `n2` and its value reads `${c}`.
/// - `${d}` is an output nothing reads.
/// - `${e}` is a component output of `n1`; `${f}` a component input of `n1`.
#[allow(dead_code)]
pub fn constants_tree() -> PipelineTree {
    load(json!({
        "start_event": {"id": "s", "outgoing": "l0"},
        "end_event": {"id": "e", "incoming": "l2"},
        "activities": {
            "n1": service("n1", json!("l0"), "l1", true, json!({"cmd": {"hook": false, "value": "echo ${a}"}})),
            "n2": service("n2", json!("l1"), "l2", false, json!({"cmd": {"hook": false, "value": "echo ${b.strip()}"}}))
        },
        "flows": {
            "l0": flow("l0", "s", "n1"),
            "l1": flow("l1", "n1", "n2"),
            "l2": flow("l2", "n2", "e")
        },
        "constants": {
            "${a}": {"value": "x", "index": 0, "source_type": "custom"},
            "${f}": {"value": "", "index": 5, "source_type": "component_inputs", "source_info": {"n1": ["in"]}},
            "${b}": {"value": "${c}-suffix", "index": 1, "source_type": "custom"},
            "${c}": {"value": "base", "index": 2, "source_type": "custom"},
            "${d}": {"value": "", "index": 3, "source_type": "custom"},
            "${e}": {"value": "", "index": 4, "source_type": "component_outputs", "source_info": {"n1": ["out"], "n2": ["out"]}}
        },
        "outputs": ["${d}", "${e}"]
    }))
}

/// A single subprocess `sp` pointing at `template_id`, between the start and end events.
#[allow(dead_code)]
pub fn subprocess_tree(template_id: Value) -> PipelineTree {
    load(json!({
        "start_event": {"id": "s", "outgoing": "l0"},
        "end_event": {"id": "e", "incoming": "l1"},
        "activities": {
            "sp": {
                "id": "sp", "type": "SubProcess", "name": "child flow",
                "incoming": "l0", "outgoing": "l1", "optional": true,
                "template_id": template_id,
                "constants": {
                    "${shown}": {"value": "${p}", "show_type": "show"},
                    "${hidden}": {"value": "${q}", "show_type": "hide"}
                }
            }
        },
        "flows": {
            "l0": flow("l0", "s", "sp"),
            "l1": flow("l1", "sp", "e")
        },
        "constants": {
            "${p}": {"value": "1", "index": 0, "source_type": "custom"},
            "${q}": {"value": "2", "index": 1, "source_type": "custom"}
        }
    }))
}

/// Asserts that every flow endpoint resolves and that every node lists exactly the flows
/// that point at it and leave it.
#[allow(dead_code)]
pub fn assert_structurally_valid(tree: &PipelineTree) {
    assert!(
        tree.dangling_flows().is_empty(),
        "dangling flows: {:?}",
        tree.dangling_flows()
    );
    for flow in tree.flows.values() {
        let target = tree.resolve(&flow.target).unwrap();
        assert!(
            target.incoming().unwrap().contains(&flow.id),
            "{} does not list incoming flow {}",
            flow.target,
            flow.id
        );
        let source = tree.resolve(&flow.source).unwrap();
        assert!(
            source.outgoing().contains(&flow.id.as_str()),
            "{} does not list outgoing flow {}",
            flow.source,
            flow.id
        );
    }
    for node in tree.nodes() {
        for flow_id in node.outgoing() {
            assert!(tree.flow(flow_id).is_some(), "missing flow {}", flow_id);
        }
        if let Some(incoming) = node.incoming() {
            for flow_id in incoming.ids() {
                assert!(tree.flow(flow_id).is_some(), "missing flow {}", flow_id);
            }
        }
    }
    assert!(tree.reaches_end(), "end event is unreachable");
}
