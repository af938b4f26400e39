//! Integration tests for pipeline-preview
//!
//! End-to-end tests that run whole previews and check the properties every previewed
//! tree must keep.
//!
mod common;
use common::*;
use pipeline_preview::prelude::*;
use pipeline_preview::preview::PreviewOptions;
use pipeline_preview::tree::FlowRefs;
use serde_json::json;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_preview_reports_success() {
        let mut tree = linear_tree();
        let ok = preview_pipeline_tree_exclude_task_nodes(&mut tree, &["n1", "n2"], true)
            .expect("preview should succeed");
        assert!(ok);
        assert_eq!(tree.activity_ids(), vec!["n3"]);
    }

    #[test]
    fn test_activity_count_drops_by_distinct_exclusions() {
        let cases: Vec<(PipelineTree, Vec<&str>)> = vec![
            (linear_tree(), vec!["n1"]),
            (linear_tree(), vec!["n2", "n1", "n2"]),
            (parallel_tree(), vec!["a1", "a2"]),
            (nested_parallel_tree(), vec!["b1", "a2"]),
            (exclusive_tree(), vec!["a2"]),
        ];
        for (mut tree, exclude) in cases {
            let before = tree.activity_count();
            let mut distinct = exclude.clone();
            distinct.sort_unstable();
            distinct.dedup();

            Previewer::default().preview(&mut tree, &exclude).unwrap();
            assert_eq!(tree.activity_count(), before - distinct.len());
            assert_structurally_valid(&tree);
        }
    }

    #[test]
    fn test_second_preview_without_exclusions_changes_nothing() {
        let previewer = Previewer::default();
        let mut tree = nested_parallel_tree();
        previewer.preview(&mut tree, &["a1", "a2"]).unwrap();
        let once = tree.clone();

        previewer.preview(&mut tree, NO_EXCLUSIONS).unwrap();
        assert_eq!(tree, once);
    }

    #[test]
    fn test_non_optional_exclusion_fails_and_keeps_tree() {
        let mut tree = parallel_tree();
        let before = tree.clone();

        let result = preview_pipeline_tree_exclude_task_nodes(&mut tree, &["a1", "n3"], true);
        assert_eq!(result, Err(PreviewError::NotOptional("n3".into())));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_document_round_trip_is_lossless() {
        let mut document = linear_document();
        document["pipeline_id"] = json!("p-001");
        document["activities"]["n1"]["retryable"] = json!(true);

        let tree = document.clone().into_pipeline_tree().unwrap();
        assert_eq!(tree.to_json().unwrap(), document);
    }

    #[test]
    fn test_empty_and_missing_fields_round_trip_unchanged() {
        let document = json!({
            "start_event": {"id": "s", "incoming": [], "outgoing": "l0"},
            "end_event": {"id": "e", "incoming": "l2"},
            "activities": {
                "sp": {
                    "id": "sp", "type": "SubProcess", "incoming": "l0", "outgoing": "l1",
                    "template_id": "2", "constants": {}
                }
            },
            "gateways": {
                "xg": {"id": "xg", "type": "ExclusiveGateway", "incoming": "l1", "outgoing": ["l2"], "conditions": {}}
            },
            "flows": {
                "l0": {"id": "l0", "source": "s", "target": "sp"},
                "l1": {"id": "l1", "source": "sp", "target": "xg", "is_default": false},
                "l2": {"id": "l2", "source": "xg", "target": "e"}
            },
            "constants": {
                "${a}": {"value": "", "index": 0, "source_type": "custom"}
            },
            "outputs": [],
            "location": [{"x": 0}, {"id": "sp", "x": 1}],
            "line": []
        });

        let tree = document.clone().into_pipeline_tree().unwrap();
        assert_eq!(tree.to_json().unwrap(), document);
    }

    #[test]
    fn test_previewed_document_keeps_ref_shapes() {
        let mut tree = linear_tree();
        preview_pipeline_tree_exclude_task_nodes(&mut tree, &["n2"], true).unwrap();

        let document = tree.to_json().unwrap();
        assert_eq!(document["activities"]["n1"]["incoming"], json!(["l0"]));
        assert_eq!(document["activities"]["n3"]["incoming"], json!("l1"));
        assert_eq!(document["flows"]["l1"]["target"], "n3");
        assert!(document["flows"].get("l2").is_none());
    }

    #[test]
    fn test_builder_options_are_applied() {
        let options: PreviewOptions =
            serde_json::from_value(json!({"remove_outputs_without_refs": false})).unwrap();
        let previewer = Previewer::builder().with_options(options).build();
        assert!(!previewer.options().remove_outputs_without_refs);

        let mut tree = constants_tree();
        previewer.preview(&mut tree, &["n1"]).unwrap();
        assert!(tree.constants.contains_key("${d}"));
        assert_eq!(tree.outputs, vec!["${e}", "${d}"]);
    }

    #[test]
    fn test_options_default_to_removing_outputs() {
        let options: PreviewOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(options, PreviewOptions::default());
        assert!(options.remove_outputs_without_refs);
    }

    #[test]
    fn test_everything_excluded_leaves_start_to_end() {
        let mut tree = nested_parallel_tree();
        preview_pipeline_tree_exclude_task_nodes(&mut tree, &["a1", "a2", "b1"], true).unwrap();

        assert_eq!(tree.nodes().count(), 2);
        assert_eq!(tree.start_event().unwrap().outgoing, FlowRefs::from("l0"));
        assert_structurally_valid(&tree);
    }
}
