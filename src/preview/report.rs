use crate::tree::{ActivityKind, Constant, PipelineTree};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Component code of the variable assignment plugin.
pub const VALUE_ASSIGN_CODE: &str = "value_assign";
const ASSIGNMENT_LIST_FIELD: &str = "bk_assignment_list";

/// What a template preview produced besides the mutated tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreviewReport {
    /// Constants of the original template that the previewed tree no longer carries.
    pub constants_not_referred: IndexMap<String, Constant>,
}

/// Wraps every assignment target of value-assign nodes as `${key}`.
///
/// Assignment targets name variables by bare key. Wrapped, they read as references,
/// so the variables they write are not pruned as unused.
pub fn wrap_assignment_keys(tree: &mut PipelineTree) {
    for_each_assignment_key(tree, |key| format!("${{{}}}", key));
}

/// Reverses [`wrap_assignment_keys`].
pub fn unwrap_assignment_keys(tree: &mut PipelineTree) {
    for_each_assignment_key(tree, |key| {
        key.strip_prefix("${")
            .and_then(|k| k.strip_suffix('}'))
            .unwrap_or(key)
            .to_string()
    });
}

fn for_each_assignment_key<F>(tree: &mut PipelineTree, rewrite: F)
where
    F: Fn(&str) -> String,
{
    let assign_nodes = tree.activities_mut().filter(|a| {
        a.kind == ActivityKind::ServiceActivity
            && a.component.as_ref().and_then(|c| c.code.as_deref()) == Some(VALUE_ASSIGN_CODE)
    });

    for activity in assign_nodes {
        let assignments = activity
            .component
            .as_mut()
            .and_then(|c| c.data.get_mut(ASSIGNMENT_LIST_FIELD))
            .and_then(|field| field.get_mut("value"))
            .and_then(Value::as_array_mut);
        let Some(assignments) = assignments else {
            tracing::debug!(node_id = %activity.id, "value assign node has no assignment list");
            continue;
        };
        for assignment in assignments {
            if let Some(Value::String(key)) = assignment.get_mut("key") {
                *key = rewrite(key);
            }
        }
    }
}
