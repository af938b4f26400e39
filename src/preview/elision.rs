use crate::error::PreviewError;
use crate::tree::canvas::log_desync;
use crate::tree::{Activity, Node, PipelineTree};
use itertools::Itertools;
use tracing::debug;

/// Splices every id in `exclude_ids` out of the tree, reconnecting its neighbours.
///
/// The whole batch is checked before anything is touched, so a bad id leaves the tree
/// exactly as it was. Duplicate ids are elided once. Returns the elided ids in
/// request order.
pub fn elide<S: AsRef<str>>(
    tree: &mut PipelineTree,
    exclude_ids: &[S],
) -> Result<Vec<String>, PreviewError> {
    let ids: Vec<&str> = exclude_ids.iter().map(AsRef::as_ref).unique().collect();

    for id in &ids {
        check_elidable(tree, id)?;
    }
    for id in &ids {
        splice(tree, id)?;
    }

    Ok(ids.into_iter().map(str::to_string).collect())
}

fn check_elidable(tree: &PipelineTree, id: &str) -> Result<(), PreviewError> {
    let activity = tree
        .activity(id)
        .ok_or_else(|| PreviewError::UnknownNode(id.to_string()))?;
    if !activity.is_optional() {
        return Err(PreviewError::NotOptional(id.to_string()));
    }
    if tree.flow(&activity.outgoing).is_none() {
        return Err(malformed(id, format!("outgoing flow '{}' does not exist", activity.outgoing)));
    }
    if let Some(missing) = activity.incoming.ids().into_iter().find(|f| tree.flow(f).is_none()) {
        return Err(malformed(id, format!("incoming flow '{}' does not exist", missing)));
    }
    Ok(())
}

fn splice(tree: &mut PipelineTree, id: &str) -> Result<(), PreviewError> {
    let activity = match tree.remove_node(id) {
        Some(Node::Activity(activity)) => activity,
        _ => return Err(PreviewError::UnknownNode(id.to_string())),
    };
    let Activity {
        incoming, outgoing, ..
    } = activity;
    let incoming = incoming.to_vec();
    let successor_id = tree.successor_of_flow(&outgoing)?;

    if let Some(refs) = tree.resolve_mut(&successor_id).and_then(Node::incoming_mut) {
        refs.replace(&outgoing, incoming.clone());
    }
    for flow_id in &incoming {
        if let Some(flow) = tree.flows.get_mut(flow_id) {
            flow.target = successor_id.clone();
        }
    }
    tree.flows.shift_remove(&outgoing);

    log_desync(tree.canvas.remove_location(id), "elide activity location");
    log_desync(tree.canvas.remove_line(&outgoing), "elide activity outgoing line");
    for flow_id in &incoming {
        log_desync(
            tree.canvas.retarget_line(flow_id, &successor_id),
            "retarget activity incoming line",
        );
    }

    debug!(node_id = id, successor = %successor_id, "elided optional activity");
    Ok(())
}

fn malformed(node_id: &str, message: String) -> PreviewError {
    PreviewError::MalformedTree {
        node_id: node_id.to_string(),
        message,
    }
}
