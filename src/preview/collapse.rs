use super::pairing::GatewayPairs;
use crate::error::PreviewError;
use crate::tree::canvas::log_desync;
use crate::tree::{GatewayKind, PipelineTree};
use tracing::debug;

/// Removes parallel/converge pairs left without any work between them.
///
/// Direct `parallel -> converge` edges are dropped first. When that leaves the parallel
/// gateway with no outgoing edges at all, both gateways go and their neighbours are
/// joined directly. Passes repeat until the gateway count settles, since removing an
/// inner pair can empty an outer one. Only `ParallelGateway` pairs are touched.
///
/// Returns the number of gateways removed.
pub fn collapse_parallel_gateways(
    tree: &mut PipelineTree,
    pairs: &GatewayPairs,
) -> Result<usize, PreviewError> {
    let initial = tree.gateway_count();
    loop {
        let before = tree.gateway_count();
        for (converge_id, gateway_ids) in pairs {
            for gateway_id in gateway_ids {
                match tree.gateway(gateway_id) {
                    Some(g) if g.kind == GatewayKind::ParallelGateway => {}
                    _ => continue,
                }
                try_collapse_pair(tree, gateway_id, converge_id)?;
            }
        }
        if tree.gateway_count() == before {
            break;
        }
    }
    Ok(initial - tree.gateway_count())
}

fn try_collapse_pair(
    tree: &mut PipelineTree,
    parallel_id: &str,
    converge_id: &str,
) -> Result<bool, PreviewError> {
    if tree.gateway(converge_id).is_none() {
        return Ok(false);
    }
    let outgoing = match tree.gateway(parallel_id) {
        Some(parallel) => parallel.outgoing.to_vec(),
        None => return Ok(false),
    };

    let mut whole_pair = true;
    for flow_id in outgoing {
        let direct = tree
            .flow(&flow_id)
            .is_some_and(|flow| flow.target == converge_id);
        if !direct {
            whole_pair = false;
            continue;
        }
        if let Some(converge) = tree.gateway_mut(converge_id) {
            converge.incoming.remove(&flow_id);
        }
        if let Some(parallel) = tree.gateway_mut(parallel_id) {
            parallel.outgoing.remove(&flow_id);
        }
        tree.flows.shift_remove(&flow_id);
        log_desync(tree.canvas.remove_line(&flow_id), "drop direct gateway line");
    }

    if !whole_pair {
        return Ok(false);
    }

    let (converge_incoming, converge_outgoing) = match tree.gateway(converge_id) {
        Some(converge) => (
            converge.incoming.to_vec(),
            converge.outgoing.first().map(str::to_string),
        ),
        None => return Ok(false),
    };
    let converge_outgoing = converge_outgoing.ok_or_else(|| PreviewError::MalformedTree {
        node_id: converge_id.to_string(),
        message: "converge gateway has no outgoing flow".to_string(),
    })?;
    let parallel_incoming = tree
        .gateway(parallel_id)
        .map(|g| g.incoming.to_vec())
        .unwrap_or_default();

    let downstream_id = tree.successor_of_flow(&converge_outgoing)?;
    tree.flows.shift_remove(&converge_outgoing);
    log_desync(tree.canvas.remove_line(&converge_outgoing), "drop converge outgoing line");

    let rewired: Vec<String> = converge_incoming
        .into_iter()
        .chain(parallel_incoming)
        .collect();
    for flow_id in &rewired {
        if let Some(flow) = tree.flows.get_mut(flow_id) {
            flow.target = downstream_id.clone();
        }
        log_desync(
            tree.canvas.retarget_line(flow_id, &downstream_id),
            "retarget line past collapsed gateways",
        );
    }

    if let Some(refs) = tree
        .resolve_mut(&downstream_id)
        .and_then(|node| node.incoming_mut())
    {
        refs.replace(&converge_outgoing, rewired);
    }

    tree.remove_node(parallel_id);
    tree.remove_node(converge_id);
    log_desync(tree.canvas.remove_location(parallel_id), "drop parallel location");
    log_desync(tree.canvas.remove_location(converge_id), "drop converge location");

    debug!(
        parallel = parallel_id,
        converge = converge_id,
        downstream = %downstream_id,
        "collapsed empty parallel gateway pair"
    );
    Ok(true)
}
