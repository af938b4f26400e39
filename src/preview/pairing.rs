use crate::tree::{GatewayKind, Node, PipelineTree};
use ahash::{AHashMap, AHashSet};
use indexmap::IndexMap;

/// converge gateway id -> the diverging gateways that join at it, in discovery order
pub type GatewayPairs = IndexMap<String, Vec<String>>;

/// Works out which diverging gateway each converge gateway closes.
pub trait GatewayPairing: Send + Sync {
    fn find_gateway_pairs(&self, tree: &PipelineTree) -> GatewayPairs;
}

/// Pairs gateways by walking the graph forward.
///
/// Each branch of a diverging gateway is followed through activities. A nested
/// diverging gateway is skipped over by jumping past its own converge. The first
/// converge reached closes the gateway. Branches that end at the end event or loop
/// back on themselves do not decide anything; the next branch is tried instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralPairing;

impl GatewayPairing for StructuralPairing {
    fn find_gateway_pairs(&self, tree: &PipelineTree) -> GatewayPairs {
        let mut walker = PairWalker::new(tree);
        let mut pairs = GatewayPairs::new();
        for gateway in tree.gateways().filter(|g| g.kind.is_diverging()) {
            if let Some(converge_id) = walker.converge_of(&gateway.id) {
                pairs
                    .entry(converge_id)
                    .or_default()
                    .push(gateway.id.clone());
            }
        }
        pairs
    }
}

struct PairWalker<'a> {
    tree: &'a PipelineTree,
    memo: AHashMap<String, Option<String>>,
    in_progress: AHashSet<String>,
}

impl<'a> PairWalker<'a> {
    fn new(tree: &'a PipelineTree) -> Self {
        Self {
            tree,
            memo: AHashMap::new(),
            in_progress: AHashSet::new(),
        }
    }

    fn converge_of(&mut self, gateway_id: &str) -> Option<String> {
        if let Some(known) = self.memo.get(gateway_id) {
            return known.clone();
        }
        if !self.in_progress.insert(gateway_id.to_string()) {
            return None;
        }

        let tree = self.tree;
        let mut found = None;
        if let Some(gateway) = tree.gateway(gateway_id) {
            for flow_id in gateway.outgoing.ids() {
                if let Some(converge_id) = self.walk_branch(flow_id) {
                    found = Some(converge_id);
                    break;
                }
            }
        }

        self.in_progress.remove(gateway_id);
        self.memo.insert(gateway_id.to_string(), found.clone());
        found
    }

    fn walk_branch(&mut self, flow_id: &str) -> Option<String> {
        let tree = self.tree;
        let mut visited: AHashSet<&str> = AHashSet::new();
        let mut current = tree.flow(flow_id)?.target.as_str();

        loop {
            if !visited.insert(current) {
                return None;
            }
            match tree.resolve(current)? {
                Node::Activity(activity) => {
                    current = tree.flow(&activity.outgoing)?.target.as_str();
                }
                Node::Gateway(g) if g.kind == GatewayKind::ConvergeGateway => {
                    return Some(g.id.clone());
                }
                Node::Gateway(g) => {
                    let nested = self.converge_of(&g.id)?;
                    let next_flow = tree.gateway(&nested)?.outgoing.first()?;
                    current = tree.flow(next_flow)?.target.as_str();
                }
                Node::StartEvent(_) | Node::EndEvent(_) => return None,
            }
        }
    }
}
