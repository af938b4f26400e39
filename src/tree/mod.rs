//! The in-memory pipeline tree.
//!
//! Activities, gateways and the two events live in one arena keyed by node id, so a
//! flow target is always looked up through [`PipelineTree::resolve`] no matter what
//! kind of node it points at.

use crate::error::PreviewError;
use ahash::AHashSet;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::VecDeque;

pub mod canvas;
pub mod conversion;
pub mod definition;
pub mod raw;

pub use canvas::Canvas;
pub use conversion::IntoPipelineTree;
pub use definition::*;
pub use raw::RawPipelineTree;

/// Any node a flow can point at.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Activity(Activity),
    Gateway(Gateway),
    StartEvent(Event),
    EndEvent(Event),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::Activity(a) => &a.id,
            Node::Gateway(g) => &g.id,
            Node::StartEvent(e) | Node::EndEvent(e) => &e.id,
        }
    }

    /// Incoming flow ids. The start event has none.
    pub fn incoming(&self) -> Option<&FlowRefs> {
        match self {
            Node::Activity(a) => Some(&a.incoming),
            Node::Gateway(g) => Some(&g.incoming),
            Node::EndEvent(e) => Some(&e.incoming),
            Node::StartEvent(_) => None,
        }
    }

    pub fn incoming_mut(&mut self) -> Option<&mut FlowRefs> {
        match self {
            Node::Activity(a) => Some(&mut a.incoming),
            Node::Gateway(g) => Some(&mut g.incoming),
            Node::EndEvent(e) => Some(&mut e.incoming),
            Node::StartEvent(_) => None,
        }
    }

    pub fn outgoing(&self) -> Vec<&str> {
        match self {
            Node::Activity(a) if a.outgoing.is_empty() => Vec::new(),
            Node::Activity(a) => vec![a.outgoing.as_str()],
            Node::Gateway(g) => g.outgoing.ids(),
            Node::StartEvent(e) => e.outgoing.ids(),
            Node::EndEvent(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineTree {
    nodes: IndexMap<String, Node>,
    start_event_id: Option<String>,
    end_event_id: Option<String>,
    pub flows: IndexMap<String, Flow>,
    pub constants: IndexMap<String, Constant>,
    pub outputs: Vec<String>,
    pub canvas: Canvas,
    /// Document fields this crate does not interpret.
    pub extra: Map<String, Value>,
}

impl PipelineTree {
    /// Looks a node up by id, whatever its kind.
    pub fn resolve(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn resolve_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn activity(&self, id: &str) -> Option<&Activity> {
        match self.nodes.get(id) {
            Some(Node::Activity(a)) => Some(a),
            _ => None,
        }
    }

    pub fn activity_mut(&mut self, id: &str) -> Option<&mut Activity> {
        match self.nodes.get_mut(id) {
            Some(Node::Activity(a)) => Some(a),
            _ => None,
        }
    }

    pub fn gateway(&self, id: &str) -> Option<&Gateway> {
        match self.nodes.get(id) {
            Some(Node::Gateway(g)) => Some(g),
            _ => None,
        }
    }

    pub fn gateway_mut(&mut self, id: &str) -> Option<&mut Gateway> {
        match self.nodes.get_mut(id) {
            Some(Node::Gateway(g)) => Some(g),
            _ => None,
        }
    }

    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.nodes.values().filter_map(|n| match n {
            Node::Activity(a) => Some(a),
            _ => None,
        })
    }

    pub fn activities_mut(&mut self) -> impl Iterator<Item = &mut Activity> {
        self.nodes.values_mut().filter_map(|n| match n {
            Node::Activity(a) => Some(a),
            _ => None,
        })
    }

    pub fn gateways(&self) -> impl Iterator<Item = &Gateway> {
        self.nodes.values().filter_map(|n| match n {
            Node::Gateway(g) => Some(g),
            _ => None,
        })
    }

    pub fn activity_ids(&self) -> Vec<String> {
        self.activities().map(|a| a.id.clone()).collect()
    }

    pub fn activity_count(&self) -> usize {
        self.activities().count()
    }

    pub fn gateway_count(&self) -> usize {
        self.gateways().count()
    }

    pub fn start_event(&self) -> Option<&Event> {
        match self.nodes.get(self.start_event_id.as_deref()?) {
            Some(Node::StartEvent(e)) => Some(e),
            _ => None,
        }
    }

    pub fn end_event(&self) -> Option<&Event> {
        match self.nodes.get(self.end_event_id.as_deref()?) {
            Some(Node::EndEvent(e)) => Some(e),
            _ => None,
        }
    }

    pub fn end_event_id(&self) -> Option<&str> {
        self.end_event_id.as_deref()
    }

    pub fn flow(&self, id: &str) -> Option<&Flow> {
        self.flows.get(id)
    }

    /// Adds a node to the arena. Events also become the tree's start or end event.
    pub fn insert_node(&mut self, node: Node) -> Option<Node> {
        match &node {
            Node::StartEvent(e) => self.start_event_id = Some(e.id.clone()),
            Node::EndEvent(e) => self.end_event_id = Some(e.id.clone()),
            _ => {}
        }
        self.nodes.insert(node.id().to_string(), node)
    }

    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        self.nodes.shift_remove(id)
    }

    /// The node a flow leads into.
    ///
    /// Falls back to the end event when the flow target is not a known node.
    pub fn successor_of_flow(&self, flow_id: &str) -> Result<String, PreviewError> {
        let flow = self
            .flows
            .get(flow_id)
            .ok_or_else(|| PreviewError::MalformedTree {
                node_id: flow_id.to_string(),
                message: "flow does not exist".to_string(),
            })?;
        if self.nodes.contains_key(&flow.target) {
            return Ok(flow.target.clone());
        }
        match &self.end_event_id {
            Some(end_id) => {
                tracing::warn!(
                    flow_id,
                    target = %flow.target,
                    end_event = %end_id,
                    "flow target is not a node, falling back to end event"
                );
                Ok(end_id.clone())
            }
            None => Err(PreviewError::MalformedTree {
                node_id: flow.target.clone(),
                message: format!("target of flow '{}' does not exist", flow_id),
            }),
        }
    }

    /// Flows whose source or target does not name a node.
    pub fn dangling_flows(&self) -> Vec<&Flow> {
        self.flows
            .values()
            .filter(|f| !self.nodes.contains_key(&f.source) || !self.nodes.contains_key(&f.target))
            .collect()
    }

    /// Whether the end event can be reached from the start event by following flows.
    pub fn reaches_end(&self) -> bool {
        let (Some(start), Some(end)) = (&self.start_event_id, &self.end_event_id) else {
            return false;
        };
        let mut seen: AHashSet<&str> = AHashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([start.as_str()]);
        while let Some(id) = queue.pop_front() {
            if id == end.as_str() {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            for flow_id in node.outgoing() {
                if let Some(flow) = self.flows.get(flow_id) {
                    queue.push_back(flow.target.as_str());
                }
            }
        }
        false
    }
}
