use super::raw::RawPipelineTree;
use super::{Canvas, Event, Node, PipelineTree};
use crate::error::TreeConversionError;
use serde_json::Value;

/// A trait for documents that can be turned into a [`PipelineTree`].
///
/// The crate implements it for the canonical [`RawPipelineTree`] document, for JSON text
/// and for an already parsed `serde_json::Value`. Callers holding their own template
/// format implement it to feed the preview engine directly.
pub trait IntoPipelineTree {
    /// Consumes the document and builds the arena representation.
    fn into_pipeline_tree(self) -> Result<PipelineTree, TreeConversionError>;
}

impl IntoPipelineTree for RawPipelineTree {
    fn into_pipeline_tree(self) -> Result<PipelineTree, TreeConversionError> {
        let mut tree = PipelineTree {
            flows: self.flows,
            constants: self.constants,
            outputs: self.outputs,
            canvas: Canvas::from_entries(self.location, self.line),
            extra: self.extra,
            ..PipelineTree::default()
        };

        for (key, mut activity) in self.activities {
            activity.id = checked_id(&key, activity.id)?;
            insert_unique(&mut tree, Node::Activity(activity))?;
        }
        for (key, mut gateway) in self.gateways {
            gateway.id = checked_id(&key, gateway.id)?;
            insert_unique(&mut tree, Node::Gateway(gateway))?;
        }
        let start = self
            .start_event
            .filter(has_id)
            .ok_or(TreeConversionError::MissingEvent("start"))?;
        let end = self
            .end_event
            .filter(has_id)
            .ok_or(TreeConversionError::MissingEvent("end"))?;
        insert_unique(&mut tree, Node::StartEvent(start))?;
        insert_unique(&mut tree, Node::EndEvent(end))?;

        for (key, flow) in tree.flows.iter_mut() {
            flow.id = checked_id(key, std::mem::take(&mut flow.id))?;
        }

        Ok(tree)
    }
}

impl IntoPipelineTree for Value {
    fn into_pipeline_tree(self) -> Result<PipelineTree, TreeConversionError> {
        let raw: RawPipelineTree = serde_json::from_value(self)
            .map_err(|e| TreeConversionError::JsonParseError(e.to_string()))?;
        raw.into_pipeline_tree()
    }
}

impl IntoPipelineTree for &str {
    fn into_pipeline_tree(self) -> Result<PipelineTree, TreeConversionError> {
        let raw: RawPipelineTree = serde_json::from_str(self)
            .map_err(|e| TreeConversionError::JsonParseError(e.to_string()))?;
        raw.into_pipeline_tree()
    }
}

impl PipelineTree {
    /// Splits the arena back into the document layout.
    pub fn into_raw(self) -> RawPipelineTree {
        let mut raw = RawPipelineTree {
            flows: self.flows,
            constants: self.constants,
            outputs: self.outputs,
            extra: self.extra,
            ..RawPipelineTree::default()
        };
        for node in self.nodes.into_values() {
            match node {
                Node::Activity(a) => {
                    raw.activities.insert(a.id.clone(), a);
                }
                Node::Gateway(g) => {
                    raw.gateways.insert(g.id.clone(), g);
                }
                Node::StartEvent(e) => raw.start_event = Some(e),
                Node::EndEvent(e) => raw.end_event = Some(e),
            }
        }
        let (location, line) = self.canvas.into_entries();
        raw.location = location;
        raw.line = line;
        raw
    }

    pub fn to_json(&self) -> Result<Value, TreeConversionError> {
        serde_json::to_value(self.clone().into_raw())
            .map_err(|e| TreeConversionError::JsonParseError(e.to_string()))
    }
}

fn has_id(event: &Event) -> bool {
    !event.id.is_empty()
}

/// Fills an empty id from the map key and rejects ids that disagree with it.
fn checked_id(key: &str, id: String) -> Result<String, TreeConversionError> {
    if id.is_empty() || id == key {
        Ok(key.to_string())
    } else {
        Err(TreeConversionError::IdMismatch {
            key: key.to_string(),
            id,
        })
    }
}

fn insert_unique(tree: &mut PipelineTree, node: Node) -> Result<(), TreeConversionError> {
    let id = node.id().to_string();
    if tree.resolve(&id).is_some() {
        return Err(TreeConversionError::DuplicateNode(id));
    }
    tree.insert_node(node);
    Ok(())
}
