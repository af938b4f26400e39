use super::definition::{Activity, Constant, Event, Flow, Gateway};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The pipeline-tree document as exchanged with the template store and the web layer.
///
/// This mirrors the JSON layout one-to-one; convert it with
/// [`IntoPipelineTree`](super::IntoPipelineTree) before transforming it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPipelineTree {
    #[serde(default)]
    pub activities: IndexMap<String, Activity>,
    #[serde(default)]
    pub gateways: IndexMap<String, Gateway>,
    #[serde(default)]
    pub flows: IndexMap<String, Flow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_event: Option<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_event: Option<Event>,
    #[serde(default)]
    pub constants: IndexMap<String, Constant>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub location: Vec<Value>,
    #[serde(default)]
    pub line: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
