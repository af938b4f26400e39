use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One or many flow ids, kept in the shape the document used.
///
/// Pipeline documents write a single incoming flow either as a bare string or as a
/// one-element list, and the distinction survives a preview round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlowRefs {
    One(String),
    Many(Vec<String>),
    /// The field was missing from the document; it stays missing when written back.
    #[serde(skip)]
    Absent,
}

impl Default for FlowRefs {
    fn default() -> Self {
        FlowRefs::Absent
    }
}

impl FlowRefs {
    /// Non-empty flow ids, in order.
    pub fn ids(&self) -> Vec<&str> {
        match self {
            FlowRefs::One(id) if id.is_empty() => Vec::new(),
            FlowRefs::One(id) => vec![id.as_str()],
            FlowRefs::Many(ids) => ids.iter().map(String::as_str).collect(),
            FlowRefs::Absent => Vec::new(),
        }
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.ids().into_iter().map(str::to_string).collect()
    }

    pub fn first(&self) -> Option<&str> {
        self.ids().into_iter().next()
    }

    pub fn len(&self) -> usize {
        self.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids().contains(&id)
    }

    /// True when the document did not carry the field at all.
    pub fn is_absent(&self) -> bool {
        matches!(self, FlowRefs::Absent)
    }

    /// Removes the first occurrence of `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        match self {
            FlowRefs::One(current) if current == id => {
                *self = FlowRefs::Many(Vec::new());
                true
            }
            FlowRefs::One(_) | FlowRefs::Absent => false,
            FlowRefs::Many(ids) => match ids.iter().position(|f| f == id) {
                Some(pos) => {
                    ids.remove(pos);
                    true
                }
                None => false,
            },
        }
    }

    /// Swaps `replaced` for `new_ids`.
    ///
    /// A list drops `replaced` and appends `new_ids` at the end. A scalar (or a missing
    /// field) becomes the single new id when there is exactly one, and a list otherwise.
    pub fn replace(&mut self, replaced: &str, new_ids: Vec<String>) {
        match self {
            FlowRefs::Many(ids) => {
                if let Some(pos) = ids.iter().position(|f| f == replaced) {
                    ids.remove(pos);
                }
                ids.extend(new_ids);
            }
            FlowRefs::One(_) | FlowRefs::Absent => {
                *self = if new_ids.len() == 1 {
                    FlowRefs::One(new_ids.into_iter().next().unwrap_or_default())
                } else {
                    FlowRefs::Many(new_ids)
                };
            }
        }
    }
}

impl From<&str> for FlowRefs {
    fn from(id: &str) -> Self {
        FlowRefs::One(id.to_string())
    }
}

impl From<Vec<String>> for FlowRefs {
    fn from(ids: Vec<String>) -> Self {
        FlowRefs::Many(ids)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    ServiceActivity,
    SubProcess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GatewayKind {
    ParallelGateway,
    ConvergeGateway,
    ExclusiveGateway,
    ConditionalParallelGateway,
}

impl GatewayKind {
    /// Gateways whose outgoing edges carry condition expressions.
    pub fn is_conditional(&self) -> bool {
        matches!(
            self,
            GatewayKind::ExclusiveGateway | GatewayKind::ConditionalParallelGateway
        )
    }

    pub fn is_diverging(&self) -> bool {
        !matches!(self, GatewayKind::ConvergeGateway)
    }
}

/// The plugin invocation carried by a `ServiceActivity`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Component {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub data: IndexMap<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An executable node: a leaf task or a nested template call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "FlowRefs::is_absent")]
    pub incoming: FlowRefs,
    #[serde(default)]
    pub outgoing: String,
    /// Absent means the node is not optional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<Component>,
    /// Subprocess inputs, each an object with at least `value` and `show_type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constants: Option<IndexMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Activity {
    pub fn is_optional(&self) -> bool {
        self.optional.unwrap_or(false)
    }

    /// The referenced template id of a subprocess, normalized to a string.
    pub fn subprocess_template_id(&self) -> Option<String> {
        match self.template_id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// The condition attached to one outgoing edge of a conditional gateway.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub evaluate: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A branching or joining control node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gateway {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: GatewayKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "FlowRefs::is_absent")]
    pub incoming: FlowRefs,
    #[serde(default, skip_serializing_if = "FlowRefs::is_absent")]
    pub outgoing: FlowRefs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<IndexMap<String, Condition>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Start or end event. The start event only has outgoing edges, the end event only incoming.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "FlowRefs::is_absent")]
    pub incoming: FlowRefs,
    #[serde(default, skip_serializing_if = "FlowRefs::is_absent")]
    pub outgoing: FlowRefs,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Flow {
    #[serde(default)]
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Provenance of a workflow variable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    #[default]
    Custom,
    ComponentInputs,
    ComponentOutputs,
    System,
    Project,
    #[serde(untagged)]
    Other(String),
}

/// A named workflow variable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Constant {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub index: i64,
    #[serde(default)]
    pub source_type: SourceType,
    /// node id -> names of the fields on that node that feed this variable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_info: Option<IndexMap<String, Vec<String>>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
