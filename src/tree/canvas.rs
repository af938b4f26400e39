use crate::error::CanvasError;
use indexmap::IndexMap;
use serde_json::Value;

/// Presentation-only canvas data: node positions (`location`) and edge drawings (`line`).
///
/// Entries are kept as opaque JSON and indexed by their `id`. Entries without a string
/// id cannot take part in any edit and are carried through unchanged, in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Canvas {
    locations: Entries,
    lines: Entries,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum EntryKey {
    Id(String),
    /// Position in the source array of an entry with no usable id.
    Unkeyed(usize),
}

/// One canvas array, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
struct Entries(IndexMap<EntryKey, Value>);

impl Entries {
    fn from_values(values: Vec<Value>) -> Self {
        let map = values
            .into_iter()
            .enumerate()
            .map(|(position, entry)| {
                let key = entry_id(&entry).map_or(EntryKey::Unkeyed(position), EntryKey::Id);
                (key, entry)
            })
            .collect();
        Entries(map)
    }

    fn into_values(self) -> Vec<Value> {
        self.0.into_values().collect()
    }

    fn get(&self, id: &str) -> Option<&Value> {
        self.0.get(&EntryKey::Id(id.to_string()))
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Value> {
        self.0.get_mut(&EntryKey::Id(id.to_string()))
    }

    fn shift_remove(&mut self, id: &str) -> Option<Value> {
        self.0.shift_remove(&EntryKey::Id(id.to_string()))
    }

    fn keyed_len(&self) -> usize {
        self.0
            .keys()
            .filter(|key| matches!(key, EntryKey::Id(_)))
            .count()
    }
}

impl Canvas {
    pub fn from_entries(location: Vec<Value>, line: Vec<Value>) -> Self {
        Canvas {
            locations: Entries::from_values(location),
            lines: Entries::from_values(line),
        }
    }

    /// Splits the canvas back into `(location, line)` document arrays.
    pub fn into_entries(self) -> (Vec<Value>, Vec<Value>) {
        (self.locations.into_values(), self.lines.into_values())
    }

    pub fn location(&self, node_id: &str) -> Option<&Value> {
        self.locations.get(node_id)
    }

    pub fn line(&self, flow_id: &str) -> Option<&Value> {
        self.lines.get(flow_id)
    }

    /// Number of location entries that carry an id.
    pub fn location_count(&self) -> usize {
        self.locations.keyed_len()
    }

    /// Number of line entries that carry an id.
    pub fn line_count(&self) -> usize {
        self.lines.keyed_len()
    }

    pub fn remove_location(&mut self, node_id: &str) -> Result<Value, CanvasError> {
        self.locations
            .shift_remove(node_id)
            .ok_or_else(|| CanvasError::MissingLocation(node_id.to_string()))
    }

    pub fn remove_line(&mut self, flow_id: &str) -> Result<Value, CanvasError> {
        self.lines
            .shift_remove(flow_id)
            .ok_or_else(|| CanvasError::MissingLine(flow_id.to_string()))
    }

    /// Points the drawn end of a line at another node.
    pub fn retarget_line(&mut self, flow_id: &str, node_id: &str) -> Result<(), CanvasError> {
        let line = self
            .lines
            .get_mut(flow_id)
            .ok_or_else(|| CanvasError::MissingLine(flow_id.to_string()))?;
        let target = line
            .get_mut("target")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| CanvasError::MissingLineTarget(flow_id.to_string()))?;
        target.insert("id".to_string(), Value::String(node_id.to_string()));
        Ok(())
    }
}

fn entry_id(entry: &Value) -> Option<String> {
    entry.get("id").and_then(Value::as_str).map(str::to_string)
}

/// Logs a canvas edit that could not be applied. Canvas drift never fails a transform.
pub(crate) fn log_desync<T>(result: Result<T, CanvasError>, context: &str) {
    if let Err(err) = result {
        tracing::warn!(error = %err, context, "canvas data out of sync with pipeline tree");
    }
}
