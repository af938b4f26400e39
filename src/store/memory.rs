use super::{
    ScopeFilter, SchemeId, SchemeStore, SpaceId, TemplateId, TemplateReference, TemplateStore,
    template_id_from_json,
};
use crate::error::StoreError;
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::fs;

/// Scheme storage backed by a map, loadable from a JSON object of
/// `{"<scheme id>": ["node id", ...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemorySchemeStore {
    schemes: AHashMap<SchemeId, Vec<String>>,
}

impl MemorySchemeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scheme<I, S>(mut self, id: SchemeId, node_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schemes
            .insert(id, node_ids.into_iter().map(Into::into).collect());
        self
    }

    /// Loads a scheme store from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path)
            .map_err(|e| StoreError::Load(format!("Could not read '{}': {}", path, e)))?;
        serde_json::from_str(&content)
            .map_err(|e| StoreError::Load(format!("Invalid scheme file '{}': {}", path, e)))
    }
}

impl SchemeStore for MemorySchemeStore {
    fn fetch_scheme_node_ids(
        &self,
        ids: &[SchemeId],
    ) -> Result<AHashMap<SchemeId, AHashSet<String>>, StoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.schemes
                    .get(id)
                    .map(|nodes| (*id, nodes.iter().cloned().collect()))
            })
            .collect())
    }
}

/// A template row as far as reference checking is concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    #[serde(deserialize_with = "template_id_from_json")]
    pub id: TemplateId,
    pub space_id: SpaceId,
    #[serde(default)]
    pub scope_type: Option<String>,
    #[serde(default)]
    pub scope_value: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
}

/// Template storage backed by vectors, loadable from
/// `{"templates": [...], "references": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryTemplateStore {
    #[serde(default)]
    pub templates: Vec<TemplateRecord>,
    #[serde(default)]
    pub references: Vec<TemplateReference>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, record: TemplateRecord) -> Self {
        self.templates.push(record);
        self
    }

    pub fn with_reference(mut self, root: &str, subprocess: &str) -> Self {
        self.references.push(TemplateReference {
            root_template_id: root.to_string(),
            subprocess_template_id: subprocess.to_string(),
        });
        self
    }

    /// Loads a template store from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path)
            .map_err(|e| StoreError::Load(format!("Could not read '{}': {}", path, e)))?;
        serde_json::from_str(&content)
            .map_err(|e| StoreError::Load(format!("Invalid template file '{}': {}", path, e)))
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn fetch_templates(
        &self,
        space_id: SpaceId,
        scope: &ScopeFilter,
    ) -> Result<Vec<TemplateId>, StoreError> {
        Ok(self
            .templates
            .iter()
            .filter(|t| t.space_id == space_id && !t.is_deleted)
            .filter(|t| scope.matches(t.scope_type.as_deref(), t.scope_value.as_deref()))
            .map(|t| t.id.clone())
            .collect())
    }

    fn fetch_template_reference_edges(
        &self,
        template_ids: &[TemplateId],
    ) -> Result<Vec<TemplateReference>, StoreError> {
        let wanted: AHashSet<&str> = template_ids.iter().map(String::as_str).collect();
        Ok(self
            .references
            .iter()
            .filter(|r| wanted.contains(r.root_template_id.as_str()))
            .cloned()
            .collect())
    }
}
