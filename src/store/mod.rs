//! Read-only storage lookups the preview engine depends on.
//!
//! Schemes and template references live in the service's database. The engine only
//! needs a handful of queries, expressed here as traits so tests and tools can swap in
//! the in-memory implementations from [`memory`].

use crate::error::StoreError;
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

pub mod memory;

pub use memory::{MemorySchemeStore, MemoryTemplateStore, TemplateRecord};

pub type SchemeId = u64;
pub type SpaceId = u64;
/// Template ids are compared as strings; numeric ids are rendered in decimal.
pub type TemplateId = String;

/// Looks up the node sets saved as execution schemes.
pub trait SchemeStore: Send + Sync {
    /// Returns the node ids of every requested scheme that exists. Unknown ids are
    /// simply absent from the result.
    fn fetch_scheme_node_ids(
        &self,
        ids: &[SchemeId],
    ) -> Result<AHashMap<SchemeId, AHashSet<String>>, StoreError>;
}

/// Narrows a template lookup to one scope within a space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFilter {
    pub scope_type: Option<String>,
    pub scope_value: Option<String>,
}

impl ScopeFilter {
    pub fn new(scope_type: Option<&str>, scope_value: Option<&str>) -> Self {
        Self {
            scope_type: scope_type.map(str::to_string),
            scope_value: scope_value.map(str::to_string),
        }
    }

    /// Whether a template with the given scope passes this filter.
    ///
    /// Each present field must match. With both fields absent, only templates that
    /// declare no scope at all pass.
    pub fn matches(&self, scope_type: Option<&str>, scope_value: Option<&str>) -> bool {
        if self.scope_type.is_none() && self.scope_value.is_none() {
            return scope_type.is_none() && scope_value.is_none();
        }
        let type_ok = self
            .scope_type
            .as_deref()
            .is_none_or(|wanted| scope_type == Some(wanted));
        let value_ok = self
            .scope_value
            .as_deref()
            .is_none_or(|wanted| scope_value == Some(wanted));
        type_ok && value_ok
    }
}

/// One "template embeds subprocess template" edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateReference {
    #[serde(deserialize_with = "template_id_from_json")]
    pub root_template_id: TemplateId,
    #[serde(deserialize_with = "template_id_from_json")]
    pub subprocess_template_id: TemplateId,
}

/// Accepts a template id written either as a JSON string or as a JSON integer.
pub(crate) fn template_id_from_json<'de, D>(deserializer: D) -> Result<TemplateId, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a template id, found {}",
            other
        ))),
    }
}

/// Looks up templates and the subprocess references between them.
pub trait TemplateStore: Send + Sync {
    /// Ids of the live templates in `space_id` that pass `scope`.
    fn fetch_templates(
        &self,
        space_id: SpaceId,
        scope: &ScopeFilter,
    ) -> Result<Vec<TemplateId>, StoreError>;

    /// Reference edges whose root is one of `template_ids`.
    fn fetch_template_reference_edges(
        &self,
        template_ids: &[TemplateId],
    ) -> Result<Vec<TemplateReference>, StoreError>;
}
