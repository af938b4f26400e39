//! Detection of subprocess templates that end up embedding themselves.

use crate::error::PreviewError;
use crate::store::{ScopeFilter, SpaceId, TemplateId, TemplateReference, TemplateStore};
use crate::tree::{ActivityKind, PipelineTree};
use ahash::{AHashMap, AHashSet};
use serde::Serialize;
use tracing::{debug, info};

/// Outcome of a cycle check. When a cycle exists it names the subprocess activity that
/// leads into it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub has_cycle: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<TemplateId>,
}

impl CycleReport {
    pub fn acyclic() -> Self {
        Self::default()
    }
}

/// Adjacency of the "template embeds subprocess template" relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceGraph {
    edges: AHashMap<TemplateId, Vec<TemplateId>>,
}

impl ReferenceGraph {
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = TemplateReference>,
    {
        let mut graph = Self::default();
        for edge in edges {
            graph
                .edges
                .entry(edge.root_template_id)
                .or_default()
                .push(edge.subprocess_template_id);
        }
        graph
    }

    pub fn subprocesses_of(&self, template_id: &str) -> &[TemplateId] {
        self.edges.get(template_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a walk from `template_id` revisits a template already on `path`.
    ///
    /// `path` holds the templates of the current walk and is restored before returning.
    /// `safe` collects templates whose whole subtree was walked without a hit; they can
    /// never reach a later path either, so they are not walked again.
    fn reaches_path(
        &self,
        template_id: &str,
        path: &mut AHashSet<TemplateId>,
        safe: &mut AHashSet<TemplateId>,
    ) -> bool {
        if path.contains(template_id) {
            return true;
        }
        if safe.contains(template_id) {
            return false;
        }
        path.insert(template_id.to_string());
        let found = self
            .subprocesses_of(template_id)
            .iter()
            .any(|sub| self.reaches_path(sub, path, safe));
        if !found {
            path.remove(template_id);
            safe.insert(template_id.to_string());
        }
        found
    }
}

/// Checks the subprocess activities of `tree` against a known reference graph.
///
/// Subprocesses are tried in declaration order and the first one leading into a cycle is
/// reported. The walk treats `current_template_id`, the template being edited, as
/// already visited.
pub fn find_subprocess_cycle(
    tree: &PipelineTree,
    current_template_id: Option<&str>,
    graph: &ReferenceGraph,
) -> CycleReport {
    let mut path: AHashSet<TemplateId> = AHashSet::new();
    let mut safe: AHashSet<TemplateId> = AHashSet::new();
    if let Some(current) = current_template_id.filter(|id| !id.is_empty()) {
        path.insert(current.to_string());
    }

    let subprocesses = tree
        .activities()
        .filter(|a| a.kind == ActivityKind::SubProcess);
    for activity in subprocesses {
        let Some(template_id) = activity.subprocess_template_id() else {
            debug!(node_id = %activity.id, "subprocess has no template id");
            continue;
        };
        if graph.reaches_path(&template_id, &mut path, &mut safe) {
            info!(
                node_id = %activity.id,
                template_id = %template_id,
                "subprocess reference cycle found"
            );
            return CycleReport {
                has_cycle: true,
                node_key: Some(activity.id.clone()),
                node_name: activity.name.clone(),
                template_id: Some(template_id),
            };
        }
    }
    CycleReport::acyclic()
}

/// Loads the reference graph of a space scope from `store` and checks `tree` against it.
pub fn is_circular_reference(
    tree: &PipelineTree,
    current_template_id: Option<&str>,
    space_id: SpaceId,
    scope_type: Option<&str>,
    scope_value: Option<&str>,
    store: &dyn TemplateStore,
) -> Result<CycleReport, PreviewError> {
    let scope = ScopeFilter::new(scope_type, scope_value);
    let templates = store.fetch_templates(space_id, &scope)?;
    let edges = store.fetch_template_reference_edges(&templates)?;
    debug!(
        space_id,
        templates = templates.len(),
        edges = edges.len(),
        "loaded template reference graph"
    );
    Ok(find_subprocess_cycle(
        tree,
        current_template_id,
        &ReferenceGraph::from_edges(edges),
    ))
}
