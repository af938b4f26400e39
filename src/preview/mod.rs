use crate::error::PreviewError;
use crate::tree::PipelineTree;
use serde::{Deserialize, Serialize};
use tracing::info;

mod collapse;
mod constants;
mod elision;
pub mod exclusion;
pub mod pairing;
pub mod refs;
pub mod report;

pub use collapse::collapse_parallel_gateways;
pub use constants::{prune_constants, reference_namespace, referenced_constants};
pub use elision::elide;
pub use exclusion::{excluded_by_appoint, excluded_by_schemes};
pub use pairing::{GatewayPairing, GatewayPairs, StructuralPairing};
pub use refs::{ReferenceExtractor, TokenExtractor};
pub use report::PreviewReport;

/// Tunables for a preview run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewOptions {
    /// Drop custom constants declared as outputs when nothing references them.
    pub remove_outputs_without_refs: bool,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            remove_outputs_without_refs: true,
        }
    }
}

/// Runs the preview passes over pipeline trees: elision, gateway collapse, and
/// constant pruning, in that order.
pub struct Previewer {
    pairing: Box<dyn GatewayPairing>,
    extractor: Box<dyn ReferenceExtractor>,
    options: PreviewOptions,
}

pub struct PreviewerBuilder {
    pairing: Box<dyn GatewayPairing>,
    extractor: Box<dyn ReferenceExtractor>,
    options: PreviewOptions,
}

impl PreviewerBuilder {
    pub fn new() -> Self {
        Self {
            pairing: Box::new(StructuralPairing),
            extractor: Box::new(TokenExtractor::new()),
            options: PreviewOptions::default(),
        }
    }
    pub fn with_options(mut self, options: PreviewOptions) -> Self {
        self.options = options;
        self
    }
    pub fn remove_outputs_without_refs(mut self, remove: bool) -> Self {
        self.options.remove_outputs_without_refs = remove;
        self
    }
    pub fn with_gateway_pairing(mut self, pairing: Box<dyn GatewayPairing>) -> Self {
        self.pairing = pairing;
        self
    }
    pub fn with_reference_extractor(mut self, extractor: Box<dyn ReferenceExtractor>) -> Self {
        self.extractor = extractor;
        self
    }
    pub fn build(self) -> Previewer {
        Previewer {
            pairing: self.pairing,
            extractor: self.extractor,
            options: self.options,
        }
    }
}

impl Default for PreviewerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Previewer {
    fn default() -> Self {
        PreviewerBuilder::new().build()
    }
}

impl Previewer {
    pub fn builder() -> PreviewerBuilder {
        PreviewerBuilder::new()
    }

    pub fn options(&self) -> PreviewOptions {
        self.options
    }

    /// Previews `tree` with `exclude_ids` skipped, using the configured options.
    pub fn preview<S: AsRef<str>>(
        &self,
        tree: &mut PipelineTree,
        exclude_ids: &[S],
    ) -> Result<bool, PreviewError> {
        self.preview_pipeline_tree_exclude_task_nodes(
            tree,
            exclude_ids,
            self.options.remove_outputs_without_refs,
        )
    }

    /// Removes the excluded activities, collapses the parallel gateways that became
    /// empty, and prunes the constants nothing refers to any more.
    ///
    /// Fails without touching the tree when an id is unknown or names a non-optional
    /// activity.
    pub fn preview_pipeline_tree_exclude_task_nodes<S: AsRef<str>>(
        &self,
        tree: &mut PipelineTree,
        exclude_ids: &[S],
        remove_outputs_without_refs: bool,
    ) -> Result<bool, PreviewError> {
        self.run(tree, exclude_ids, remove_outputs_without_refs)?;
        Ok(true)
    }

    /// Previews a template tree the way the template preview page shows it.
    ///
    /// Value-assign targets are protected from pruning for the duration of the run, and
    /// the report lists the template constants the preview dropped.
    pub fn preview_template_tree<S: AsRef<str>>(
        &self,
        tree: &mut PipelineTree,
        exclude_ids: &[S],
    ) -> Result<PreviewReport, PreviewError> {
        report::wrap_assignment_keys(tree);
        let result = self.run(tree, exclude_ids, self.options.remove_outputs_without_refs);
        report::unwrap_assignment_keys(tree);
        Ok(PreviewReport {
            constants_not_referred: result?,
        })
    }

    fn run<S: AsRef<str>>(
        &self,
        tree: &mut PipelineTree,
        exclude_ids: &[S],
        remove_outputs_without_refs: bool,
    ) -> Result<indexmap::IndexMap<String, crate::tree::Constant>, PreviewError> {
        let elided = elide(tree, exclude_ids)?;

        let pairs = self.pairing.find_gateway_pairs(tree);
        let collapsed = collapse_parallel_gateways(tree, &pairs)?;

        let dropped = prune_constants(
            tree,
            &elided,
            remove_outputs_without_refs,
            self.extractor.as_ref(),
        );

        info!(
            elided = elided.len(),
            gateways_removed = collapsed,
            constants_dropped = dropped.len(),
            "pipeline tree preview finished"
        );
        Ok(dropped)
    }
}

/// [`Previewer::preview_pipeline_tree_exclude_task_nodes`] with the default pairing and
/// reference extraction.
pub fn preview_pipeline_tree_exclude_task_nodes<S: AsRef<str>>(
    tree: &mut PipelineTree,
    exclude_ids: &[S],
    remove_outputs_without_refs: bool,
) -> Result<bool, PreviewError> {
    Previewer::default().preview_pipeline_tree_exclude_task_nodes(
        tree,
        exclude_ids,
        remove_outputs_without_refs,
    )
}

/// [`Previewer::preview_template_tree`] with default settings.
pub fn preview_template_tree<S: AsRef<str>>(
    tree: &mut PipelineTree,
    exclude_ids: &[S],
) -> Result<PreviewReport, PreviewError> {
    Previewer::default().preview_template_tree(tree, exclude_ids)
}
