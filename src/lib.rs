//! # Pipeline Preview - Pipeline Tree Simplification Engine
//!
//! **pipeline-preview** computes what a pipeline tree looks like once some of its optional
//! task nodes are skipped. Skipped activities are spliced out of the graph, parallel
//! gateway pairs left with nothing between them are collapsed, and the variables no
//! remaining node refers to are pruned. A separate check finds subprocess templates that
//! would end up embedding themselves.
//!
//! ## Core Workflow
//!
//! The engine works on an in-memory arena model of a pipeline tree. The primary workflow is:
//!
//! 1.  **Load the Tree**: Parse the pipeline tree JSON document, or your own template format,
//!     into a [`tree::PipelineTree`] through the [`tree::IntoPipelineTree`] trait.
//! 2.  **Choose Exclusions**: Pass node ids directly, or resolve them from execution schemes
//!     or an appoint list with the functions in [`preview::exclusion`].
//! 3.  **Preview**: Build a [`preview::Previewer`] with [`preview::PreviewerBuilder`] and run it.
//!     The tree is mutated in place.
//! 4.  **Write Back**: Convert the tree back into the JSON document with
//!     [`tree::PipelineTree::to_json`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pipeline_preview::prelude::*;
//! use pipeline_preview::preview::excluded_by_appoint;
//!
//! fn main() -> Result<()> {
//!     let document = std::fs::read_to_string("path/to/pipeline_tree.json")?;
//!     let mut tree = document.as_str().into_pipeline_tree()?;
//!
//!     // Run only the two appointed nodes, skipping every other optional one.
//!     let exclude = excluded_by_appoint(&tree, &["node_a", "node_b"]);
//!
//!     let previewer = Previewer::builder()
//!         .remove_outputs_without_refs(false)
//!         .build();
//!     previewer.preview(&mut tree, &exclude)?;
//!
//!     println!("{}", serde_json::to_string_pretty(&tree.to_json()?)?);
//!     Ok(())
//! }
//! ```

pub mod cycle;
pub mod error;
pub mod prelude;
pub mod preview;
pub mod store;
pub mod tree;
