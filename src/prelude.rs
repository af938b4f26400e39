//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits of the crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use pipeline_preview::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let document = std::fs::read_to_string("path/to/pipeline_tree.json")?;
//! let mut tree = document.as_str().into_pipeline_tree()?;
//!
//! let report = preview_template_tree(&mut tree, &["optional_node"])?;
//! println!("dropped constants: {:?}", report.constants_not_referred.keys());
//! # Ok(())
//! # }
//! ```

// Preview entry points
pub use crate::preview::{
    PreviewOptions, PreviewReport, Previewer, PreviewerBuilder,
    preview_pipeline_tree_exclude_task_nodes, preview_template_tree,
};

// Capabilities
pub use crate::preview::{GatewayPairing, ReferenceExtractor};
pub use crate::store::{SchemeStore, TemplateStore};

// Tree model
pub use crate::tree::{IntoPipelineTree, Node, PipelineTree};

// Cycle detection
pub use crate::cycle::{CycleReport, is_circular_reference};

// Error types
pub use crate::error::{PreviewError, StoreError, TreeConversionError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
