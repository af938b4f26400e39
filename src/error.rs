use crate::store::SchemeId;
use itertools::Itertools;
use thiserror::Error;

/// Errors raised by the preview transform and the exclusion resolver.
///
/// Every variant is a caller error: the request carried an id the tree does not
/// know, asked to skip a forced node, or referenced stored data that is gone.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreviewError {
    #[error("task node[id={0}] is not in template pipeline tree")]
    UnknownNode(String),

    #[error("task node[id={0}] is not optional")]
    NotOptional(String),

    #[error("not all input scheme ids exist: {}", .missing.iter().join(", "))]
    SchemeNotFound { missing: Vec<SchemeId> },

    #[error("Pipeline tree is malformed at node '{node_id}': {message}")]
    MalformedTree { node_id: String, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors surfaced by scheme and template storage lookups.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Stored record '{0}' not found")]
    NotFound(String),

    #[error("Failed to load store data: {0}")]
    Load(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors that can occur when converting a pipeline-tree document into a `PipelineTree`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeConversionError {
    #[error("Failed to parse pipeline tree JSON: {0}")]
    JsonParseError(String),

    #[error("Node id '{0}' is declared more than once")]
    DuplicateNode(String),

    #[error("Node is stored under key '{key}' but declares id '{id}'")]
    IdMismatch { key: String, id: String },

    #[error("Pipeline tree has no {0} event with an id")]
    MissingEvent(&'static str),
}

/// Canvas metadata could not be kept in step with the graph.
///
/// Canvas data has no execution semantics, so callers log these and move on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CanvasError {
    #[error("No canvas location for node '{0}'")]
    MissingLocation(String),

    #[error("No canvas line for flow '{0}'")]
    MissingLine(String),

    #[error("Canvas line '{0}' has no target endpoint")]
    MissingLineTarget(String),
}
