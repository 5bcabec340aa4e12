use ef_core::CoreError;
use thiserror::Error;

pub type GraphResult<T> = Result<T, GraphError>;

/// Graph construction, validation and access errors.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Unknown node: {key}")]
    UnknownNode { key: String },

    #[error("Unknown carrier: {key}")]
    UnknownCarrier { key: String },

    #[error("Duplicate node key: {key}")]
    DuplicateNode { key: String },

    #[error("Duplicate carrier key: {key}")]
    DuplicateCarrier { key: String },

    #[error("Node {node} has no {direction} slot for carrier {carrier}")]
    MissingSlot {
        node: String,
        carrier: String,
        direction: &'static str,
    },

    #[error("Supply graph contains a cycle through node {node}")]
    CycleDetected { node: String },

    #[error("No retained dataset to restore")]
    NoRetainedDataset,

    #[error(transparent)]
    Core(#[from] CoreError),
}
