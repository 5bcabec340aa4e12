use ef_graph::GraphError;
use thiserror::Error;

pub type FactorResult<T> = Result<T, FactorError>;

#[derive(Error, Debug)]
pub enum FactorError {
    /// The traversal revisited a node on the same path. Built graphs are
    /// acyclic, so this only fires for topologies assembled outside the
    /// builder's validation.
    #[error("Recursive traversal revisited node {node}")]
    CycleDetected { node: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}
