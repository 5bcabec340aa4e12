use ef_core::CoreError;
use ef_graph::GraphError;
use thiserror::Error;

pub type BalanceResult<T> = Result<T, BalanceError>;

#[derive(Error, Debug)]
pub enum BalanceError {
    /// A phase ran out of order, or a result was read before its phase.
    /// Distinct from a zero result on purpose.
    #[error("Balance calculator for {carrier}: {what} not available yet")]
    NotYetCalculated {
        carrier: String,
        what: &'static str,
    },

    /// A dynamic participant references a node curve that was never
    /// computed.
    #[error("Node {key} has no realized curve for {carrier}")]
    MissingSourceCurve { key: String, carrier: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
