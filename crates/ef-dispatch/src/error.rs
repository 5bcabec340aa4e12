use ef_core::CoreError;
use ef_graph::GraphError;
use thiserror::Error;

pub type DispatchResult<T> = Result<T, DispatchError>;

#[derive(Error, Debug)]
pub enum DispatchError {
    /// A result was requested before `calculate` ran. Distinct from a zero
    /// result on purpose.
    #[error("Merit order has not been calculated yet")]
    NotYetCalculated,

    #[error("Unknown producer: {key}")]
    UnknownProducer { key: String },

    #[error("Invalid participant {key}: {what}")]
    InvalidParticipant { key: String, what: &'static str },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
