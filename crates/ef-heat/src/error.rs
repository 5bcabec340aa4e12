use ef_core::CoreError;
use ef_graph::GraphError;
use thiserror::Error;

pub type HeatResult<T> = Result<T, HeatError>;

#[derive(Error, Debug)]
pub enum HeatError {
    /// A frame was computed before the group's setup ran.
    #[error("Heat group {group} has not been set up yet")]
    NotSetUp { group: String },

    #[error("Invalid heat participant {key}: {what}")]
    InvalidConfig { key: String, what: &'static str },

    /// An output-driven participant references a node curve that has not
    /// been computed yet.
    #[error("Node {key} has no realized output curve for {carrier}")]
    MissingSourceCurve { key: String, carrier: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
