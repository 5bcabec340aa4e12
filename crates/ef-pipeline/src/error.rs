use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Unified error for the orchestrator, wrapping each calculator's own
/// error type.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The resolver was asked to resolve an already-resolved graph.
    #[error("Graph has already been time-resolved")]
    AlreadyResolved,

    #[error(transparent)]
    Dispatch(#[from] ef_dispatch::DispatchError),

    #[error(transparent)]
    Heat(#[from] ef_heat::HeatError),

    #[error(transparent)]
    Balance(#[from] ef_balance::BalanceError),

    #[error(transparent)]
    Factor(#[from] ef_factors::FactorError),

    #[error(transparent)]
    Graph(#[from] ef_graph::GraphError),

    #[error(transparent)]
    Core(#[from] ef_core::CoreError),
}
