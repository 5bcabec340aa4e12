//! ef-pipeline: the time-resolution orchestrator.
//!
//! Sequences the heat, dispatch and balance calculators across the
//! 8760-frame loop and coordinates the two-phase graph recalculation:
//!
//! 1. clone the dataset and run the first aggregate pass,
//! 2. static setup for every stage,
//! 3. the frame loop, every frame in fixed stage order (heat groups, then
//!    the dispatch orders, then balancers),
//! 4. dynamic setup while loop-time state is still on the working dataset,
//! 5. restore the original yearly dataset,
//! 6. inject every stage's results onto it,
//! 7. run the second, final aggregate pass.
//!
//! The stage sequence is fixed at construction; there is no runtime hook
//! registration. Reading a dynamic-phase quantity before its phase ran
//! fails with an explicit "not yet calculated" error rather than zero.

pub mod error;
pub mod resolver;
pub mod stage;
pub mod stages;

pub use error::{PipelineError, PipelineResult};
pub use resolver::{Resolution, TimeResolver};
pub use stage::{Context, Stage};
pub use stages::{BalanceStage, DispatchStage, HeatStage};
