//! ef-dispatch: economic dispatch ("merit order") for one carrier.
//!
//! Two algorithms coexist:
//! - [`MeritOrder`]: full stepwise dispatch. Dispatchable producers are
//!   sorted ascending by marginal cost and loaded frame by frame until
//!   consumer demand is met; must-run and volatile producers are pinned to
//!   their profiles. Yields per-producer load curves, full-load hours, a
//!   price curve and profitability figures.
//! - [`LoadDurationTable`]: the lighter-weight estimator. The residual
//!   load-duration curve is integrated (shoelace polygon area) between a
//!   producer's cumulative-capacity interval to estimate its capacity
//!   factor without simulating hours.
//!
//! The adapter layer converts graph nodes plus typed configuration records
//! into participants, and injects realized results back onto the graph.
//!
//! Loads and capacities are in MW, yearly totals in MWh; the adapters
//! convert to the graph's MJ domain at the boundary.

pub mod adapter;
pub mod error;
pub mod load_duration;
pub mod order;
pub mod participant;

pub use adapter::{DispatchConfig, MeritParticipant, inject_results, participant_from_config};
pub use error::{DispatchError, DispatchResult};
pub use load_duration::{
    CapacityFactorEstimate, LoadDurationTable, estimate_capacity_factors, residual_load,
};
pub use order::{MeritOrder, PRICE_MARKUP, ProducerReport};
pub use participant::{Consumer, Producer, ProducerKind, Profitability};
