//! ef-heat: hourly heat-demand satisfaction per named group.
//!
//! Each group (space heating, hot water, ...) matches one consumer — or a
//! synthetic consumer aggregating several — against an ordered list of
//! storage and producer participants. Per frame, storage and producers are
//! asked in order to satisfy the consumer's remaining demand.
//!
//! Specialized producers: variable-efficiency (COP driven by an hourly
//! temperature curve), hybrid (two underlying producers whose realized
//! output split re-balances the node's slot conversions), and
//! output-driven converters that follow another node's realized output
//! curve rather than their own demand.

pub mod adapter;
pub mod error;
pub mod group;
pub mod participant;

pub use adapter::{HeatConfig, HeatUnit, inject_results, participant_from_config};
pub use error::{HeatError, HeatResult};
pub use group::{HeatGroup, allocate_shares};
pub use participant::{
    HeatConsumer, HeatParticipant, HeatProducer, HeatStorage, HybridProducer,
};
