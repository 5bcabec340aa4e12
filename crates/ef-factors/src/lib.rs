//! ef-factors: the recursive factor engine.
//!
//! Derives aggregate quantities for any node by walking backwards along
//! input edges towards its ultimate suppliers, multiplying accumulated
//! weights and summing the contributions of every path. The walk stops when
//! a strategy function declares a node terminal, or at a node with no
//! further input edges.
//!
//! Two traversal variants exist:
//! - [`recursive_factor`] weights paths for extensive quantities (demands,
//!   emissions), compensating for supplier losses and over-unity output
//!   modeling;
//! - [`recursive_factor_without_losses`] propagates intensive quantities
//!   (costs, intensities, shares) where efficiency ratios on the path must
//!   not discount the propagated value.
//!
//! The derived metrics in [`metrics`] are thin strategy functions over
//! these primitives, memoized per node per dataset epoch.

pub mod error;
pub mod metrics;
pub mod traversal;

pub use error::{FactorError, FactorResult};
pub use metrics::{
    captured_emissions, dependent_supply_of, final_demand, inherited_captured_emissions,
    primary_co2_emission, primary_demand, primary_demand_of, sustainability_share, weighted_co2,
    weighted_cost,
};
pub use traversal::{
    Propagation, Strategy, domestic_dead_end, loss_output_compensation, recursive_factor,
    recursive_factor_without_losses, right_dead_end,
};
