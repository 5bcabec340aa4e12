//! ef-core: stable foundation for enerflow.
//!
//! Contains:
//! - curve (the fixed-length hourly curve type + arithmetic)
//! - profile (named-curve resolution for calculator setup)
//! - numeric (Real + tolerances + float helpers)
//! - ids (stable compact IDs for graph objects)
//! - units (uom SI types + constructors)
//! - error (shared error types)

pub mod curve;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod profile;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use curve::{Curve, FRAMES_PER_YEAR};
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use profile::{CurveProvider, CurveSet};
