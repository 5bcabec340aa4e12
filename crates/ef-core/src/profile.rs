//! Named-curve resolution.
//!
//! Calculator setup resolves profile names ("solar_pv", "air_temperature")
//! into hourly curves. The host supplies the resolver; [`CurveSet`] is the
//! in-memory implementation used directly and by the test suites. Profiles
//! that read a previously-computed curve back off a node ("self" profiles)
//! are resolved by the adapters, which have graph access.

use std::collections::HashMap;

use crate::curve::Curve;
use crate::error::{CoreError, CoreResult};

/// Resolves a profile name into an hourly curve.
pub trait CurveProvider {
    fn named_curve(&self, name: &str) -> CoreResult<Curve>;
}

/// In-memory curve store keyed by profile name.
#[derive(Debug, Clone, Default)]
pub struct CurveSet {
    curves: HashMap<String, Curve>,
}

impl CurveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a curve under a profile name, replacing any existing one.
    pub fn insert(&mut self, name: impl Into<String>, curve: Curve) {
        self.curves.insert(name.into(), curve);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.curves.contains_key(name)
    }
}

impl CurveProvider for CurveSet {
    fn named_curve(&self, name: &str) -> CoreResult<Curve> {
        self.curves
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::UnknownProfile {
                key: name.to_string(),
            })
    }
}
