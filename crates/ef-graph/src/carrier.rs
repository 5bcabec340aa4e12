//! Energy carriers and their physical constants.

use ef_core::{CarrierId, Real};
use serde::{Deserialize, Serialize};

/// An energy carrier (electricity, natural gas, useable heat, ...).
///
/// Carriers are immutable within a calculation: their constants feed the
/// recursive factor engine but are never written back.
#[derive(Debug, Clone, PartialEq)]
pub struct Carrier {
    pub id: CarrierId,
    pub key: String,
    /// Emitted CO2 per MJ of this carrier.
    pub co2_per_mj: Real,
    /// CO2 that would be emitted per MJ if no capture took place.
    pub potential_co2_per_mj: Real,
    /// Cost per MJ of this carrier.
    pub cost_per_mj: Real,
    /// Share of this carrier counted as sustainable, 0.0 to 1.0.
    pub sustainable: Real,
    /// Carriers with an unbounded source, such as sun or wind.
    pub infinite: bool,
    /// Marks the loss carrier: energy leaving the system.
    pub loss: bool,
}

/// Configuration record for one carrier, as handed in by the topology
/// loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CarrierSpec {
    pub key: String,
    #[serde(default)]
    pub co2_per_mj: Real,
    #[serde(default)]
    pub potential_co2_per_mj: Real,
    #[serde(default)]
    pub cost_per_mj: Real,
    #[serde(default)]
    pub sustainable: Real,
    #[serde(default)]
    pub infinite: bool,
    #[serde(default)]
    pub loss: bool,
}

impl CarrierSpec {
    /// A spec with the given key and all constants zeroed.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            co2_per_mj: 0.0,
            potential_co2_per_mj: 0.0,
            cost_per_mj: 0.0,
            sustainable: 0.0,
            infinite: false,
            loss: false,
        }
    }

    /// The conventional loss carrier.
    pub fn loss() -> Self {
        Self {
            loss: true,
            ..Self::new("loss")
        }
    }
}
