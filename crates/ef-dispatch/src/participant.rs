//! Dispatch participants.
//!
//! Participants are ephemeral per-calculation value objects: adapters build
//! them from graph nodes at the start of a time-resolution run and they are
//! discarded at the end.

use ef_core::{Curve, Real, guarded_div};
use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, DispatchResult};

/// How a producer takes part in dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProducerKind {
    /// Price-sorted; loaded on demand up to available capacity.
    Dispatchable,
    /// Pinned to a predetermined production profile (e.g. CHPs).
    MustRun,
    /// Pinned to a weather-driven profile (e.g. wind, solar).
    Volatile,
}

/// Post-run classification of a producer's economics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profitability {
    /// Revenue covers operating and fixed costs.
    Profitable,
    /// Revenue covers operating costs but not fixed costs.
    Conditional,
    /// Revenue does not even cover operating costs.
    Unprofitable,
}

/// An electricity (or heat-network) producer.
#[derive(Debug, Clone)]
pub struct Producer {
    pub key: String,
    pub kind: ProducerKind,
    /// Output capacity per installed unit, MW.
    pub capacity_per_unit: Real,
    pub units: Real,
    /// Fraction of capacity available for dispatch, 0.0 to 1.0.
    pub availability: Real,
    /// Cost per MWh produced.
    pub marginal_costs: Real,
    /// Yearly fixed costs per installed unit.
    pub fixed_costs_per_unit: Real,
    /// Production profile for pinned producers, normalized to sum 1.0.
    profile: Option<Curve>,
    /// Pinned yearly full-load hours for must-run/volatile producers.
    pub full_load_hours: Option<Real>,
    load: Curve,
}

impl Producer {
    pub fn dispatchable(
        key: impl Into<String>,
        capacity_per_unit: Real,
        units: Real,
        availability: Real,
        marginal_costs: Real,
    ) -> Self {
        Self {
            key: key.into(),
            kind: ProducerKind::Dispatchable,
            capacity_per_unit,
            units,
            availability,
            marginal_costs,
            fixed_costs_per_unit: 0.0,
            profile: None,
            full_load_hours: None,
            load: Curve::zeroes(),
        }
    }

    pub fn must_run(
        key: impl Into<String>,
        capacity_per_unit: Real,
        units: Real,
        full_load_hours: Real,
        profile: Curve,
    ) -> Self {
        Self {
            key: key.into(),
            kind: ProducerKind::MustRun,
            capacity_per_unit,
            units,
            availability: 1.0,
            marginal_costs: 0.0,
            fixed_costs_per_unit: 0.0,
            profile: Some(profile),
            full_load_hours: Some(full_load_hours),
            load: Curve::zeroes(),
        }
    }

    pub fn volatile(
        key: impl Into<String>,
        capacity_per_unit: Real,
        units: Real,
        full_load_hours: Real,
        profile: Curve,
    ) -> Self {
        Self {
            kind: ProducerKind::Volatile,
            ..Self::must_run(key, capacity_per_unit, units, full_load_hours, profile)
        }
    }

    pub fn with_fixed_costs(mut self, fixed_costs_per_unit: Real) -> Self {
        self.fixed_costs_per_unit = fixed_costs_per_unit;
        self
    }

    /// Capacity available for dispatch, MW.
    pub fn available_capacity(&self) -> Real {
        self.capacity_per_unit * self.units * self.availability
    }

    /// Installed capacity ignoring availability, MW.
    pub fn installed_capacity(&self) -> Real {
        self.capacity_per_unit * self.units
    }

    /// The most a producer can put out in a frame, MW.
    ///
    /// Pinned producers produce exactly this; dispatchables at most this.
    pub fn max_load_at(&self, frame: usize) -> Real {
        match self.kind {
            ProducerKind::Dispatchable => self.available_capacity(),
            ProducerKind::MustRun | ProducerKind::Volatile => {
                let production =
                    self.full_load_hours.unwrap_or(0.0) * self.capacity_per_unit * self.units;
                match &self.profile {
                    Some(profile) => production * profile.get(frame),
                    None => 0.0,
                }
            }
        }
    }

    pub(crate) fn set_load(&mut self, frame: usize, value: Real) {
        self.load.set(frame, value);
    }

    pub fn load_at(&self, frame: usize) -> Real {
        self.load.get(frame)
    }

    pub fn load(&self) -> &Curve {
        &self.load
    }

    /// Realized yearly production, MWh.
    pub fn production(&self) -> Real {
        self.load.sum()
    }

    /// Realized production over installed capacity, in hours.
    pub fn realized_full_load_hours(&self) -> Real {
        guarded_div(self.production(), self.installed_capacity())
    }

    pub fn revenue(&self, price: &Curve) -> Real {
        self.load
            .iter()
            .zip(price.iter())
            .map(|(load, price)| load * price)
            .sum()
    }

    pub fn operating_costs(&self) -> Real {
        self.marginal_costs * self.production()
    }

    pub fn total_costs(&self) -> Real {
        self.operating_costs() + self.fixed_costs_per_unit * self.units
    }

    pub fn profitability(&self, price: &Curve) -> Profitability {
        let revenue = self.revenue(price);
        if revenue >= self.total_costs() {
            Profitability::Profitable
        } else if revenue >= self.operating_costs() {
            Profitability::Conditional
        } else {
            Profitability::Unprofitable
        }
    }
}

/// A dispatch consumer: total yearly consumption spread over a profile, or
/// an explicit hourly curve.
#[derive(Debug, Clone)]
pub struct Consumer {
    pub key: String,
    source: DemandSource,
}

#[derive(Debug, Clone)]
enum DemandSource {
    /// Yearly total (MWh) spread over a profile normalized to sum 1.0.
    Profiled { total: Real, profile: Curve },
    Fixed(Curve),
}

impl Consumer {
    pub fn profiled(key: impl Into<String>, total: Real, profile: Curve) -> Self {
        Self {
            key: key.into(),
            source: DemandSource::Profiled { total, profile },
        }
    }

    pub fn from_curve(key: impl Into<String>, curve: Curve) -> Self {
        Self {
            key: key.into(),
            source: DemandSource::Fixed(curve),
        }
    }

    pub fn demand_at(&self, frame: usize) -> Real {
        match &self.source {
            DemandSource::Profiled { total, profile } => total * profile.get(frame),
            DemandSource::Fixed(curve) => curve.get(frame),
        }
    }

    /// Materialize the full demand curve, MW.
    pub fn demand_curve(&self) -> Curve {
        match &self.source {
            DemandSource::Profiled { total, profile } => profile.scaled(*total),
            DemandSource::Fixed(curve) => curve.clone(),
        }
    }

    /// Yearly consumption, MWh.
    pub fn total_consumption(&self) -> Real {
        self.demand_curve().sum()
    }
}

/// Reject participants whose numbers cannot be dispatched.
pub(crate) fn check_producer(producer: &Producer) -> DispatchResult<()> {
    if producer.capacity_per_unit < 0.0 || producer.units < 0.0 {
        return Err(DispatchError::InvalidParticipant {
            key: producer.key.clone(),
            what: "negative capacity or units",
        });
    }
    if !(0.0..=1.0).contains(&producer.availability) {
        return Err(DispatchError::InvalidParticipant {
            key: producer.key.clone(),
            what: "availability outside 0.0..=1.0",
        });
    }
    Ok(())
}
