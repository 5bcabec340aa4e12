//! Heat participants: consumers, storage and producers.
//!
//! All participants are ephemeral per-run value objects working in MW per
//! frame and MWh totals; adapters convert to the graph's MJ domain on
//! injection.

use ef_core::{Curve, Real, guarded_div};

/// One heat consumer with an hourly demand curve.
#[derive(Debug, Clone)]
pub struct HeatConsumer {
    pub key: String,
    demand: Curve,
}

impl HeatConsumer {
    pub fn new(key: impl Into<String>, demand: Curve) -> Self {
        Self {
            key: key.into(),
            demand,
        }
    }

    pub fn demand_at(&self, frame: usize) -> Real {
        self.demand.get(frame)
    }

    pub fn demand_curve(&self) -> &Curve {
        &self.demand
    }

    /// Yearly demand, MWh.
    pub fn total_demand(&self) -> Real {
        self.demand.sum()
    }
}

/// A bounded heat reserve.
///
/// The reserve refills from an optional charge curve at the start of each
/// frame and drains on request, capped by its discharge capacity.
#[derive(Debug, Clone)]
pub struct HeatStorage {
    pub key: String,
    /// Storable energy, MWh.
    pub volume: Real,
    /// Maximum discharge per frame, MW.
    pub output_capacity: Real,
    charge: Option<Curve>,
    level: Real,
    input: Curve,
    output: Curve,
    levels: Curve,
}

impl HeatStorage {
    pub fn new(key: impl Into<String>, volume: Real, output_capacity: Real) -> Self {
        Self {
            key: key.into(),
            volume,
            output_capacity,
            charge: None,
            level: 0.0,
            input: Curve::zeroes(),
            output: Curve::zeroes(),
            levels: Curve::zeroes(),
        }
    }

    /// Attach the curve feeding this reserve (e.g. solar thermal output).
    pub fn with_charge_curve(mut self, charge: Curve) -> Self {
        self.charge = Some(charge);
        self
    }

    pub fn request(&mut self, frame: usize, amount: Real) -> Real {
        if let Some(charge) = &self.charge {
            let room = (self.volume - self.level).max(0.0);
            let stored = charge.get(frame).min(room).max(0.0);
            self.level += stored;
            self.input.set(frame, stored);
        }

        let delivered = amount.min(self.level).min(self.output_capacity).max(0.0);
        self.level -= delivered;
        self.output.set(frame, delivered);
        self.levels.set(frame, self.level);
        delivered
    }

    pub fn level(&self) -> Real {
        self.level
    }

    pub fn input_curve(&self) -> &Curve {
        &self.input
    }

    pub fn output_curve(&self) -> &Curve {
        &self.output
    }

    /// Reserve level after each frame.
    pub fn level_curve(&self) -> &Curve {
        &self.levels
    }
}

/// How a producer's per-frame output capacity and input draw are derived.
#[derive(Debug, Clone)]
enum Behavior {
    /// Fixed thermal capacity and conversion efficiency.
    Constant { efficiency: Real },
    /// Output capacity scales with an hourly coefficient of performance
    /// (heat pumps: capacity is the electrical input side).
    VariableEfficiency { cop: Curve },
    /// Follows another node's realized output curve instead of demand.
    OutputDriven { source: Curve, conversion: Real },
}

/// A heat producer.
#[derive(Debug, Clone)]
pub struct HeatProducer {
    pub key: String,
    /// Capacity per unit, MW. Thermal output for constant producers,
    /// electrical input for variable-efficiency ones.
    pub capacity_per_unit: Real,
    pub units: Real,
    behavior: Behavior,
    load: Curve,
    input: Curve,
}

impl HeatProducer {
    pub fn constant(
        key: impl Into<String>,
        capacity_per_unit: Real,
        units: Real,
        efficiency: Real,
    ) -> Self {
        Self {
            key: key.into(),
            capacity_per_unit,
            units,
            behavior: Behavior::Constant { efficiency },
            load: Curve::zeroes(),
            input: Curve::zeroes(),
        }
    }

    pub fn variable_efficiency(
        key: impl Into<String>,
        input_capacity_per_unit: Real,
        units: Real,
        cop: Curve,
    ) -> Self {
        Self {
            key: key.into(),
            capacity_per_unit: input_capacity_per_unit,
            units,
            behavior: Behavior::VariableEfficiency { cop },
            load: Curve::zeroes(),
            input: Curve::zeroes(),
        }
    }

    pub fn output_driven(key: impl Into<String>, source: Curve, conversion: Real) -> Self {
        Self {
            key: key.into(),
            capacity_per_unit: 0.0,
            units: 0.0,
            behavior: Behavior::OutputDriven { source, conversion },
            load: Curve::zeroes(),
            input: Curve::zeroes(),
        }
    }

    /// Heat this producer could put out in a frame, MW.
    pub fn available_at(&self, frame: usize) -> Real {
        match &self.behavior {
            Behavior::Constant { .. } => self.capacity_per_unit * self.units,
            Behavior::VariableEfficiency { cop } => {
                self.capacity_per_unit * self.units * cop.get(frame)
            }
            Behavior::OutputDriven { source, conversion } => source.get(frame) * conversion,
        }
    }

    /// Satisfy up to `amount` of remaining demand; returns the delivered
    /// heat and records the matching input draw.
    pub fn request(&mut self, frame: usize, amount: Real) -> Real {
        let delivered = amount.min(self.available_at(frame)).max(0.0);
        self.load.set(frame, delivered);

        let input = match &self.behavior {
            Behavior::Constant { efficiency } => guarded_div(delivered, *efficiency),
            Behavior::VariableEfficiency { cop } => guarded_div(delivered, cop.get(frame)),
            Behavior::OutputDriven { conversion, .. } => guarded_div(delivered, *conversion),
        };
        self.input.set(frame, input);
        delivered
    }

    pub fn load(&self) -> &Curve {
        &self.load
    }

    /// The producer's primary input draw (fuel, electricity or source
    /// carrier), MW per frame.
    pub fn input_curve(&self) -> &Curve {
        &self.input
    }

    /// Realized yearly heat production, MWh.
    pub fn production(&self) -> Real {
        self.load.sum()
    }

    pub fn total_input(&self) -> Real {
        self.input.sum()
    }

    /// Realized mean efficiency: production over input.
    pub fn realized_efficiency(&self) -> Real {
        guarded_div(self.production(), self.total_input())
    }

    pub fn realized_full_load_hours(&self) -> Real {
        guarded_div(self.production(), self.capacity_per_unit * self.units)
    }
}

/// Exactly two underlying producers behaving as one: the primary is asked
/// first, the secondary covers what is left.
#[derive(Debug, Clone)]
pub struct HybridProducer {
    pub key: String,
    pub primary: HeatProducer,
    pub secondary: HeatProducer,
}

impl HybridProducer {
    pub fn new(key: impl Into<String>, primary: HeatProducer, secondary: HeatProducer) -> Self {
        Self {
            key: key.into(),
            primary,
            secondary,
        }
    }

    pub fn request(&mut self, frame: usize, amount: Real) -> Real {
        let first = self.primary.request(frame, amount);
        let second = self.secondary.request(frame, amount - first);
        first + second
    }

    /// Realized shares of total output, (primary, secondary).
    pub fn output_split(&self) -> (Real, Real) {
        let total = self.primary.production() + self.secondary.production();
        (
            guarded_div(self.primary.production(), total),
            guarded_div(self.secondary.production(), total),
        )
    }

    pub fn production(&self) -> Real {
        self.primary.production() + self.secondary.production()
    }

    pub fn total_input(&self) -> Real {
        self.primary.total_input() + self.secondary.total_input()
    }
}

/// One entry in a group's ordered participant list.
#[derive(Debug, Clone)]
pub enum HeatParticipant {
    Storage(HeatStorage),
    Producer(HeatProducer),
    Hybrid(HybridProducer),
}

impl HeatParticipant {
    pub fn key(&self) -> &str {
        match self {
            HeatParticipant::Storage(s) => &s.key,
            HeatParticipant::Producer(p) => &p.key,
            HeatParticipant::Hybrid(h) => &h.key,
        }
    }

    pub fn request(&mut self, frame: usize, amount: Real) -> Real {
        match self {
            HeatParticipant::Storage(s) => s.request(frame, amount),
            HeatParticipant::Producer(p) => p.request(frame, amount),
            HeatParticipant::Hybrid(h) => h.request(frame, amount),
        }
    }
}
