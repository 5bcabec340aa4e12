//! The balance calculator.

use ef_core::{Curve, CurveProvider, FRAMES_PER_YEAR, Real, units};
use ef_graph::{Attr, CurveKey, Graph};

use crate::error::{BalanceError, BalanceResult};
use crate::participant::{BalanceParticipant, Role};

/// Surpluses smaller than this are floating-point noise and read as zero.
const SURPLUS_EPSILON: Real = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    StaticReady,
    DynamicReady,
    Computed,
}

/// Derived hourly results for one balanced carrier.
#[derive(Debug, Clone)]
pub struct BalanceResults {
    /// supply - demand per frame, noise-rounded.
    pub surplus: Curve,
    /// Running sum of the surplus.
    pub cumulative: Curve,
    /// Storage volume needed to absorb the cumulative swing, MWh.
    pub required_volume: Real,
    pub storage_in: Curve,
    pub storage_out: Curve,
    /// Reserve level after each frame; non-negative everywhere.
    pub storage_level: Curve,
    /// Imbalance the storage could not absorb, closed by import.
    pub import: Curve,
    /// Excess the storage could not hold, closed by export.
    pub export: Curve,
}

/// Balances one carrier across its participants.
#[derive(Debug)]
pub struct BalanceCalculator {
    pub carrier: String,
    participants: Vec<BalanceParticipant>,
    supply: Curve,
    demand: Curve,
    phase: Phase,
    results: Option<BalanceResults>,
}

impl BalanceCalculator {
    pub fn new(carrier: impl Into<String>) -> Self {
        Self {
            carrier: carrier.into(),
            participants: Vec::new(),
            supply: Curve::zeroes(),
            demand: Curve::zeroes(),
            phase: Phase::Created,
            results: None,
        }
    }

    pub fn add_participant(&mut self, participant: BalanceParticipant) {
        self.participants.push(participant);
    }

    pub fn participants(&self) -> &[BalanceParticipant] {
        &self.participants
    }

    /// Resolve every curve derivable from yearly totals.
    pub fn setup_static(&mut self, curves: &dyn CurveProvider) -> BalanceResult<()> {
        for participant in &mut self.participants {
            let Some(source) = &participant.source else {
                continue;
            };
            if let crate::participant::CurveSourceConfig::Profiled { total, profile } = source {
                let scale = *total * participant.conversion;
                participant.curve = Some(curves.named_curve(profile)?.scaled(scale));
            }
        }
        self.phase = Phase::StaticReady;
        Ok(())
    }

    /// Resolve curves that read other calculators' realized results back
    /// off the graph. Must run after the frame loop.
    pub fn setup_dynamic(&mut self, graph: &mut Graph) -> BalanceResult<()> {
        if self.phase != Phase::StaticReady {
            return Err(BalanceError::NotYetCalculated {
                carrier: self.carrier.clone(),
                what: "static setup",
            });
        }
        for participant in &mut self.participants {
            let Some(source) = &participant.source else {
                continue;
            };
            if !source.is_static() {
                let resolved = source.resolve_dynamic(graph)?;
                participant.curve = Some(resolved.scaled(participant.conversion));
            }
        }
        self.phase = Phase::DynamicReady;
        Ok(())
    }

    /// Derive surplus, storage and import/export curves.
    pub fn compute(&mut self) -> BalanceResult<()> {
        if self.phase != Phase::DynamicReady {
            return Err(BalanceError::NotYetCalculated {
                carrier: self.carrier.clone(),
                what: "dynamic setup",
            });
        }

        self.supply = Curve::zeroes();
        self.demand = Curve::zeroes();
        for participant in &self.participants {
            let Some(curve) = participant.curve() else {
                continue;
            };
            if participant.is_supply() {
                self.supply.add_curve(curve);
            } else if participant.role == Role::Consumer {
                self.demand.add_curve(curve);
            }
        }

        let mut surplus = Curve::zeroes();
        for frame in 0..FRAMES_PER_YEAR {
            let mut value = self.supply.get(frame) - self.demand.get(frame);
            if value.abs() < SURPLUS_EPSILON {
                value = 0.0;
            }
            surplus.set(frame, value);
        }
        let cumulative = surplus.cumulative();

        // The swing of the cumulative surplus, shifted non-negative, is the
        // volume a single storage would need to absorb everything.
        let low = cumulative.min().min(0.0);
        let high = cumulative.max().max(0.0);
        let required_volume = high - low;

        let volume = self
            .participants
            .iter()
            .find(|p| p.role == Role::Storage)
            .map(|storage| storage.volume.unwrap_or(required_volume))
            .unwrap_or(0.0);

        let mut storage_in = Curve::zeroes();
        let mut storage_out = Curve::zeroes();
        let mut storage_level = Curve::zeroes();
        let mut import = Curve::zeroes();
        let mut export = Curve::zeroes();

        // Start the reserve where the cumulative trough bottoms out so a
        // sufficiently large storage never runs dry mid-year.
        let mut level = (-low).clamp(0.0, volume);
        for frame in 0..FRAMES_PER_YEAR {
            let value = surplus.get(frame);
            if value > 0.0 {
                let stored = value.min(volume - level);
                level += stored;
                storage_in.set(frame, stored);
                export.set(frame, value - stored);
            } else if value < 0.0 {
                let drawn = (-value).min(level);
                level -= drawn;
                storage_out.set(frame, drawn);
                import.set(frame, -value - drawn);
            }
            storage_level.set(frame, level);
        }

        tracing::debug!(
            carrier = %self.carrier,
            required_volume,
            imported = import.sum(),
            exported = export.sum(),
            "balance computed"
        );

        self.results = Some(BalanceResults {
            surplus,
            cumulative,
            required_volume,
            storage_in,
            storage_out,
            storage_level,
            import,
            export,
        });
        self.phase = Phase::Computed;
        Ok(())
    }

    /// The derived results. Only available after `compute`.
    pub fn results(&self) -> BalanceResult<&BalanceResults> {
        self.results
            .as_ref()
            .ok_or_else(|| BalanceError::NotYetCalculated {
                carrier: self.carrier.clone(),
                what: "results",
            })
    }

    pub fn supply_curve(&self) -> &Curve {
        &self.supply
    }

    pub fn demand_curve(&self) -> &Curve {
        &self.demand
    }

    /// Write storage and import/export results back onto the graph.
    pub fn inject(&self, graph: &mut Graph) -> BalanceResult<()> {
        let results = self.results()?;
        let carrier = graph.carrier_id(&self.carrier)?;
        let mj_per_mwh = units::mwh_to_mj(1.0);

        for participant in &self.participants {
            let node = graph.node_id(&participant.key)?;
            match participant.role {
                Role::Storage => {
                    let volume = participant.volume.unwrap_or(results.required_volume);
                    graph.set_attr(node, Attr::StorageVolume, units::mwh_to_mj(volume));
                    let level = results.storage_level.clone();
                    graph.set_node_curve_lazy(node, CurveKey::Storage, move || {
                        level.scaled(mj_per_mwh)
                    });
                }
                Role::Import => {
                    graph.set_attr(node, Attr::Demand, units::mwh_to_mj(results.import.sum()));
                    let curve = results.import.clone();
                    graph.set_node_curve_lazy(node, CurveKey::CarrierOutput(carrier), move || {
                        curve.scaled(mj_per_mwh)
                    });
                }
                Role::Export => {
                    graph.set_attr(node, Attr::Demand, units::mwh_to_mj(results.export.sum()));
                    let curve = results.export.clone();
                    graph.set_node_curve_lazy(node, CurveKey::CarrierInput(carrier), move || {
                        curve.scaled(mj_per_mwh)
                    });
                }
                Role::Consumer | Role::Producer | Role::Transformation => {
                    let Some(curve) = participant.curve() else {
                        continue;
                    };
                    let key = if participant.is_supply() {
                        CurveKey::CarrierOutput(carrier)
                    } else {
                        CurveKey::CarrierInput(carrier)
                    };
                    graph.set_attr(node, Attr::Demand, units::mwh_to_mj(curve.sum()));
                    let curve = curve.clone();
                    graph.set_node_curve_lazy(node, key, move || curve.scaled(mj_per_mwh));
                }
            }
        }
        Ok(())
    }
}
