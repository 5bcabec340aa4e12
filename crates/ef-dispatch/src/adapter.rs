//! Node to participant adapters and result injection.

use ef_core::{CurveProvider, Real, units};
use ef_graph::{Attr, CurveKey, Graph};
use serde::{Deserialize, Serialize};

use crate::error::DispatchResult;
use crate::order::MeritOrder;
use crate::participant::{Consumer, Producer};

/// Typed configuration record for one dispatch participant, keyed by node.
///
/// The tag set is closed: an unknown participant type fails to deserialize
/// instead of reaching a string-keyed branch at calculation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum DispatchConfig {
    Dispatchable {
        /// Output capacity per unit, MW.
        capacity: Real,
        availability: Real,
        /// Cost per MWh produced.
        marginal_costs: Real,
        #[serde(default)]
        fixed_costs_per_unit: Real,
    },
    MustRun {
        capacity: Real,
        full_load_hours: Real,
        profile: String,
    },
    Volatile {
        capacity: Real,
        full_load_hours: Real,
        profile: String,
    },
    Consumer {
        /// Yearly consumption, MWh.
        total_consumption: Real,
        profile: String,
    },
}

/// A constructed participant, ready to be added to a [`MeritOrder`].
#[derive(Debug, Clone)]
pub enum MeritParticipant {
    Producer(Producer),
    Consumer(Consumer),
}

/// Build a participant from a node's static attributes plus its
/// configuration record. The unit count comes from the node.
pub fn participant_from_config(
    graph: &Graph,
    node_key: &str,
    config: &DispatchConfig,
    curves: &dyn CurveProvider,
) -> DispatchResult<MeritParticipant> {
    let node = graph.node(node_key)?;
    let units = node.units;

    let participant = match config {
        DispatchConfig::Dispatchable {
            capacity,
            availability,
            marginal_costs,
            fixed_costs_per_unit,
        } => MeritParticipant::Producer(
            Producer::dispatchable(node_key, *capacity, units, *availability, *marginal_costs)
                .with_fixed_costs(*fixed_costs_per_unit),
        ),
        DispatchConfig::MustRun {
            capacity,
            full_load_hours,
            profile,
        } => MeritParticipant::Producer(Producer::must_run(
            node_key,
            *capacity,
            units,
            *full_load_hours,
            curves.named_curve(profile)?,
        )),
        DispatchConfig::Volatile {
            capacity,
            full_load_hours,
            profile,
        } => MeritParticipant::Producer(Producer::volatile(
            node_key,
            *capacity,
            units,
            *full_load_hours,
            curves.named_curve(profile)?,
        )),
        DispatchConfig::Consumer {
            total_consumption,
            profile,
        } => MeritParticipant::Consumer(Consumer::profiled(
            node_key,
            *total_consumption,
            curves.named_curve(profile)?,
        )),
    };
    Ok(participant)
}

/// Write realized dispatch results back onto the graph.
///
/// Scalars land directly; load curves are written lazily so the MW-to-MJ
/// conversion is only paid if something reads the curve back.
pub fn inject_results(
    graph: &mut Graph,
    order: &MeritOrder,
    carrier_key: &str,
) -> DispatchResult<()> {
    let carrier = graph.carrier_id(carrier_key)?;
    // One MW sustained over one frame is one MWh.
    let mj_per_mwh = units::mwh_to_mj(1.0);

    for producer in order.producers() {
        let report = order.report(&producer.key)?;
        let node = graph.node_id(&producer.key)?;

        graph.set_attr(node, Attr::Demand, units::mwh_to_mj(report.production));
        graph.set_attr(node, Attr::FullLoadHours, report.full_load_hours);
        graph.set_attr(node, Attr::MarginalCosts, report.marginal_costs);
        graph.set_attr(node, Attr::ProfitPerUnit, report.profit_per_unit);
        graph.set_attr(node, Attr::NumberOfUnits, producer.units);

        let load = producer.load().clone();
        graph.set_node_curve_lazy(node, CurveKey::CarrierOutput(carrier), move || {
            load.scaled(mj_per_mwh)
        });
    }

    for consumer in order.consumers() {
        let node = graph.node_id(&consumer.key)?;
        let demand = consumer.demand_curve();
        graph.set_attr(node, Attr::Demand, units::mwh_to_mj(demand.sum()));
        graph.set_node_curve_lazy(node, CurveKey::CarrierInput(carrier), move || {
            demand.scaled(mj_per_mwh)
        });
    }

    tracing::debug!(carrier = carrier_key, "injected dispatch results");
    Ok(())
}
