//! Node to participant adapters and result injection.

use ef_core::{CurveProvider, Real, units};
use ef_graph::{Attr, CurveKey, Direction, Graph};
use serde::{Deserialize, Serialize};

use crate::error::{HeatError, HeatResult};
use crate::group::HeatGroup;
use crate::participant::{
    HeatConsumer, HeatParticipant, HeatProducer, HeatStorage, HybridProducer,
};

/// Typed configuration record for one heat participant, keyed by node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum HeatConfig {
    Consumer {
        /// Yearly heat demand, MWh.
        demand: Real,
        profile: String,
    },
    Storage {
        /// Storable energy, MWh.
        volume: Real,
        /// Maximum discharge per frame, MW.
        output_capacity: Real,
        #[serde(default)]
        charge_profile: Option<String>,
    },
    Producer {
        /// Thermal output capacity per unit, MW.
        capacity: Real,
        efficiency: Real,
        input_carrier: String,
    },
    /// A heat-pump-like producer whose coefficient of performance follows
    /// an hourly temperature curve. The realized COP is back-applied to
    /// split the input between electricity and ambient heat.
    HeatPump {
        /// Electrical input capacity per unit, MW.
        capacity: Real,
        base_cop: Real,
        /// COP change per degree of source temperature.
        cop_slope: Real,
        reference_temperature: Real,
        temperature_profile: String,
        electricity_carrier: String,
        ambient_carrier: String,
    },
    /// Exactly two producer configurations composited into one node.
    Hybrid {
        primary: Box<HeatConfig>,
        secondary: Box<HeatConfig>,
    },
    /// Driven by another node's realized output curve rather than demand
    /// (electrolyser-like transformations).
    OutputDriven {
        source_node: String,
        source_carrier: String,
        conversion: Real,
    },
}

/// A constructed heat unit, ready for a [`HeatGroup`].
#[derive(Debug, Clone)]
pub enum HeatUnit {
    Consumer(HeatConsumer),
    Participant(HeatParticipant),
}

/// Build a heat unit from a node plus its configuration record.
///
/// Needs mutable graph access because output-driven participants read a
/// realized curve back off their source node, materializing it.
pub fn participant_from_config(
    graph: &mut Graph,
    node_key: &str,
    config: &HeatConfig,
    curves: &dyn CurveProvider,
) -> HeatResult<HeatUnit> {
    graph.node_id(node_key)?;

    let unit = match config {
        HeatConfig::Consumer { demand, profile } => {
            let curve = curves.named_curve(profile)?;
            HeatUnit::Consumer(HeatConsumer::new(node_key, curve.scaled(*demand)))
        }
        HeatConfig::Storage {
            volume,
            output_capacity,
            charge_profile,
        } => {
            let mut storage = HeatStorage::new(node_key, *volume, *output_capacity);
            if let Some(profile) = charge_profile {
                storage = storage.with_charge_curve(curves.named_curve(profile)?);
            }
            HeatUnit::Participant(HeatParticipant::Storage(storage))
        }
        HeatConfig::Hybrid { primary, secondary } => {
            let primary = producer_from_config(graph, node_key, primary, curves)?;
            let secondary = producer_from_config(graph, node_key, secondary, curves)?;
            HeatUnit::Participant(HeatParticipant::Hybrid(HybridProducer::new(
                node_key, primary, secondary,
            )))
        }
        producer => HeatUnit::Participant(HeatParticipant::Producer(producer_from_config(
            graph, node_key, producer, curves,
        )?)),
    };
    Ok(unit)
}

fn producer_from_config(
    graph: &mut Graph,
    node_key: &str,
    config: &HeatConfig,
    curves: &dyn CurveProvider,
) -> HeatResult<HeatProducer> {
    let unit_count = graph.node(node_key)?.units;

    match config {
        HeatConfig::Producer {
            capacity,
            efficiency,
            ..
        } => Ok(HeatProducer::constant(
            node_key,
            *capacity,
            unit_count,
            *efficiency,
        )),
        HeatConfig::HeatPump {
            capacity,
            base_cop,
            cop_slope,
            reference_temperature,
            temperature_profile,
            ..
        } => {
            let temperature = curves.named_curve(temperature_profile)?;
            let cop_values: Vec<Real> = temperature
                .iter()
                .map(|t| (base_cop + cop_slope * (t - reference_temperature)).max(1.0))
                .collect();
            let cop = ef_core::Curve::from_values("cop", cop_values)?;
            Ok(HeatProducer::variable_efficiency(
                node_key,
                *capacity,
                unit_count,
                cop,
            ))
        }
        HeatConfig::OutputDriven {
            source_node,
            source_carrier,
            conversion,
        } => {
            let carrier = graph.carrier_id(source_carrier)?;
            let source_id = graph.node_id(source_node)?;
            let mj_per_mwh = units::mwh_to_mj(1.0);
            let source = graph
                .node_curve(source_id, CurveKey::CarrierOutput(carrier))
                .ok_or_else(|| HeatError::MissingSourceCurve {
                    key: source_node.clone(),
                    carrier: source_carrier.clone(),
                })?
                .scaled(1.0 / mj_per_mwh);
            Ok(HeatProducer::output_driven(node_key, source, *conversion))
        }
        HeatConfig::Consumer { .. } | HeatConfig::Storage { .. } | HeatConfig::Hybrid { .. } => {
            Err(HeatError::InvalidConfig {
                key: node_key.to_string(),
                what: "hybrid components must be producer configurations",
            })
        }
    }
}

/// Write a group's realized results back onto the graph.
///
/// Configs are consulted again to know which carriers each participant's
/// input curves belong to; hybrid and heat-pump nodes additionally get
/// their input slot conversions re-balanced to the realized split.
pub fn inject_results(
    graph: &mut Graph,
    group: &HeatGroup,
    heat_carrier: &str,
    configs: &[(String, HeatConfig)],
) -> HeatResult<()> {
    let heat = graph.carrier_id(heat_carrier)?;
    let mj_per_mwh = units::mwh_to_mj(1.0);

    for consumer in group.consumers() {
        let node = graph.node_id(&consumer.key)?;
        graph.set_attr(node, Attr::Demand, units::mwh_to_mj(consumer.total_demand()));
        let demand = consumer.demand_curve().clone();
        graph.set_node_curve_lazy(node, CurveKey::CarrierInput(heat), move || {
            demand.scaled(mj_per_mwh)
        });
    }

    for (key, config) in configs {
        let Some(participant) = group.participant(key) else {
            continue;
        };
        let node = graph.node_id(key)?;

        match (participant, config) {
            (HeatParticipant::Storage(storage), HeatConfig::Storage { .. }) => {
                graph.set_attr(node, Attr::StorageVolume, units::mwh_to_mj(storage.volume));
                let levels = storage.level_curve().clone();
                graph.set_node_curve_lazy(node, CurveKey::Storage, move || {
                    levels.scaled(mj_per_mwh)
                });
            }
            (HeatParticipant::Producer(producer), HeatConfig::Producer { input_carrier, .. }) => {
                let input = graph.carrier_id(input_carrier)?;
                graph.set_attr(node, Attr::Demand, units::mwh_to_mj(producer.total_input()));
                graph.set_attr(
                    node,
                    Attr::FullLoadHours,
                    producer.realized_full_load_hours(),
                );
                write_curves(graph, node, input, heat, producer, mj_per_mwh);
            }
            (
                HeatParticipant::Producer(producer),
                HeatConfig::HeatPump {
                    electricity_carrier,
                    ambient_carrier,
                    ..
                },
            ) => {
                inject_heat_pump(
                    graph,
                    node,
                    producer,
                    electricity_carrier,
                    ambient_carrier,
                    heat,
                    mj_per_mwh,
                )?;
            }
            (
                HeatParticipant::Producer(producer),
                HeatConfig::OutputDriven { source_carrier, .. },
            ) => {
                let input = graph.carrier_id(source_carrier)?;
                graph.set_attr(node, Attr::Demand, units::mwh_to_mj(producer.total_input()));
                write_curves(graph, node, input, heat, producer, mj_per_mwh);
            }
            (HeatParticipant::Hybrid(hybrid), HeatConfig::Hybrid { primary, secondary }) => {
                inject_hybrid(graph, node, hybrid, primary, secondary, heat, mj_per_mwh)?;
            }
            _ => {
                return Err(HeatError::InvalidConfig {
                    key: key.clone(),
                    what: "configuration does not match the built participant",
                });
            }
        }
    }

    tracing::debug!(group = %group.name, "injected heat results");
    Ok(())
}

fn write_curves(
    graph: &mut Graph,
    node: ef_core::NodeId,
    input_carrier: ef_core::CarrierId,
    heat: ef_core::CarrierId,
    producer: &HeatProducer,
    mj_per_mwh: Real,
) {
    let input = producer.input_curve().clone();
    graph.set_node_curve_lazy(node, CurveKey::CarrierInput(input_carrier), move || {
        input.scaled(mj_per_mwh)
    });
    let load = producer.load().clone();
    graph.set_node_curve_lazy(node, CurveKey::CarrierOutput(heat), move || {
        load.scaled(mj_per_mwh)
    });
}

/// The realized COP splits the pump's input between its two component
/// carriers: 1/cop arrives as electricity, the rest as ambient heat.
fn inject_heat_pump(
    graph: &mut Graph,
    node: ef_core::NodeId,
    producer: &HeatProducer,
    electricity_carrier: &str,
    ambient_carrier: &str,
    heat: ef_core::CarrierId,
    mj_per_mwh: Real,
) -> HeatResult<()> {
    let electricity = graph.carrier_id(electricity_carrier)?;
    let ambient = graph.carrier_id(ambient_carrier)?;

    let cop = producer.realized_efficiency();
    let electricity_share = if cop > 0.0 { 1.0 / cop } else { 0.0 };
    graph.set_slot_conversion(node, electricity, Direction::Input, electricity_share);
    graph.set_slot_conversion(node, ambient, Direction::Input, 1.0 - electricity_share);

    graph.set_attr(node, Attr::Demand, units::mwh_to_mj(producer.production()));
    graph.set_attr(
        node,
        Attr::FullLoadHours,
        producer.realized_full_load_hours(),
    );

    let input = producer.input_curve().clone();
    graph.set_node_curve_lazy(node, CurveKey::CarrierInput(electricity), move || {
        input.scaled(mj_per_mwh)
    });
    let mut ambient_curve = producer.load().clone();
    ambient_curve.subtract_curve(producer.input_curve());
    graph.set_node_curve_lazy(node, CurveKey::CarrierInput(ambient), move || {
        ambient_curve.scaled(mj_per_mwh)
    });
    let load = producer.load().clone();
    graph.set_node_curve_lazy(node, CurveKey::CarrierOutput(heat), move || {
        load.scaled(mj_per_mwh)
    });
    Ok(())
}

/// The realized output split re-balances the hybrid node's input slot
/// conversions: each component's share of total input lands on its own
/// carrier.
fn inject_hybrid(
    graph: &mut Graph,
    node: ef_core::NodeId,
    hybrid: &HybridProducer,
    primary_config: &HeatConfig,
    secondary_config: &HeatConfig,
    heat: ef_core::CarrierId,
    mj_per_mwh: Real,
) -> HeatResult<()> {
    let total_input = hybrid.total_input();

    for (producer, config) in [
        (&hybrid.primary, primary_config),
        (&hybrid.secondary, secondary_config),
    ] {
        let Some(carrier_key) = component_input_carrier(config) else {
            return Err(HeatError::InvalidConfig {
                key: hybrid.key.clone(),
                what: "hybrid components must name an input carrier",
            });
        };
        let carrier = graph.carrier_id(carrier_key)?;
        let conversion = if total_input > 0.0 {
            producer.total_input() / total_input
        } else {
            0.0
        };
        graph.set_slot_conversion(node, carrier, Direction::Input, conversion);

        let input = producer.input_curve().clone();
        graph.set_node_curve_lazy(node, CurveKey::CarrierInput(carrier), move || {
            input.scaled(mj_per_mwh)
        });
    }

    graph.set_attr(node, Attr::Demand, units::mwh_to_mj(total_input));

    let mut load = hybrid.primary.load().clone();
    load.add_curve(hybrid.secondary.load());
    graph.set_node_curve_lazy(node, CurveKey::CarrierOutput(heat), move || {
        load.scaled(mj_per_mwh)
    });
    Ok(())
}

fn component_input_carrier(config: &HeatConfig) -> Option<&str> {
    match config {
        HeatConfig::Producer { input_carrier, .. } => Some(input_carrier),
        HeatConfig::HeatPump {
            electricity_carrier,
            ..
        } => Some(electricity_carrier),
        HeatConfig::OutputDriven { source_carrier, .. } => Some(source_carrier),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parses_tagged_records() {
        let config: HeatConfig = serde_json::from_str(
            r#"{"type": "heat_pump", "capacity": 2.0, "base_cop": 3.5,
                "cop_slope": 0.08, "reference_temperature": 10.0,
                "temperature_profile": "air_temperature",
                "electricity_carrier": "electricity",
                "ambient_carrier": "ambient_heat"}"#,
        )
        .unwrap();
        assert!(matches!(config, HeatConfig::HeatPump { .. }));
    }

    #[test]
    fn unknown_participant_type_is_rejected() {
        let result =
            serde_json::from_str::<HeatConfig>(r#"{"type": "campfire", "capacity": 1.0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn hybrid_components_must_be_producers() {
        let mut builder = ef_graph::GraphBuilder::new();
        builder.add_node("hybrid_heater").unwrap();
        let mut graph = builder.build().unwrap();

        let config = HeatConfig::Hybrid {
            primary: Box::new(HeatConfig::Storage {
                volume: 1.0,
                output_capacity: 1.0,
                charge_profile: None,
            }),
            secondary: Box::new(HeatConfig::Producer {
                capacity: 1.0,
                efficiency: 0.9,
                input_carrier: "gas".into(),
            }),
        };
        let err = participant_from_config(
            &mut graph,
            "hybrid_heater",
            &config,
            &ef_core::CurveSet::new(),
        )
        .unwrap_err();
        assert!(matches!(err, HeatError::InvalidConfig { .. }));
    }
}
