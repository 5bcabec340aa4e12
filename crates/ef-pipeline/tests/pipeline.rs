//! End-to-end time resolution: heat, dispatch and balance stages over one
//! scenario graph, with the two-phase dataset handling.

use ef_balance::{BalanceConfig, CurveSourceConfig};
use ef_core::{Curve, CurveSet, FRAMES_PER_YEAR, Real};
use ef_dispatch::DispatchConfig;
use ef_graph::{Attr, CarrierSpec, CurveKey, Graph, GraphBuilder};
use ef_heat::HeatConfig;
use ef_pipeline::{BalanceStage, DispatchStage, HeatStage, PipelineError, Resolution, TimeResolver};

const MJ_PER_MWH: Real = 3600.0;

fn scenario_graph() -> Graph {
    let mut builder = GraphBuilder::new();
    for carrier in [
        "electricity",
        "useable_heat",
        "ambient_heat",
        "network_gas",
        "hydrogen",
    ] {
        builder.add_carrier(CarrierSpec::new(carrier)).unwrap();
    }
    for node in [
        "gas_plant",
        "wind",
        "el_demand",
        "homes_heat",
        "heat_pump",
        "gas_boiler",
        "electrolyser",
        "h2_demand",
        "h2_cavern",
        "h2_import",
        "h2_export",
    ] {
        builder.add_node(node).unwrap();
    }
    builder.build().unwrap()
}

fn curve_set() -> CurveSet {
    let mut curves = CurveSet::new();
    curves.insert("flat", Curve::constant(1.0 / FRAMES_PER_YEAR as Real));
    curves.insert("air_temperature", Curve::constant(10.0));
    curves
}

fn resolver() -> TimeResolver {
    let heat = vec![HeatStage::new(
        "space_heating",
        "useable_heat",
        vec![
            (
                "homes_heat".into(),
                HeatConfig::Consumer {
                    demand: 10.0 * FRAMES_PER_YEAR as Real,
                    profile: "flat".into(),
                },
            ),
            (
                "heat_pump".into(),
                HeatConfig::HeatPump {
                    capacity: 2.0,
                    base_cop: 4.0,
                    cop_slope: 0.08,
                    reference_temperature: 10.0,
                    temperature_profile: "air_temperature".into(),
                    electricity_carrier: "electricity".into(),
                    ambient_carrier: "ambient_heat".into(),
                },
            ),
            (
                "gas_boiler".into(),
                HeatConfig::Producer {
                    capacity: 20.0,
                    efficiency: 0.9,
                    input_carrier: "network_gas".into(),
                },
            ),
        ],
    )];

    let dispatch = vec![DispatchStage::new(
        "electricity",
        "electricity",
        vec![
            (
                "gas_plant".into(),
                DispatchConfig::Dispatchable {
                    capacity: 200.0,
                    availability: 1.0,
                    marginal_costs: 40.0,
                    fixed_costs_per_unit: 0.0,
                },
            ),
            (
                "wind".into(),
                DispatchConfig::Volatile {
                    capacity: 50.0,
                    full_load_hours: 4380.0,
                    profile: "flat".into(),
                },
            ),
            (
                "el_demand".into(),
                DispatchConfig::Consumer {
                    total_consumption: 100.0 * FRAMES_PER_YEAR as Real,
                    profile: "flat".into(),
                },
            ),
        ],
    )];

    let balance = vec![BalanceStage::new(
        "hydrogen",
        vec![
            (
                "electrolyser".into(),
                BalanceConfig::Transformation {
                    // Power-to-gas following wind's realized output: only
                    // knowable after the dispatch stage has run.
                    source: CurveSourceConfig::NodeOutput {
                        node: "wind".into(),
                        carrier: "electricity".into(),
                    },
                    conversion: 0.7,
                },
            ),
            (
                "h2_demand".into(),
                BalanceConfig::Consumer {
                    source: CurveSourceConfig::Profiled {
                        total: 10.0 * FRAMES_PER_YEAR as Real,
                        profile: "flat".into(),
                    },
                },
            ),
            ("h2_cavern".into(), BalanceConfig::Storage { volume: None }),
            ("h2_import".into(), BalanceConfig::Import),
            ("h2_export".into(), BalanceConfig::Export),
        ],
    )];

    TimeResolver::new(heat, dispatch, balance)
}

#[test]
fn resolve_runs_the_whole_sequence() {
    tracing_subscriber::fmt().with_test_writer().try_init().ok();

    let mut graph = scenario_graph();
    let curves = curve_set();
    let mut resolver = resolver();

    let mut refresh_calls = 0;
    resolver
        .resolve(&mut graph, &curves, |_graph| {
            refresh_calls += 1;
            Ok(())
        })
        .unwrap();

    // First pass on the cloned dataset, final pass after injection.
    assert_eq!(refresh_calls, 2);
    assert_eq!(resolver.state(), Resolution::Resolved);
    // Exactly two dataset generation changes: clone and restore.
    assert_eq!(graph.epoch(), 2);

    let elec = graph.carrier_id("electricity").unwrap();
    let heat = graph.carrier_id("useable_heat").unwrap();
    let hydrogen = graph.carrier_id("hydrogen").unwrap();

    // Dispatch: wind pinned at 25 MW, the gas plant covers the residual
    // 75 MW of the flat 100 MW demand.
    let wind = graph.node_id("wind").unwrap();
    let gas_plant = graph.node_id("gas_plant").unwrap();
    let wind_output = graph.node_curve(wind, CurveKey::CarrierOutput(elec)).unwrap();
    assert!((wind_output.get(0) - 25.0 * MJ_PER_MWH).abs() < 1e-6);
    let flh = graph.attr(gas_plant, Attr::FullLoadHours).unwrap();
    assert!((flh - 75.0 * FRAMES_PER_YEAR as Real / 200.0).abs() < 1e-6);
    assert_eq!(graph.attr(gas_plant, Attr::MarginalCosts), Some(40.0));

    // Heat: the pump's realized COP re-balances its input conversions.
    let pump = graph.node_id("heat_pump").unwrap();
    assert!((graph.input_conversion(pump, elec) - 0.25).abs() < 1e-9);
    let pump_output = graph.node_curve(pump, CurveKey::CarrierOutput(heat)).unwrap();
    assert!((pump_output.get(0) - 8.0 * MJ_PER_MWH).abs() < 1e-6);

    // Balance: 25 MW of wind becomes 17.5 MW of hydrogen against a flat
    // 10 MW draw; the cavern absorbs the whole 7.5 MW surplus.
    let electrolyser = graph.node_id("electrolyser").unwrap();
    let h2_output = graph
        .node_curve(electrolyser, CurveKey::CarrierOutput(hydrogen))
        .unwrap();
    assert!((h2_output.get(0) - 17.5 * MJ_PER_MWH).abs() < 1e-6);

    let cavern = graph.node_id("h2_cavern").unwrap();
    let volume = graph.attr(cavern, Attr::StorageVolume).unwrap();
    assert!((volume - 7.5 * FRAMES_PER_YEAR as Real * MJ_PER_MWH).abs() < 1.0);

    let h2_import = graph.node_id("h2_import").unwrap();
    assert_eq!(graph.attr(h2_import, Attr::Demand), Some(0.0));
}

#[test]
fn resolving_twice_is_refused() {
    let mut graph = scenario_graph();
    let curves = curve_set();
    let mut resolver = resolver();

    resolver.resolve(&mut graph, &curves, |_| Ok(())).unwrap();
    let err = resolver.resolve(&mut graph, &curves, |_| Ok(())).unwrap_err();
    assert!(matches!(err, PipelineError::AlreadyResolved));
}

#[test]
fn yearly_totals_survive_the_loop_unless_injected() {
    let mut graph = {
        let mut builder = GraphBuilder::new();
        for carrier in [
            "electricity",
            "useable_heat",
            "ambient_heat",
            "network_gas",
            "hydrogen",
        ] {
            builder.add_carrier(CarrierSpec::new(carrier)).unwrap();
        }
        for node in [
            "gas_plant",
            "wind",
            "el_demand",
            "homes_heat",
            "heat_pump",
            "gas_boiler",
            "electrolyser",
            "h2_demand",
            "h2_cavern",
            "h2_import",
            "h2_export",
            "industry_other",
        ] {
            builder.add_node(node).unwrap();
        }
        builder.build().unwrap()
    };
    let curves = curve_set();

    // A node no stage touches keeps its yearly demand: the restore throws
    // away every speculative loop-time mutation.
    let untouched = graph.node_id("industry_other").unwrap();
    graph.set_demand(untouched, 12345.0);
    // A participant node's pre-existing demand is overwritten by injection.
    let homes = graph.node_id("homes_heat").unwrap();
    graph.set_demand(homes, 1.0);

    let mut resolver = resolver();
    resolver.resolve(&mut graph, &curves, |_| Ok(())).unwrap();

    assert_eq!(graph.demand(untouched), Some(12345.0));
    let injected = graph.demand(homes).unwrap();
    assert!((injected - 10.0 * FRAMES_PER_YEAR as Real * MJ_PER_MWH).abs() < 1.0);
}
