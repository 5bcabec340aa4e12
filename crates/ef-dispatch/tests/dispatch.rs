//! Integration tests: adapters, dispatch and the estimator together.

use ef_core::{Curve, CurveSet, FRAMES_PER_YEAR, Real};
use ef_dispatch::{
    DispatchConfig, LoadDurationTable, MeritOrder, MeritParticipant, estimate_capacity_factors,
    inject_results, participant_from_config,
};
use ef_graph::{Attr, CarrierSpec, CurveKey, GraphBuilder};
use proptest::prelude::*;

fn flat_profile() -> Curve {
    Curve::constant(1.0 / FRAMES_PER_YEAR as Real)
}

#[test]
fn adapter_dispatch_inject_round_trip() {
    let mut builder = GraphBuilder::new();
    builder.add_carrier(CarrierSpec::new("electricity")).unwrap();
    let plant = builder.add_node("gas_plant").unwrap();
    builder.add_node("households").unwrap();
    builder.set_units(plant, 2.0);
    let mut graph = builder.build().unwrap();

    let mut curves = CurveSet::new();
    curves.insert("flat", flat_profile());

    let mut order = MeritOrder::new();
    let configs = [
        (
            "gas_plant",
            DispatchConfig::Dispatchable {
                capacity: 100.0,
                availability: 1.0,
                marginal_costs: 40.0,
                fixed_costs_per_unit: 0.0,
            },
        ),
        (
            "households",
            DispatchConfig::Consumer {
                total_consumption: 876_000.0,
                profile: "flat".into(),
            },
        ),
    ];
    for (key, config) in &configs {
        match participant_from_config(&graph, key, config, &curves).unwrap() {
            MeritParticipant::Producer(p) => order.add_producer(p).unwrap(),
            MeritParticipant::Consumer(c) => order.add_consumer(c),
        }
    }

    order.calculate().unwrap();
    inject_results(&mut graph, &order, "electricity").unwrap();

    let plant = graph.node_id("gas_plant").unwrap();
    let homes = graph.node_id("households").unwrap();
    let elec = graph.carrier_id("electricity").unwrap();

    // Flat 100 MW demand against 200 MW installed: 4380 full-load hours.
    let flh = graph.attr(plant, Attr::FullLoadHours).unwrap();
    assert!((flh - 4380.0).abs() < 1e-6);
    assert_eq!(graph.attr(plant, Attr::MarginalCosts), Some(40.0));
    assert_eq!(graph.attr(plant, Attr::NumberOfUnits), Some(2.0));

    // Production 876000 MWh injected as MJ.
    let demand_mj = graph.attr(plant, Attr::Demand).unwrap();
    assert!((demand_mj - 876_000.0 * 3600.0).abs() < 1.0);

    // Curves materialize on read, already converted to MJ per frame.
    let output = graph
        .node_curve(plant, CurveKey::CarrierOutput(elec))
        .unwrap();
    assert!((output.get(0) - 100.0 * 3600.0).abs() < 1e-6);
    let input = graph.node_curve(homes, CurveKey::CarrierInput(elec)).unwrap();
    assert!((input.get(0) - 100.0 * 3600.0).abs() < 1e-6);
}

#[test]
fn stepwise_and_estimator_agree_on_flat_load() {
    // A flat 150 MW load over two plants of 100 MW: the cheap plant runs
    // always, the dear one half the time. The curve-area estimate must land
    // close to the full simulation.
    let mut order = MeritOrder::new();
    order
        .add_producer(ef_dispatch::Producer::dispatchable(
            "cheap", 100.0, 1.0, 1.0, 10.0,
        ))
        .unwrap();
    order
        .add_producer(ef_dispatch::Producer::dispatchable(
            "dear", 100.0, 1.0, 1.0, 20.0,
        ))
        .unwrap();
    order.add_consumer(ef_dispatch::Consumer::from_curve(
        "demand",
        Curve::constant(150.0),
    ));
    order.calculate().unwrap();

    let cheap_flh = order.report("cheap").unwrap().full_load_hours;
    let dear_flh = order.report("dear").unwrap().full_load_hours;
    assert!((cheap_flh - 8760.0).abs() < 1e-6);
    assert!((dear_flh - 4380.0).abs() < 1e-6);

    let table = LoadDurationTable::from_residual_load(&order.demand_curve());
    let estimates = estimate_capacity_factors(&table, order.producers());
    assert!((estimates[0].full_load_hours - cheap_flh).abs() / cheap_flh < 0.1);
    assert!((estimates[1].full_load_hours - dear_flh).abs() / dear_flh < 0.2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The cheaper of two producers never ends up with fewer full-load
    /// hours, whatever the demand curve.
    #[test]
    fn cheaper_producer_runs_at_least_as_much(
        daily in prop::collection::vec(0.0_f64..250.0, 24),
    ) {
        let values: Vec<Real> = (0..FRAMES_PER_YEAR).map(|f| daily[f % 24]).collect();
        let demand = Curve::from_values("demand", values).unwrap();

        let mut order = MeritOrder::new();
        order
            .add_producer(ef_dispatch::Producer::dispatchable("cheap", 100.0, 1.0, 1.0, 10.0))
            .unwrap();
        order
            .add_producer(ef_dispatch::Producer::dispatchable("dear", 100.0, 1.0, 1.0, 20.0))
            .unwrap();
        order.add_consumer(ef_dispatch::Consumer::from_curve("demand", demand));
        order.calculate().unwrap();

        let cheap = order.report("cheap").unwrap().full_load_hours;
        let dear = order.report("dear").unwrap().full_load_hours;
        prop_assert!(cheap >= dear - 1e-9);
    }

    /// Capacity factors always land in [0, availability] for any residual
    /// load-duration curve and any merit-order interval.
    #[test]
    fn capacity_factor_is_bounded(
        daily in prop::collection::vec(0.0_f64..1000.0, 24),
        start in 0.0_f64..500.0,
        width in 0.1_f64..500.0,
        availability in 0.0_f64..1.0,
    ) {
        let values: Vec<Real> = (0..FRAMES_PER_YEAR).map(|f| daily[f % 24]).collect();
        let residual = Curve::from_values("residual", values).unwrap();
        let table = LoadDurationTable::from_residual_load(&residual);

        let factor = table.capacity_factor(start, start + width, availability);
        prop_assert!(factor >= 0.0);
        prop_assert!(factor <= availability + 1e-12);
    }
}
