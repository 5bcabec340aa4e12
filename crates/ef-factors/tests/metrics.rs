//! Integration tests for the derived-metric read API.

use ef_core::{NodeId, Real};
use ef_factors::{
    captured_emissions, dependent_supply_of, final_demand, inherited_captured_emissions,
    primary_co2_emission, primary_demand, sustainability_share, weighted_cost,
};
use ef_graph::{Attr, CarrierSpec, Direction, EdgeKind, Graph, GraphBuilder, Group};

fn assert_close(actual: Real, expected: Real) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

/// A straight supply chain a <- b <- c for one carrier, all demands 100,
/// all shares 1.0. The terminal c is tagged as primary energy demand.
/// Conversions are adjustable for b and c's output slots.
fn chain(
    spec: CarrierSpec,
    b_output_conversion: Real,
    c_output_conversion: Real,
    c_loss_conversion: Real,
) -> (Graph, NodeId, NodeId, NodeId) {
    let mut builder = GraphBuilder::new();
    let carrier = builder.add_carrier(spec).unwrap();
    let loss = builder.add_carrier(CarrierSpec::loss()).unwrap();

    let a = builder.add_node("a").unwrap();
    let b = builder.add_node("b").unwrap();
    let c = builder.add_node("c").unwrap();
    builder.tag(c, Group::PrimaryEnergyDemand);

    builder.add_slot(a, Direction::Input, carrier, 1.0).unwrap();
    builder.add_slot(b, Direction::Input, carrier, 1.0).unwrap();
    builder
        .add_slot(b, Direction::Output, carrier, b_output_conversion)
        .unwrap();
    builder
        .add_slot(c, Direction::Output, carrier, c_output_conversion)
        .unwrap();
    if c_loss_conversion > 0.0 {
        builder
            .add_slot(c, Direction::Output, loss, c_loss_conversion)
            .unwrap();
    }

    builder
        .connect(b, a, carrier, EdgeKind::Share, Some(1.0))
        .unwrap();
    builder
        .connect(c, b, carrier, EdgeKind::Share, Some(1.0))
        .unwrap();

    let mut graph = builder.build().unwrap();
    let (a, b, c) = (
        graph.node_id("a").unwrap(),
        graph.node_id("b").unwrap(),
        graph.node_id("c").unwrap(),
    );
    for node in [a, b, c] {
        graph.set_demand(node, 100.0);
    }
    (graph, a, b, c)
}

#[test]
fn straight_chain_conserves_primary_demand() {
    let (graph, a, b, c) = chain(CarrierSpec::new("gas"), 1.0, 1.0, 0.0);

    assert_close(primary_demand(&graph, a).unwrap(), 100.0);
    assert_close(primary_demand(&graph, b).unwrap(), 100.0);
    assert_close(primary_demand(&graph, c).unwrap(), 100.0);
}

#[test]
fn output_conversion_scales_primary_demand() {
    let (graph, a, _, _) = chain(CarrierSpec::new("gas"), 0.5, 1.0, 0.0);
    assert_close(primary_demand(&graph, a).unwrap(), 50.0);
}

#[test]
fn loss_at_terminal_does_not_propagate() {
    // The terminal outputs 80% carrier + 20% loss: its compensation factor
    // and output conversion are exact inverses, so the consumer's primary
    // demand is unchanged.
    let (graph, a, _, _) = chain(CarrierSpec::new("gas"), 1.0, 0.8, 0.2);
    assert_close(primary_demand(&graph, a).unwrap(), 100.0);
}

#[test]
fn primary_co2_applies_free_discount() {
    let (mut graph, a, _, c) = chain(
        CarrierSpec {
            co2_per_mj: 2.0,
            ..CarrierSpec::new("coal")
        },
        1.0,
        1.0,
        0.0,
    );
    graph.set_attr(c, Attr::FreeCo2Factor, 0.25);

    assert_close(primary_co2_emission(&graph, a).unwrap(), 100.0 * 2.0 * 0.75);
}

/// Three 50-unit suppliers behind a merge node; two have carbon capture.
fn capture_graph() -> (Graph, NodeId, NodeId, NodeId, NodeId) {
    let mut builder = GraphBuilder::new();
    let c1 = builder
        .add_carrier(CarrierSpec {
            potential_co2_per_mj: 1.0,
            ..CarrierSpec::new("biogas")
        })
        .unwrap();
    let c2 = builder
        .add_carrier(CarrierSpec {
            potential_co2_per_mj: 0.5,
            ..CarrierSpec::new("greengas")
        })
        .unwrap();
    let c3 = builder.add_carrier(CarrierSpec::new("network_gas")).unwrap();

    let s1 = builder.add_node("s1").unwrap();
    let s2 = builder.add_node("s2").unwrap();
    let s3 = builder.add_node("s3").unwrap();
    let merge = builder.add_node("merge").unwrap();

    builder.add_slot(s1, Direction::Output, c1, 1.0).unwrap();
    builder.add_slot(s2, Direction::Output, c2, 1.0).unwrap();
    builder.add_slot(s3, Direction::Output, c3, 1.0).unwrap();
    for carrier in [c1, c2, c3] {
        builder
            .add_slot(merge, Direction::Input, carrier, 1.0 / 3.0)
            .unwrap();
    }

    let e1 = builder
        .connect(s1, merge, c1, EdgeKind::Share, None)
        .unwrap();
    let e2 = builder
        .connect(s2, merge, c2, EdgeKind::Share, None)
        .unwrap();
    let e3 = builder
        .connect(s3, merge, c3, EdgeKind::Share, None)
        .unwrap();

    let mut graph = builder.build().unwrap();
    let (s1, s2, s3, merge) = (
        graph.node_id("s1").unwrap(),
        graph.node_id("s2").unwrap(),
        graph.node_id("s3").unwrap(),
        graph.node_id("merge").unwrap(),
    );

    for node in [s1, s2, s3] {
        graph.set_demand(node, 50.0);
    }
    graph.set_demand(merge, 150.0);
    for edge in [e1, e2, e3] {
        graph.set_edge_value(edge, 50.0);
    }

    graph.set_attr(s1, Attr::CaptureRate, 1.0);
    graph.set_attr(s2, Attr::CaptureRate, 0.5);

    (graph, s1, s2, s3, merge)
}

#[test]
fn captured_emissions_per_supplier() {
    let (graph, s1, s2, s3, _) = capture_graph();

    assert_close(captured_emissions(&graph, s1).unwrap(), 50.0);
    assert_close(captured_emissions(&graph, s2).unwrap(), 12.5);
    assert_close(captured_emissions(&graph, s3).unwrap(), 0.0);
}

#[test]
fn inherited_captured_emissions_at_terminus() {
    let (graph, _, _, _, merge) = capture_graph();
    assert_close(inherited_captured_emissions(&graph, merge).unwrap(), 62.5);
}

#[test]
fn sustainability_share_mixes_by_input_conversion() {
    let mut builder = GraphBuilder::new();
    let green = builder
        .add_carrier(CarrierSpec {
            sustainable: 1.0,
            ..CarrierSpec::new("green")
        })
        .unwrap();
    let grey = builder.add_carrier(CarrierSpec::new("grey")).unwrap();

    let wind = builder.add_node("wind").unwrap();
    let coal = builder.add_node("coal").unwrap();
    let mix = builder.add_node("mix").unwrap();

    builder.add_slot(wind, Direction::Output, green, 1.0).unwrap();
    builder.add_slot(coal, Direction::Output, grey, 1.0).unwrap();
    builder.add_slot(mix, Direction::Input, green, 0.6).unwrap();
    builder.add_slot(mix, Direction::Input, grey, 0.4).unwrap();

    builder
        .connect(wind, mix, green, EdgeKind::Share, Some(1.0))
        .unwrap();
    builder
        .connect(coal, mix, grey, EdgeKind::Share, Some(1.0))
        .unwrap();

    let graph = builder.build().unwrap();
    let mix = graph.node_id("mix").unwrap();

    assert_close(sustainability_share(&graph, mix).unwrap(), 0.6);
}

#[test]
fn weighted_cost_is_not_diluted_by_partial_inputs() {
    // The node's only input slot covers 0.8 of its throughput; propagating
    // a per-MJ cost must compensate rather than discount by 0.8.
    let mut builder = GraphBuilder::new();
    let gas = builder
        .add_carrier(CarrierSpec {
            cost_per_mj: 10.0,
            ..CarrierSpec::new("gas")
        })
        .unwrap();
    let source = builder.add_node("source").unwrap();
    let plant = builder.add_node("plant").unwrap();
    builder.add_slot(source, Direction::Output, gas, 1.0).unwrap();
    builder.add_slot(plant, Direction::Input, gas, 0.8).unwrap();
    builder
        .connect(source, plant, gas, EdgeKind::Share, Some(1.0))
        .unwrap();
    let graph = builder.build().unwrap();
    let plant = graph.node_id("plant").unwrap();

    assert_close(weighted_cost(&graph, plant).unwrap(), 10.0);
}

#[test]
fn final_demand_is_zero_without_a_tagged_node() {
    let (graph, a, _, _) = chain(CarrierSpec::new("gas"), 1.0, 1.0, 0.0);
    assert_close(final_demand(&graph, a).unwrap(), 0.0);
}

#[test]
fn final_demand_stops_at_group_boundary() {
    let mut builder = GraphBuilder::new();
    let carrier = builder.add_carrier(CarrierSpec::new("gas")).unwrap();
    let a = builder.add_node("a").unwrap();
    let b = builder.add_node("b").unwrap();
    let c = builder.add_node("c").unwrap();
    builder.tag(b, Group::FinalDemand);
    builder.add_slot(a, Direction::Input, carrier, 1.0).unwrap();
    builder.add_slot(b, Direction::Input, carrier, 1.0).unwrap();
    builder.add_slot(b, Direction::Output, carrier, 1.0).unwrap();
    builder.add_slot(c, Direction::Output, carrier, 1.0).unwrap();
    builder.connect(b, a, carrier, EdgeKind::Share, Some(1.0)).unwrap();
    builder.connect(c, b, carrier, EdgeKind::Share, Some(1.0)).unwrap();

    let mut graph = builder.build().unwrap();
    let a = graph.node_id("a").unwrap();
    let b = graph.node_id("b").unwrap();
    let c = graph.node_id("c").unwrap();
    for node in [a, b, c] {
        graph.set_demand(node, 100.0);
    }

    assert_close(final_demand(&graph, a).unwrap(), 100.0);
    assert_close(final_demand(&graph, b).unwrap(), 100.0);
}

#[test]
fn dependent_supply_counts_paths_through_carrier() {
    // a is supplied over electricity by b, which is supplied over gas by c.
    let mut builder = GraphBuilder::new();
    let elec = builder.add_carrier(CarrierSpec::new("electricity")).unwrap();
    let gas = builder.add_carrier(CarrierSpec::new("gas")).unwrap();

    let a = builder.add_node("a").unwrap();
    let b = builder.add_node("b").unwrap();
    let c = builder.add_node("c").unwrap();

    builder.add_slot(a, Direction::Input, elec, 1.0).unwrap();
    builder.add_slot(b, Direction::Input, gas, 1.0).unwrap();
    builder.add_slot(b, Direction::Output, elec, 1.0).unwrap();
    builder.add_slot(c, Direction::Output, gas, 1.0).unwrap();

    builder.connect(b, a, elec, EdgeKind::Share, Some(1.0)).unwrap();
    builder.connect(c, b, gas, EdgeKind::Share, Some(1.0)).unwrap();

    let mut graph = builder.build().unwrap();
    let a = graph.node_id("a").unwrap();
    let b = graph.node_id("b").unwrap();
    let c = graph.node_id("c").unwrap();
    for node in [a, b, c] {
        graph.set_demand(node, 100.0);
    }

    let gas_id = graph.carrier_id("gas").unwrap();
    let elec_id = graph.carrier_id("electricity").unwrap();

    assert_close(dependent_supply_of(&graph, a, gas_id).unwrap(), 100.0);
    assert_close(dependent_supply_of(&graph, a, elec_id).unwrap(), 100.0);
    assert_close(dependent_supply_of(&graph, b, elec_id).unwrap(), 0.0);
}
