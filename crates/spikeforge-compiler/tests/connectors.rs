//! Connector expansion and slot assignment

use std::collections::HashSet;

use proptest::prelude::*;
use spikeforge_compiler::{
    Connector, ConnectorArgs, ConnectorRequest, ErrorKind, GroupOptions, Model, ModelConfig, Result,
};
use spikeforge_ir::{stock, SlotCapacity};

fn two_groups(src: u32, dest: u32) -> (Model, spikeforge_compiler::GroupId, spikeforge_compiler::GroupId) {
    let mut model = Model::new(ModelConfig::default().with_seed(1234)).unwrap();
    model.register_type(stock::regular().unwrap()).unwrap();
    let a = model.add_group("Regular", src, GroupOptions::named("src")).unwrap();
    let b = model.add_group("Regular", dest, GroupOptions::named("dest")).unwrap();
    (model, a, b)
}

fn destination_slots_unique(model: &Model) -> bool {
    let mut seen = HashSet::new();
    model
        .connections()
        .iter()
        .all(|c| seen.insert((c.dest_group, c.dest_neuron, c.syn_type, c.slot)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prob_zero_connects_nothing(src in 1u32..30, dest in 1u32..30, mult in 1u32..4) {
        let (mut model, a, b) = two_groups(src, dest);
        let added = model
            .apply_connector("RandConn", mult, a, 0..src, 0, b, 0..dest, 0, &ConnectorArgs::new().with("P", 0.0))
            .unwrap();
        prop_assert_eq!(added, 0);
        prop_assert_eq!(model.connection_count(), 0);
    }

    #[test]
    fn prob_one_connects_every_candidate(src in 1u32..20, dest in 1u32..20, mult in 1u32..4) {
        let (mut model, a, b) = two_groups(src, dest);
        let added = model
            .apply_connector("RandConn", mult, a, 0..src, 0, b, 0..dest, 0, &ConnectorArgs::new().with("P", 1.0))
            .unwrap();
        let expected = (src * dest * mult) as usize;
        prop_assert_eq!(added, expected);
        prop_assert_eq!(model.connection_count(), expected);
        prop_assert!(destination_slots_unique(&model));
        prop_assert_eq!(model.slot_count(b, 0).unwrap(), src * mult);
    }

    #[test]
    fn repeated_rules_never_share_slots(p in 0.0f64..=1.0, seed in 0u64..1000) {
        let (mut model, a, b) = two_groups(12, 12);
        let args = ConnectorArgs::new().with("P", p).with("seed", seed as f64);
        model.apply_connector("RandConn", 2, a, 0..12, 0, b, 0..12, 0, &args).unwrap();
        model.apply_connector("RandConn", 1, b, 3..9, 0, b, 0..12, 0, &args).unwrap();
        model.apply_connector("AllToAll", 1, a, 0..2, 0, b, 10..12, 0, &ConnectorArgs::new()).unwrap();
        prop_assert!(destination_slots_unique(&model));
    }
}

#[test]
fn first_rule_claims_lower_slots() {
    let (mut model, a, b) = two_groups(3, 2);
    model
        .apply_connector("AllToAll", 1, a, 0..3, 0, b, 0..2, 0, &ConnectorArgs::new())
        .unwrap();
    model
        .apply_connector("OneToOne", 1, a, 0..2, 0, b, 0..2, 0, &ConnectorArgs::new())
        .unwrap();

    let slots: Vec<(u32, u32, u32)> = model
        .connections()
        .iter()
        .map(|c| (c.dest_neuron, c.src_neuron, c.slot))
        .collect();
    assert_eq!(
        slots,
        vec![(0, 0, 0), (0, 1, 1), (0, 2, 2), (1, 0, 0), (1, 1, 1), (1, 2, 2), (0, 0, 3), (1, 1, 3)]
    );
}

#[test]
fn explicit_slot_conflict_keeps_first_connection() {
    let (mut model, a, b) = two_groups(2, 2);
    model.set_connection(a, 0, 0, b, 1, 0, 5).unwrap();
    let err = model.set_connection(a, 1, 0, b, 1, 0, 5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SlotOccupied);

    assert_eq!(model.connection_count(), 1);
    let first = model.connections()[0];
    assert_eq!((first.src_neuron, first.dest_neuron, first.slot), (0, 1, 5));
}

#[test]
fn bounded_capacity_is_exhausted() {
    let mut model = Model::new(ModelConfig::default()).unwrap();
    model
        .register_type(stock::silent("Pair", SlotCapacity::Bounded(2)).unwrap())
        .unwrap();
    let g = model.add_group("Pair", 4, GroupOptions::default()).unwrap();
    assert_eq!(model.connect(g, 0, 0, g, 3, 0).unwrap(), 0);
    assert_eq!(model.connect(g, 1, 0, g, 3, 0).unwrap(), 1);
    let err = model.connect(g, 2, 0, g, 3, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SlotsExhausted);

    let err = model.set_connection(g, 2, 0, g, 2, 0, 2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfRange);
    let err = model.set_connection(g, 4, 0, g, 2, 0, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfRange);
    let err = model.connect(g, 0, 0, g, 2, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfRange);
}

/// Connects each destination to the source at the same offset from the end
#[derive(Debug)]
struct Mirror;

impl Connector for Mirror {
    fn name(&self) -> &str {
        "Mirror"
    }

    fn optional_args(&self) -> &[&'static str] {
        &["stride"]
    }

    fn expand(&self, request: &ConnectorRequest<'_>, pairs: &mut Vec<(u32, u32)>) -> Result<()> {
        let stride = request.args.get("stride").unwrap_or(1.0) as u32;
        let len = request.src.len().min(request.dest.len()) as u32;
        for i in (0..len).step_by(stride.max(1) as usize) {
            pairs.push((request.src.end - 1 - i, request.dest.start + i));
        }
        Ok(())
    }
}

#[test]
fn custom_connectors_join_the_registry() {
    let (mut model, a, b) = two_groups(4, 4);
    model.register_connector(Mirror).unwrap();
    assert_eq!(model.register_connector(Mirror).unwrap_err().kind(), ErrorKind::DuplicateName);

    let added = model
        .apply_connector("Mirror", 1, a, 0..4, 0, b, 0..4, 0, &ConnectorArgs::new().with("stride", 2.0))
        .unwrap();
    assert_eq!(added, 2);
    let pairs: Vec<(u32, u32)> = model.connections().iter().map(|c| (c.src_neuron, c.dest_neuron)).collect();
    assert_eq!(pairs, vec![(3, 0), (1, 2)]);

    let err = model
        .apply_connector("Mirror", 1, a, 0..4, 0, b, 0..4, 0, &ConnectorArgs::new().with("P", 1.0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownArgument);
}

#[test]
fn failed_rule_leaves_later_seeds_untouched() {
    let build = |with_failure: bool| {
        let (mut model, a, b) = two_groups(20, 20);
        model
            .register_type(stock::silent("Quiet", SlotCapacity::Bounded(1)).unwrap())
            .unwrap();
        let quiet = model.add_group("Quiet", 2, GroupOptions::named("quiet")).unwrap();
        if with_failure {
            let err = model
                .apply_connector("AllToAll", 1, a, 0..2, 0, quiet, 0..2, 0, &ConnectorArgs::new())
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::SlotsExhausted);
            assert_eq!(model.connection_count(), 0);
        }
        model
            .apply_connector("RandConn", 1, a, 0..20, 0, b, 0..20, 0, &ConnectorArgs::new().with("P", 0.3))
            .unwrap();
        model
            .connections()
            .iter()
            .map(|c| (c.src_neuron, c.dest_neuron, c.slot))
            .collect::<Vec<_>>()
    };
    let clean = build(false);
    assert!(!clean.is_empty());
    assert_eq!(clean, build(true));
}
