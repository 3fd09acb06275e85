//! Generation, reset and run semantics of a full model

use spikeforge_compiler::{
    ConnectorArgs, ErrorKind, GenerateOptions, GroupId, GroupOptions, Model, ModelConfig, Phase,
};
use spikeforge_ir::stock::{self, Facilitating, IzhikevichParams, LeakyIntegrateFire, LifParams};
use spikeforge_ir::{NeuronType, Precision, SlotCapacity};

fn regular_network(seed: u64) -> (Model, GroupId) {
    build_regular_network(ModelConfig::default().with_seed(seed))
}

fn build_regular_network(config: ModelConfig) -> (Model, GroupId) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut model = Model::new(config).unwrap();
    model.register_type(stock::regular().unwrap()).unwrap();
    let group = model.add_group("Regular", 100, GroupOptions::named("Regular")).unwrap();
    model
        .apply_connector(
            "RandConn",
            1,
            group,
            0..100,
            0,
            group,
            0..100,
            0,
            &ConnectorArgs::new().with("P", 0.05),
        )
        .unwrap();
    {
        let mut view = model.group_mut(group).unwrap();
        for neuron in 0..100 {
            view.set_global("I", neuron, 1.5 + 0.02 * neuron as f64).unwrap();
        }
    }
    (model, group)
}

#[test]
fn regular_self_connected_trace_has_one_sample_per_tick() {
    let (mut model, group) = regular_network(0);
    model.generate(GenerateOptions::default()).unwrap();
    let trace = model.record(group, 0, "V").unwrap();
    model.run(1000).unwrap();

    let recorder = model.recorder(trace).unwrap();
    assert_eq!(recorder.name(), "V");
    assert_eq!(recorder.len(), 1000);
    let dt = model.timestep_size();
    let times = recorder.times();
    assert!((times[0] - dt).abs() < 1e-12);
    for pair in times.windows(2) {
        assert!(pair[1] > pair[0]);
        assert!((pair[1] - pair[0] - dt).abs() < 1e-9);
    }
    assert_eq!(recorder.values().unwrap().len(), 1000);
}

#[test]
fn reset_and_rerun_reproduces_recordings() {
    let (mut model, group) = regular_network(11);
    model.generate(GenerateOptions::default()).unwrap();

    let first = model.record(group, 42, "V").unwrap();
    let spikes = model.record_events(group, 99, 0).unwrap();
    model.reset_run().unwrap();
    model.init_run().unwrap();
    model.run(300).unwrap();
    let values = model.recorder(first).unwrap().values().unwrap().to_vec();
    let events = model.recorder(spikes).unwrap().times().to_vec();
    assert!(!events.is_empty());

    assert_eq!(model.stop_recording(group, 42).unwrap(), 1);
    assert_eq!(model.stop_recording(group, 99).unwrap(), 1);
    let second = model.record(group, 42, "V").unwrap();
    let spikes_again = model.record_events(group, 99, 0).unwrap();
    model.reset_run().unwrap();
    model.init_run().unwrap();
    model.run(300).unwrap();

    assert_eq!(model.recorder(second).unwrap().values().unwrap(), &values[..]);
    assert_eq!(model.recorder(spikes_again).unwrap().times(), &events[..]);
}

#[test]
fn reset_restores_synaptic_and_adaptive_state() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut model = Model::new(ModelConfig::default().with_precision(Precision::Double)).unwrap();
    model.register_type(stock::regular().unwrap()).unwrap();
    model
        .register_type(
            stock::leaky_integrate_fire("AdaptiveLif", &LifParams::default(), LeakyIntegrateFire::adaptive(0.05))
                .unwrap(),
        )
        .unwrap();
    let sink = NeuronType::builder("Sink")
        .state("x", 0.0)
        .synapse(Facilitating::default().synapse_type("fac", SlotCapacity::Bounded(1), 2.0))
        .event_source("spike")
        .dynamics(stock::Silent)
        .build()
        .unwrap();
    model.register_type(sink).unwrap();

    let driver = model.add_group("Regular", 1, GroupOptions::named("driver")).unwrap();
    let target = model.add_group("Sink", 1, GroupOptions::named("sink")).unwrap();
    let adaptive = model
        .add_group("AdaptiveLif", 1, GroupOptions::named("adaptive").adaptive(true).with_min_dt(0.05))
        .unwrap();
    model.connect(driver, 0, 0, target, 0, 0).unwrap();
    model.connect(driver, 0, 0, adaptive, 0, 0).unwrap();
    model.group_mut(driver).unwrap().set_global("I", 0, 6.0).unwrap();
    model.group_mut(adaptive).unwrap().set_global("I", 0, 3.0).unwrap();
    model.generate(GenerateOptions::default()).unwrap();

    let mut runs = Vec::new();
    for _ in 0..2 {
        let x = model.record(target, 0, "x").unwrap();
        let v = model.record(adaptive, 0, "V").unwrap();
        let spikes = model.record_events(adaptive, 0, 0).unwrap();
        model.reset_run().unwrap();
        model.init_run().unwrap();
        model.run(100).unwrap();
        runs.push((
            model.recorder(x).unwrap().values().unwrap().to_vec(),
            model.recorder(v).unwrap().values().unwrap().to_vec(),
            model.recorder(spikes).unwrap().times().to_vec(),
        ));
        model.stop_recording(target, 0).unwrap();
        model.stop_recording(adaptive, 0).unwrap();
    }
    assert!(runs[0].0.last().copied().unwrap_or(0.0) > 0.0, "sink never received an event");
    assert!(!runs[0].2.is_empty());
    assert_eq!(runs[0], runs[1]);
}

#[test]
fn same_seed_builds_same_connectivity() {
    let (a, _) = regular_network(5);
    let (b, _) = regular_network(5);
    let (c, _) = regular_network(6);
    let key = |m: &Model| {
        m.connections()
            .iter()
            .map(|c| (c.src_neuron, c.dest_neuron, c.slot))
            .collect::<Vec<_>>()
    };
    assert_eq!(key(&a), key(&b));
    assert_ne!(key(&a), key(&c));
}

#[test]
fn run_until_twice_fails_without_side_effects() {
    let (mut model, group) = regular_network(1);
    model.generate(GenerateOptions::default()).unwrap();
    let trace = model.record(group, 3, "V").unwrap();

    model.run_until(50).unwrap();
    let v = model.group(group).unwrap().global("V", 3).unwrap();
    let err = model.run_until(50).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTarget);
    let err = model.run_until(10).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTarget);

    assert_eq!(model.step(), 50);
    assert_eq!(model.recorder(trace).unwrap().len(), 50);
    assert_eq!(model.group(group).unwrap().global("V", 3).unwrap(), v);
}

#[test]
fn structure_is_frozen_after_generation() {
    let (mut model, group) = regular_network(2);
    let before = model.connection_count();
    model.generate(GenerateOptions::default()).unwrap();

    let err = model.set_connection(group, 0, 0, group, 1, 0, 10_000).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ModelAlreadyGenerated);
    let err = model.connect(group, 0, 0, group, 1, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ModelAlreadyGenerated);
    let err = model
        .apply_connector("AllToAll", 1, group, 0..2, 0, group, 0..2, 0, &ConnectorArgs::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ModelAlreadyGenerated);
    assert_eq!(model.connection_count(), before);

    // values stay writable
    model.group_mut(group).unwrap().set_global("I", 0, 9.0).unwrap();
    model.group_mut(group).unwrap().set_constant("v_thresh", -55.0).unwrap();
    model.run(1).unwrap();
}

#[test]
fn initialize_restores_declared_state() {
    let mut model = Model::new(ModelConfig::default()).unwrap();
    model.register_type(stock::regular().unwrap()).unwrap();
    let group = model.add_group("Regular", 2, GroupOptions::default()).unwrap();
    model.group_mut(group).unwrap().set_global("V", 1, -60.0).unwrap();
    model
        .generate(GenerateOptions {
            initialize: false,
            ..GenerateOptions::default()
        })
        .unwrap();
    assert_eq!(model.phase(), Phase::Generated);
    assert_eq!(model.run(1).unwrap_err().kind(), ErrorKind::NotReady);

    model.initialize_model().unwrap();
    model.group_mut(group).unwrap().set_global("I", 0, 3.0).unwrap();
    model.run(20).unwrap();
    assert_ne!(model.group(group).unwrap().global("V", 0).unwrap(), -70.0);

    model.initialize_model().unwrap();
    assert_eq!(model.step(), 0);
    assert_eq!(model.time(), 0.0);
    assert_eq!(model.group(group).unwrap().global("V", 0).unwrap(), -70.0);
    assert_eq!(model.group(group).unwrap().global("V", 1).unwrap(), -60.0);
    // globals survive a reset
    assert_eq!(model.group(group).unwrap().global("I", 0).unwrap(), 3.0);
}

#[test]
fn init_run_applies_type_hooks() {
    let mut model = Model::new(ModelConfig::default().with_precision(Precision::Double)).unwrap();
    model
        .register_type(stock::izhikevich("RS", IzhikevichParams::regular_spiking()).unwrap())
        .unwrap();
    let group = model.add_group("RS", 3, GroupOptions::default()).unwrap();
    model.group_mut(group).unwrap().set_global("v", 2, -60.0).unwrap();
    model.generate(GenerateOptions::default()).unwrap();

    model.init_run().unwrap();
    assert_eq!(model.phase(), Phase::Initialized);
    let u = model.group(group).unwrap().global("u", 2).unwrap();
    assert!((u - (-12.0)).abs() < 1e-12);
}

#[cfg(feature = "parallel")]
#[test]
fn threaded_target_matches_serial() {
    use spikeforge_compiler::ExecutionTarget;

    let trace = |target: ExecutionTarget| {
        let (mut model, group) = build_regular_network(ModelConfig::default().with_seed(3).with_target(target));
        model.generate(GenerateOptions::default()).unwrap();
        let rec = model.record(group, 10, "V").unwrap();
        model.run(200).unwrap();
        model.recorder(rec).unwrap().values().unwrap().to_vec()
    };
    let serial = trace(ExecutionTarget::Serial);
    let threaded = trace(ExecutionTarget::Threaded { threads: 4 });
    assert_eq!(serial, threaded);
}
