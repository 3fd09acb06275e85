//! Adaptive sub-stepping groups

use spikeforge_compiler::{ErrorKind, GenerateOptions, GroupOptions, Model, ModelConfig};
use spikeforge_ir::stock::{self, LeakyIntegrateFire, LifParams};
use spikeforge_ir::Precision;

fn model(min_dt: f64) -> (Model, spikeforge_compiler::GroupId, spikeforge_compiler::GroupId) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut model = Model::new(ModelConfig::default().with_precision(Precision::Double)).unwrap();
    model
        .register_type(stock::leaky_integrate_fire("AdaptiveLif", &LifParams::default(), LeakyIntegrateFire::adaptive(0.05)).unwrap())
        .unwrap();
    model.register_type(stock::regular().unwrap()).unwrap();

    let adaptive = model
        .add_group("AdaptiveLif", 4, GroupOptions::named("adaptive").adaptive(true).with_min_dt(min_dt))
        .unwrap();
    let fixed = model.add_group("Regular", 4, GroupOptions::named("fixed")).unwrap();
    for group in [adaptive, fixed] {
        model.group_mut(group).unwrap().fill_global("I", 3.0).unwrap();
    }
    (model, adaptive, fixed)
}

#[test]
fn adaptive_group_keeps_one_sample_per_tick() {
    let (mut model, adaptive, _) = model(0.05);
    model.generate(GenerateOptions::default()).unwrap();
    let v = model.record(adaptive, 0, "V").unwrap();
    let spikes = model.record_events(adaptive, 0, 0).unwrap();
    model.run(100).unwrap();

    let trace = model.recorder(v).unwrap();
    assert_eq!(trace.len(), 100);
    assert_eq!(trace.times()[99], 100.0);

    let events = model.recorder(spikes).unwrap().times();
    assert!(!events.is_empty());
    assert!(events.iter().all(|&t| t > 0.0 && t <= 100.0));
    // crossings land on sub-step boundaries, not only on tick boundaries
    assert!(events.iter().any(|&t| (t - t.round()).abs() > 1e-9));
}

#[test]
fn adaptive_and_fixed_groups_agree_roughly() {
    let (mut model, adaptive, fixed) = model(0.05);
    model.generate(GenerateOptions::default()).unwrap();
    let a = model.record_events(adaptive, 1, 0).unwrap();
    let f = model.record_events(fixed, 1, 0).unwrap();
    model.run(400).unwrap();

    let a = model.recorder(a).unwrap().len() as f64;
    let f = model.recorder(f).unwrap().len() as f64;
    assert!(a > 0.0 && f > 0.0);
    // same neuron model, finer integration: firing rates within 25%
    assert!((a - f).abs() / f < 0.25, "adaptive {} vs fixed {}", a, f);
}

#[test]
fn min_dt_is_adjustable_after_generation() {
    let (mut model, adaptive, fixed) = model(0.1);
    assert_eq!(model.group(adaptive).unwrap().min_dt().unwrap(), 0.1);
    assert_eq!(model.group(fixed).unwrap().min_dt().unwrap(), 1.0);
    assert!(model.group(adaptive).unwrap().adaptive());
    assert!(!model.group(fixed).unwrap().adaptive());

    model.generate(GenerateOptions::default()).unwrap();
    model.run(10).unwrap();
    model.group_mut(adaptive).unwrap().set_min_dt(0.5).unwrap();
    assert_eq!(model.group(adaptive).unwrap().min_dt().unwrap(), 0.5);
    let err = model.group_mut(adaptive).unwrap().set_min_dt(-1.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    model.run(10).unwrap();
    assert_eq!(model.step(), 20);
}

#[test]
fn invalid_min_dt_is_rejected_at_add() {
    let mut model = Model::new(ModelConfig::default()).unwrap();
    model.register_type(stock::regular().unwrap()).unwrap();
    let err = model
        .add_group("Regular", 1, GroupOptions::default().adaptive(true).with_min_dt(0.0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
}
