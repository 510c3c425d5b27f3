mod common;

use common::{integrator, lattice_store, sphere, sweeps};
use hpmc::core::models::builder::LatticeBuilder;
use hpmc::core::models::particle::ParticleStore;
use hpmc::core::models::sim_box::SimBox;
use hpmc::engine::config::{BackendKind, RebuildPolicy};
use hpmc::engine::error::EngineError;
use hpmc::engine::state::IntegratorState;

#[test]
fn state_survives_type_reordering() {
    let mut original = integrator(1, BackendKind::Serial, RebuildPolicy::EverySweep);
    original.attach(lattice_store(10.0, 8, &["A", "B"]));
    original.set_shape("A", sphere(1.0)).unwrap();
    original.set_shape("B", sphere(0.5)).unwrap();
    {
        let params = original.params_mut().unwrap();
        params.set_d(0, 0.25).unwrap();
        params.set_a(1, 0.3).unwrap();
        params.set_move_ratio(0.7).unwrap();
    }
    original.set_overlap_check("A", "B", false).unwrap();
    sweeps(&mut original, 3);
    let json = original.snapshot_state().unwrap().to_json().unwrap();

    let mut restored = integrator(1, BackendKind::Serial, RebuildPolicy::EverySweep);
    restored.attach(lattice_store(10.0, 8, &["B", "A"]));
    restored
        .restore_state(&IntegratorState::from_json(&json).unwrap())
        .unwrap();

    let store = restored.store().unwrap();
    let a = store.type_id("A").unwrap();
    let b = store.type_id("B").unwrap();
    let params = restored.params().unwrap();
    assert_eq!(params.d(a), 0.25);
    assert_eq!(params.a(b), 0.3);
    assert_eq!(params.move_ratio(), 0.7);
    assert_eq!(params.shape(b).unwrap().circumsphere_radius(), 0.25);
    assert!(!restored.overlap_matrix().unwrap().get(a, b));
    assert_eq!(restored.timestep(), 3);
    assert!(restored.sweep().is_ok());
}

#[test]
fn unset_shape_is_a_configuration_error() {
    let mut integrator = integrator(1, BackendKind::Serial, RebuildPolicy::EverySweep);
    integrator.attach(lattice_store(10.0, 8, &["A", "B"]));
    integrator.set_shape("A", sphere(1.0)).unwrap();

    match integrator.sweep() {
        Err(EngineError::Configuration { type_name, .. }) => assert_eq!(type_name, "B"),
        other => panic!("expected a configuration error, got {other:?}"),
    }
    assert_eq!(integrator.timestep(), 0);
    assert_eq!(integrator.counters().move_count(), 0);
}

#[test]
fn depletant_without_shape_is_a_configuration_error() {
    let mut store = ParticleStore::with_types(SimBox::cubic(10.0).unwrap(), &["A", "D"]).unwrap();
    LatticeBuilder::new(8).populate(&mut store).unwrap();
    let mut integrator = integrator(1, BackendKind::Serial, RebuildPolicy::EverySweep);
    integrator.attach(store);
    integrator.set_shape("A", sphere(1.0)).unwrap();
    integrator.params_mut().unwrap().set_fugacity(1, 1.0).unwrap();
    match integrator.sweep() {
        Err(EngineError::Configuration { type_name, .. }) => assert_eq!(type_name, "D"),
        other => panic!("expected a configuration error, got {other:?}"),
    }

    let params = integrator.params_mut().unwrap();
    params.set_quermass(true);
    params.set_sweep_radius(0.1).unwrap();
    assert!(integrator.sweep().is_ok());
}
