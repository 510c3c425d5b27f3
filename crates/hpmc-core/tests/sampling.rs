mod common;

use common::{cube, integrator, lattice_store, sphere, square, sweeps};
use hpmc::core::models::particle::ParticleStore;
use hpmc::core::models::sim_box::SimBox;
use hpmc::engine::config::{BackendKind, RebuildPolicy};
use hpmc::engine::counters::MoveCounters;
use hpmc::engine::external::LinearField;
use nalgebra::{Point3, Quaternion, Vector3};

#[test]
fn dilute_binary_mixture_accepts_almost_everything() {
    let store = lattice_store(20.0, 100, &["A", "B"]);
    let mut integrator = integrator(1234, BackendKind::default(), RebuildPolicy::EverySweep);
    integrator.attach(store);
    integrator.set_shape("A", sphere(1.0)).unwrap();
    integrator.set_shape("B", sphere(0.5)).unwrap();
    {
        let params = integrator.params_mut().unwrap();
        params.set_d_all(0.1).unwrap();
        params.set_move_ratio(0.5).unwrap();
        params.set_nselect(1).unwrap();
    }

    sweeps(&mut integrator, 1000);

    let counters = integrator.counters();
    assert_eq!(counters.move_count(), 1000 * 100);
    assert!(counters.translate_acceptance() > 0.95);
    assert!(counters.rotate_acceptance() > 0.95);
    assert_eq!(integrator.count_overlaps().unwrap(), 0);
}

#[test]
fn isolated_particle_is_always_accepted() {
    let mut store = ParticleStore::with_types(SimBox::cubic(10.0).unwrap(), &["A"]).unwrap();
    store
        .push(0, Point3::origin(), Quaternion::identity())
        .unwrap();
    let mut integrator = integrator(5, BackendKind::Serial, RebuildPolicy::EverySweep);
    integrator.attach(store);
    integrator.set_shape("A", cube(1.0)).unwrap();
    integrator.params_mut().unwrap().set_d_all(0.5).unwrap();

    sweeps(&mut integrator, 100);

    let counters = integrator.counters();
    assert_eq!(counters.translate_reject, 0);
    assert_eq!(counters.rotate_reject, 0);
    assert_eq!(counters.move_count(), 400);
}

#[test]
fn rotations_keep_the_stored_quaternion_norm() {
    let mut store = ParticleStore::with_types(SimBox::cubic(10.0).unwrap(), &["A"]).unwrap();
    store
        .push(0, Point3::origin(), Quaternion::new(2.0, 0.0, 0.0, 0.0))
        .unwrap();
    let mut integrator = integrator(21, BackendKind::Serial, RebuildPolicy::EverySweep);
    integrator.attach(store);
    integrator.set_shape("A", cube(1.0)).unwrap();
    {
        let params = integrator.params_mut().unwrap();
        params.set_move_ratio(0.0).unwrap();
        params.set_a_all(0.3).unwrap();
    }

    sweeps(&mut integrator, 20);

    let counters = integrator.counters();
    assert_eq!(counters.rotate_accept, 80);
    let orientation = integrator.store().unwrap().particles()[0].orientation;
    assert!((orientation.norm() - 2.0).abs() < 1e-9);
    assert!(orientation.i.abs() + orientation.j.abs() + orientation.k.abs() > 0.0);
}

#[test]
fn dense_systems_never_gain_overlaps() {
    for rebuild in [RebuildPolicy::EverySweep, RebuildPolicy::BuildMargin(0.4)] {
        let store = lattice_store(7.0, 216, &["A", "B"]);
        let mut integrator = integrator(77, BackendKind::default(), rebuild);
        integrator.attach(store);
        integrator.set_shape("A", sphere(1.0)).unwrap();
        integrator.set_shape("B", cube(0.9)).unwrap();
        integrator.params_mut().unwrap().set_d_all(0.15).unwrap();
        assert_eq!(integrator.count_overlaps().unwrap(), 0);

        sweeps(&mut integrator, 30);

        assert_eq!(integrator.count_overlaps().unwrap(), 0);
        let counters = integrator.counters();
        assert!(counters.translate_reject > 0);
        assert!(counters.translate_accept > 0);
        assert!(counters.overlap_checks > 0);
    }
}

#[test]
fn planar_squares_never_gain_overlaps() {
    let mut store = ParticleStore::with_types(SimBox::square(8.0).unwrap(), &["S"]).unwrap();
    hpmc::core::models::builder::LatticeBuilder::new(49)
        .populate(&mut store)
        .unwrap();
    let mut integrator = integrator(21, BackendKind::default(), RebuildPolicy::EverySweep);
    integrator.attach(store);
    integrator.set_shape("S", square(1.0)).unwrap();

    sweeps(&mut integrator, 50);

    assert_eq!(integrator.count_overlaps().unwrap(), 0);
    assert!(integrator.counters().rotate_accept > 0);
    for particle in integrator.store().unwrap().particles() {
        assert_eq!(particle.position.z, 0.0);
        assert!(particle.orientation.i.abs() < 1e-12);
        assert!(particle.orientation.j.abs() < 1e-12);
    }
}

#[test]
fn disabled_pairs_may_overlap() {
    let mut store = ParticleStore::with_types(SimBox::cubic(10.0).unwrap(), &["A", "B"]).unwrap();
    store
        .push(0, Point3::origin(), Quaternion::identity())
        .unwrap();
    store
        .push(1, Point3::new(0.3, 0.0, 0.0), Quaternion::identity())
        .unwrap();
    let mut integrator = integrator(8, BackendKind::Serial, RebuildPolicy::EverySweep);
    integrator.attach(store);
    integrator.set_shape("A", sphere(1.0)).unwrap();
    integrator.set_shape("B", sphere(1.0)).unwrap();
    assert_eq!(integrator.count_overlaps().unwrap(), 1);

    integrator.set_overlap_check("A", "B", false).unwrap();
    assert_eq!(integrator.count_overlaps().unwrap(), 0);
    sweeps(&mut integrator, 20);
    let counters = integrator.counters();
    assert_eq!(counters.translate_reject + counters.rotate_reject, 0);
}

#[test]
fn ignored_types_are_not_counted() {
    let store = lattice_store(10.0, 8, &["A", "B"]);
    let mut integrator = integrator(4, BackendKind::Serial, RebuildPolicy::EverySweep);
    integrator.attach(store);
    integrator.set_shape("A", sphere(1.0)).unwrap();
    integrator.set_shape("B", sphere(1.0)).unwrap();
    integrator
        .params_mut()
        .unwrap()
        .set_ignore_statistics(1, true);

    sweeps(&mut integrator, 10);
    assert_eq!(integrator.counters().move_count(), 10 * 4 * 4);
}

#[test]
fn external_field_pulls_particles_down() {
    let mut store = ParticleStore::with_types(SimBox::cubic(10.0).unwrap(), &["A"]).unwrap();
    store
        .push(0, Point3::origin(), Quaternion::identity())
        .unwrap();
    let mut integrator = integrator(13, BackendKind::Serial, RebuildPolicy::EverySweep);
    integrator.attach(store);
    integrator.set_shape("A", sphere(1.0)).unwrap();
    integrator.params_mut().unwrap().set_move_ratio(1.0).unwrap();
    integrator.set_external_field(Some(Box::new(LinearField {
        direction: Vector3::z(),
        strength: 20.0,
    })));

    sweeps(&mut integrator, 200);

    let z = integrator.store().unwrap().particles()[0].position.z;
    assert!(z < -1.0, "particle stayed at z = {z}");
    assert!(integrator.counters().translate_reject > 0);
}

#[test]
fn counters_are_sums_of_sweeps() {
    let store = lattice_store(6.0, 64, &["A"]);
    let mut integrator = integrator(99, BackendKind::default(), RebuildPolicy::EverySweep);
    integrator.attach(store);
    integrator.set_shape("A", sphere(1.0)).unwrap();

    let mut summed = MoveCounters::default();
    for _ in 0..5 {
        summed += integrator.sweep().unwrap();
    }
    assert_eq!(integrator.counters(), summed);
    assert_eq!(integrator.counters(), integrator.counters());

    integrator.reset_counters();
    assert_eq!(integrator.counters(), MoveCounters::default());
    assert_eq!(integrator.counters().translate_acceptance(), 0.0);
}
