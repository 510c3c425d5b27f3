mod common;

use common::{cube, integrator, lattice_store, sphere, sweeps};
use hpmc::engine::config::{BackendKind, RebuildPolicy};
use hpmc::engine::external::SquareWell;
use hpmc::engine::integrator::HpmcIntegrator;

fn prepared(backend: BackendKind, fugacity: Option<f64>) -> HpmcIntegrator {
    let store = lattice_store(12.0, 512, &["A", "B", "D"]);
    let mut integrator = integrator(2024, backend, RebuildPolicy::BuildMargin(0.3));
    integrator.attach(store);
    integrator.set_shape("A", sphere(1.0)).unwrap();
    integrator.set_shape("B", cube(0.8)).unwrap();
    integrator.set_shape("D", sphere(0.4)).unwrap();
    if let Some(f) = fugacity {
        let depletant = integrator.store().unwrap().type_id("D").unwrap();
        integrator
            .params_mut()
            .unwrap()
            .set_fugacity(depletant, f)
            .unwrap();
    }
    integrator.params_mut().unwrap().set_d_all(0.2).unwrap();
    integrator
}

fn poses(integrator: &HpmcIntegrator) -> Vec<[f64; 7]> {
    integrator
        .store()
        .unwrap()
        .particles()
        .iter()
        .map(|p| {
            [
                p.position.x,
                p.position.y,
                p.position.z,
                p.orientation.w,
                p.orientation.i,
                p.orientation.j,
                p.orientation.k,
            ]
        })
        .collect()
}

#[test]
fn serial_and_threaded_backends_agree_exactly() {
    let mut serial = prepared(BackendKind::Serial, None);
    let mut threaded = prepared(BackendKind::Threaded, None);
    sweeps(&mut serial, 15);
    sweeps(&mut threaded, 15);

    assert_eq!(serial.counters(), threaded.counters());
    assert_eq!(poses(&serial), poses(&threaded));
    assert_eq!(threaded.count_overlaps().unwrap(), 0);
}

#[test]
fn backends_agree_with_depletants() {
    let mut serial = prepared(BackendKind::Serial, Some(0.8));
    let mut threaded = prepared(BackendKind::Threaded, Some(0.8));
    sweeps(&mut serial, 5);
    sweeps(&mut threaded, 5);

    assert_eq!(serial.counters(), threaded.counters());
    assert_eq!(poses(&serial), poses(&threaded));
}

#[test]
fn same_seed_reproduces_and_other_seed_diverges() {
    let mut first = prepared(BackendKind::default(), None);
    let mut second = prepared(BackendKind::default(), None);
    sweeps(&mut first, 5);
    sweeps(&mut second, 5);
    assert_eq!(poses(&first), poses(&second));

    let store = lattice_store(12.0, 512, &["A", "B", "D"]);
    let mut other = integrator(7, BackendKind::default(), RebuildPolicy::BuildMargin(0.3));
    other.attach(store);
    other.set_shape("A", sphere(1.0)).unwrap();
    other.set_shape("B", cube(0.8)).unwrap();
    other.set_shape("D", sphere(0.4)).unwrap();
    other.params_mut().unwrap().set_d_all(0.2).unwrap();
    sweeps(&mut other, 5);
    assert_ne!(poses(&first), poses(&other));
}

#[test]
fn zero_fugacity_matches_no_depletants() {
    let mut plain = prepared(BackendKind::default(), None);
    let mut zero = prepared(BackendKind::default(), Some(0.0));
    sweeps(&mut plain, 10);
    sweeps(&mut zero, 10);
    assert_eq!(plain.counters(), zero.counters());
    assert_eq!(poses(&plain), poses(&zero));
}

#[test]
fn depletants_lower_acceptance() {
    let mut plain = prepared(BackendKind::default(), None);
    let mut crowded = prepared(BackendKind::default(), Some(5.0));
    sweeps(&mut plain, 5);
    sweeps(&mut crowded, 5);
    assert!(
        crowded.counters().translate_acceptance() < plain.counters().translate_acceptance()
    );
    assert_eq!(crowded.count_overlaps().unwrap(), 0);
}

#[test]
fn negative_fugacity_is_reproducible_and_lowers_acceptance() {
    let mut plain = prepared(BackendKind::Serial, None);
    let mut first = prepared(BackendKind::Serial, Some(-5.0));
    let mut second = prepared(BackendKind::Threaded, Some(-5.0));
    sweeps(&mut plain, 5);
    sweeps(&mut first, 5);
    sweeps(&mut second, 5);

    assert_eq!(first.counters(), second.counters());
    assert_eq!(poses(&first), poses(&second));
    assert!(first.counters().translate_acceptance() < plain.counters().translate_acceptance());
    assert_eq!(first.count_overlaps().unwrap(), 0);
}

#[test]
fn quermass_sweeps_use_the_sweep_sphere() {
    let mut plain = prepared(BackendKind::default(), None);
    let mut full = prepared(BackendKind::default(), Some(5.0));
    let mut quermass = prepared(BackendKind::default(), Some(5.0));
    {
        let params = quermass.params_mut().unwrap();
        params.set_quermass(true);
        params.set_sweep_radius(0.3).unwrap();
    }
    let widened = full.interaction_range().unwrap() + 2.0 * (0.3 - 0.2);
    assert!((quermass.interaction_range().unwrap() - widened).abs() < 1e-9);

    sweeps(&mut plain, 5);
    sweeps(&mut full, 5);
    sweeps(&mut quermass, 5);

    assert_ne!(poses(&quermass), poses(&full));
    assert!(
        quermass.counters().translate_acceptance() < plain.counters().translate_acceptance()
    );
    assert_eq!(quermass.count_overlaps().unwrap(), 0);
}

#[test]
fn zero_patch_matches_no_patch() {
    let mut plain = prepared(BackendKind::default(), None);
    let mut flat = prepared(BackendKind::default(), None);
    flat.set_patch(Some(Box::new(SquareWell {
        range: 1.0,
        epsilon: 0.0,
    })));
    sweeps(&mut plain, 10);
    sweeps(&mut flat, 10);
    assert_eq!(plain.counters(), flat.counters());
    assert_eq!(poses(&plain), poses(&flat));
}

#[test]
fn repulsive_patch_lowers_acceptance() {
    let mut plain = prepared(BackendKind::default(), None);
    let mut repulsive = prepared(BackendKind::default(), None);
    repulsive.set_patch(Some(Box::new(SquareWell {
        range: 1.45,
        epsilon: -5.0,
    })));
    sweeps(&mut plain, 10);
    sweeps(&mut repulsive, 10);
    assert!(
        repulsive.counters().translate_acceptance() < plain.counters().translate_acceptance()
    );
    assert_eq!(repulsive.count_overlaps().unwrap(), 0);
}
