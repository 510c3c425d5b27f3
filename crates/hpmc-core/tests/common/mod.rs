#![allow(dead_code)]

use hpmc::core::models::builder::LatticeBuilder;
use hpmc::core::models::particle::ParticleStore;
use hpmc::core::models::sim_box::SimBox;
use hpmc::core::shapes::ShapeSpec;
use hpmc::engine::config::{BackendKind, IntegratorConfigBuilder, RebuildPolicy};
use hpmc::engine::integrator::HpmcIntegrator;

pub fn sphere(diameter: f64) -> ShapeSpec {
    ShapeSpec::Sphere {
        diameter,
        orientable: false,
    }
}

pub fn cube(edge: f64) -> ShapeSpec {
    let h = 0.5 * edge;
    let mut vertices = Vec::new();
    for x in [-h, h] {
        for y in [-h, h] {
            for z in [-h, h] {
                vertices.push([x, y, z]);
            }
        }
    }
    ShapeSpec::ConvexPolyhedron { vertices }
}

pub fn square(edge: f64) -> ShapeSpec {
    let h = 0.5 * edge;
    ShapeSpec::ConvexPolygon {
        vertices: vec![[-h, -h], [h, -h], [h, h], [-h, h]],
    }
}

/// A cubic box holding `count` particles on a lattice, types assigned round-robin.
pub fn lattice_store(length: f64, count: usize, types: &[&str]) -> ParticleStore {
    let mut store = ParticleStore::with_types(SimBox::cubic(length).unwrap(), types).unwrap();
    LatticeBuilder::new(count)
        .types((0..types.len()).collect())
        .populate(&mut store)
        .unwrap();
    store
}

pub fn integrator(seed: u64, backend: BackendKind, rebuild: RebuildPolicy) -> HpmcIntegrator {
    let config = IntegratorConfigBuilder::new()
        .seed(seed)
        .backend(backend)
        .rebuild(rebuild)
        .build()
        .unwrap();
    HpmcIntegrator::new(config)
}

pub fn sweeps(integrator: &mut HpmcIntegrator, count: usize) {
    for _ in 0..count {
        integrator.sweep().unwrap();
    }
}
