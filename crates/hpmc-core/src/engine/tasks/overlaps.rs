use crate::core::models::ids::Tag;
use crate::core::shapes::test_overlap;
use crate::engine::cell_list::CellList;
use crate::engine::context::QueryContext;
use crate::engine::error::EngineError;
use crate::engine::progress::Progress;
use nalgebra::Vector3;
use serde::Serialize;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// An overlapping pair of particles, identified by tag with `tag_a < tag_b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct OverlapPair {
    pub tag_a: Tag,
    pub tag_b: Tag,
}

impl OverlapPair {
    pub fn new(a: Tag, b: Tag) -> Self {
        Self {
            tag_a: a.min(b),
            tag_b: a.max(b),
        }
    }
}

#[instrument(skip_all, name = "overlap_scan_task")]
pub fn run(context: &QueryContext<'_>) -> Result<Vec<OverlapPair>, EngineError> {
    let store = context.store;
    info!(num_particles = store.len(), "Scanning for overlapping pairs.");
    context
        .reporter
        .report(Progress::Message("Scanning for overlaps...".to_string()));

    if store.len() < 2 {
        return Ok(Vec::new());
    }

    let active = store.active_types();
    let reach = 2.0 * context.params.max_circumradius(active.iter().copied());
    let cells = CellList::build(store.sim_box(), store.particles(), reach, 0.0, 0.0);
    let images = store.sim_box().image_vectors(reach);
    let indices: Vec<usize> = (0..store.len()).collect();

    context.reporter.report(Progress::TaskStart {
        total_steps: indices.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = indices.iter();

    #[cfg(feature = "parallel")]
    let iterator = indices.par_iter();

    let per_particle: Vec<Vec<OverlapPair>> = iterator
        .map(|&i| {
            let found = overlaps_of(context, &cells, &images, i);
            context.reporter.report(Progress::TaskIncrement);
            found
        })
        .collect();

    context.reporter.report(Progress::TaskFinish);

    let mut pairs: Vec<OverlapPair> = per_particle.into_iter().flatten().collect();
    pairs.sort_unstable();

    info!(num_overlaps = pairs.len(), "Overlap scan complete.");

    Ok(pairs)
}

/// Overlaps between particle `i` and every particle with a larger index.
fn overlaps_of(
    context: &QueryContext<'_>,
    cells: &CellList,
    images: &[Vector3<f64>],
    i: usize,
) -> Vec<OverlapPair> {
    let store = context.store;
    let particle = &store.particles()[i];
    let Some(shape) = context.params.shape(particle.type_id) else {
        return Vec::new();
    };
    let orientation = particle.rotation();

    cells
        .neighbors(cells.cell_of(i))
        .filter(|&j| j > i)
        .filter_map(|j| {
            let other = &store.particles()[j];
            if !context.interactions.enabled(particle.type_id, other.type_id) {
                return None;
            }
            let other_shape = context.params.shape(other.type_id)?;
            let base = store.sim_box().min_image(&(other.position - particle.position));
            let reach = shape.circumsphere_radius() + other_shape.circumsphere_radius();
            let other_orientation = other.rotation();
            images
                .iter()
                .any(|image| {
                    let r_ij = base + image;
                    r_ij.norm_squared() <= reach * reach
                        && test_overlap(shape, other_shape, &r_ij, &orientation, &other_orientation)
                })
                .then(|| OverlapPair::new(particle.tag, other.tag))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::particle::ParticleStore;
    use crate::core::models::sim_box::SimBox;
    use crate::core::params::{OverlapMatrix, ParameterStore};
    use crate::core::shapes::ShapeSpec;
    use crate::engine::progress::ProgressReporter;
    use nalgebra::{Point3, Quaternion};

    fn setup(positions: &[[f64; 3]]) -> (ParticleStore, ParameterStore) {
        let mut store = ParticleStore::with_types(SimBox::cubic(6.0).unwrap(), &["A"]).unwrap();
        for p in positions {
            store
                .push(0, Point3::new(p[0], p[1], p[2]), Quaternion::identity())
                .unwrap();
        }
        let mut params = ParameterStore::new(1);
        params
            .set_shape(
                0,
                ShapeSpec::Sphere {
                    diameter: 1.0,
                    orientable: false,
                },
            )
            .unwrap();
        (store, params)
    }

    #[test]
    fn finds_pairs_including_across_the_boundary() {
        let (store, params) = setup(&[
            [0.0, 0.0, 0.0],
            [0.8, 0.0, 0.0],
            [2.9, 0.0, 0.0],
            [-2.9, 0.0, 0.0],
            [0.0, 2.0, 0.0],
        ]);
        let table = OverlapMatrix::new().table(1);
        let reporter = ProgressReporter::new();
        let context = QueryContext::new(&store, &params, &table, &reporter);
        let pairs = run(&context).unwrap();
        let tags: Vec<(Tag, Tag)> = pairs.iter().map(|p| (p.tag_a, p.tag_b)).collect();
        let t = |i: usize| store.particles()[i].tag;
        let mut expected = vec![(t(0), t(1)), (t(2), t(3))];
        expected.sort_unstable();
        assert_eq!(tags, expected);
    }

    #[test]
    fn disabled_pairs_are_ignored() {
        let (store, params) = setup(&[[0.0, 0.0, 0.0], [0.5, 0.0, 0.0]]);
        let mut matrix = OverlapMatrix::new();
        matrix.set(0, 0, false);
        let table = matrix.table(1);
        let reporter = ProgressReporter::new();
        let context = QueryContext::new(&store, &params, &table, &reporter);
        assert!(run(&context).unwrap().is_empty());
    }

    #[test]
    fn pair_constructor_orders_tags() {
        assert_eq!(OverlapPair::new(5, 2), OverlapPair::new(2, 5));
        assert_eq!(OverlapPair::new(5, 2).tag_a, 2);
    }
}
