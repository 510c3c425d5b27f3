use super::ids::TypeId;
use super::particle::{ParticleError, ParticleStore};
use nalgebra::{Point3, Quaternion};

/// Places particles on a simple cubic (3D) or square (2D) lattice filling the box.
///
/// Types are assigned round-robin from `type_ids`. The lattice spacing is chosen so that `count`
/// sites fit evenly along each periodic axis.
pub struct LatticeBuilder {
    count: usize,
    type_ids: Vec<TypeId>,
}

impl LatticeBuilder {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            type_ids: vec![0],
        }
    }

    pub fn types(mut self, type_ids: Vec<TypeId>) -> Self {
        if !type_ids.is_empty() {
            self.type_ids = type_ids;
        }
        self
    }

    /// Smallest lattice spacing this builder will use in `store`'s box.
    pub fn spacing(&self, store: &ParticleStore) -> f64 {
        let axes = store.sim_box().periodic_axes();
        let per_axis = self.sites_per_axis(axes);
        let lengths = store.sim_box().lengths();
        (0..axes)
            .map(|axis| lengths[axis] / per_axis as f64)
            .fold(f64::INFINITY, f64::min)
    }

    fn sites_per_axis(&self, axes: usize) -> usize {
        let mut n = 1usize;
        while n.pow(axes as u32) < self.count {
            n += 1;
        }
        n
    }

    pub fn populate(&self, store: &mut ParticleStore) -> Result<(), ParticleError> {
        let axes = store.sim_box().periodic_axes();
        let per_axis = self.sites_per_axis(axes);
        let lengths = *store.sim_box().lengths();

        let coordinate = |index: usize, axis: usize| {
            let spacing = lengths[axis] / per_axis as f64;
            -0.5 * lengths[axis] + (index as f64 + 0.5) * spacing
        };

        for site in 0..self.count {
            let i = site % per_axis;
            let j = (site / per_axis) % per_axis;
            let k = site / (per_axis * per_axis);
            let position = if axes == 2 {
                Point3::new(coordinate(i, 0), coordinate(j, 1), 0.0)
            } else {
                Point3::new(coordinate(i, 0), coordinate(j, 1), coordinate(k, 2))
            };
            let type_id = self.type_ids[site % self.type_ids.len()];
            store.push(type_id, position, Quaternion::identity())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::sim_box::SimBox;

    #[test]
    fn cubic_lattice_fills_requested_count() {
        let mut store =
            ParticleStore::with_types(SimBox::cubic(12.0).unwrap(), &["A", "B"]).unwrap();
        LatticeBuilder::new(27)
            .types(vec![0, 1])
            .populate(&mut store)
            .unwrap();
        assert_eq!(store.len(), 27);
        assert_eq!(store.particles()[0].type_id, 0);
        assert_eq!(store.particles()[1].type_id, 1);
        assert!((LatticeBuilder::new(27).spacing(&store) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn square_lattice_stays_in_plane() {
        let mut store = ParticleStore::with_types(SimBox::square(10.0).unwrap(), &["A"]).unwrap();
        LatticeBuilder::new(10).populate(&mut store).unwrap();
        assert_eq!(store.len(), 10);
        assert!(store.particles().iter().all(|p| p.position.z == 0.0));
    }

    #[test]
    fn distinct_sites_are_distinct_points() {
        let mut store = ParticleStore::with_types(SimBox::cubic(8.0).unwrap(), &["A"]).unwrap();
        LatticeBuilder::new(8).populate(&mut store).unwrap();
        let ps = store.particles();
        for i in 0..ps.len() {
            for j in (i + 1)..ps.len() {
                assert!((ps[i].position - ps[j].position).norm() > 1.0);
            }
        }
    }
}
