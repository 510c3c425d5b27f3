use crate::core::models::particle::ParticleRecord;
use crate::core::models::sim_box::SimBox;
use nalgebra::{Point3, Vector3};
use tracing::debug;

const MAX_CELLS: usize = 1 << 20;
/// Keeps cell widths strictly above the minimum so that contact at exactly the interaction
/// range still falls inside the stencil.
const WIDTH_SLACK: f64 = 1e-6;
const NUM_COLORS: usize = 8;

/// Uniform spatial grid over the periodic box, with a checkerboard coloring of its cells.
///
/// Cells of one color are never neighbors of each other, so all cells of a color can run their
/// trial moves concurrently. The grid stays valid while
/// `interaction_range + 2 * (drift + max_move)` is below the narrowest constraining cell width,
/// where `drift` bounds how far any particle has moved since the grid was built.
#[derive(Debug, Clone)]
pub struct CellList {
    dims: [usize; 3],
    widths: Vector3<f64>,
    cells: Vec<Vec<usize>>,
    cell_of: Vec<usize>,
    stencils: Vec<Vec<usize>>,
    colors: Vec<Vec<usize>>,
    drift: f64,
}

impl CellList {
    pub fn build(
        sim_box: &SimBox,
        particles: &[ParticleRecord],
        interaction_range: f64,
        max_move: f64,
        margin: f64,
    ) -> Self {
        let mut min_width = (interaction_range + 2.0 * max_move + margin) * (1.0 + WIDTH_SLACK);
        let mut dims = grid_dims(sim_box, min_width);
        while dims.iter().product::<usize>() > MAX_CELLS {
            min_width *= 1.5;
            dims = grid_dims(sim_box, min_width);
        }

        let lengths = sim_box.lengths();
        let widths = Vector3::new(
            lengths.x / dims[0] as f64,
            lengths.y / dims[1] as f64,
            lengths.z / dims[2] as f64,
        );
        let num_cells = dims.iter().product::<usize>();

        let mut list = Self {
            dims,
            widths,
            cells: vec![Vec::new(); num_cells],
            cell_of: Vec::with_capacity(particles.len()),
            stencils: Vec::with_capacity(num_cells),
            colors: vec![Vec::new(); NUM_COLORS],
            drift: 0.0,
        };

        for (index, particle) in particles.iter().enumerate() {
            let cell = list.locate(sim_box, &particle.position);
            list.cells[cell].push(index);
            list.cell_of.push(cell);
        }

        for cell in 0..num_cells {
            let stencil = list.neighbor_cells(cell);
            list.stencils.push(stencil);
            if !list.cells[cell].is_empty() {
                let color = list.color_of(cell);
                list.colors[color].push(cell);
            }
        }

        debug!(
            dims = ?list.dims,
            interaction_range,
            max_move,
            margin,
            "Cell list rebuilt."
        );
        list
    }

    fn locate(&self, sim_box: &SimBox, position: &Point3<f64>) -> usize {
        let frac = sim_box.fractional(position);
        let mut idx = [0usize; 3];
        for axis in 0..3 {
            let raw = (frac[axis] * self.dims[axis] as f64).floor();
            idx[axis] = (raw.max(0.0) as usize).min(self.dims[axis] - 1);
        }
        self.flatten(idx)
    }

    fn flatten(&self, idx: [usize; 3]) -> usize {
        (idx[0] * self.dims[1] + idx[1]) * self.dims[2] + idx[2]
    }

    fn unflatten(&self, cell: usize) -> [usize; 3] {
        let z = cell % self.dims[2];
        let rest = cell / self.dims[2];
        [rest / self.dims[1], rest % self.dims[1], z]
    }

    fn neighbor_cells(&self, cell: usize) -> Vec<usize> {
        let center = self.unflatten(cell);
        let mut out = Vec::with_capacity(27);
        for dx in -1i64..=1 {
            for dy in -1i64..=1 {
                for dz in -1i64..=1 {
                    let offset = [dx, dy, dz];
                    let mut idx = [0usize; 3];
                    for axis in 0..3 {
                        let n = self.dims[axis] as i64;
                        idx[axis] = (center[axis] as i64 + offset[axis]).rem_euclid(n) as usize;
                    }
                    out.push(self.flatten(idx));
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    fn color_of(&self, cell: usize) -> usize {
        let idx = self.unflatten(cell);
        (0..3)
            .filter(|&axis| self.dims[axis] >= 2)
            .map(|axis| (idx[axis] & 1) << axis)
            .sum()
    }

    /// Narrowest width along axes where the stencil does not already span the whole box.
    fn constraining_width(&self) -> f64 {
        (0..3)
            .filter(|&axis| self.dims[axis] >= 3)
            .map(|axis| self.widths[axis])
            .fold(f64::INFINITY, f64::min)
    }

    /// Whether another pass with these move bounds keeps the coloring conflict free.
    pub fn supports_pass(&self, interaction_range: f64, max_move: f64, num_particles: usize) -> bool {
        num_particles == self.cell_of.len()
            && interaction_range + 2.0 * (self.drift + max_move) < self.constraining_width()
    }

    pub fn record_drift(&mut self, displacement: f64) {
        self.drift += displacement;
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn members(&self, cell: usize) -> &[usize] {
        &self.cells[cell]
    }

    pub fn stencil(&self, cell: usize) -> &[usize] {
        &self.stencils[cell]
    }

    pub fn cell_of(&self, particle: usize) -> usize {
        self.cell_of[particle]
    }

    /// Non-empty cells grouped by color, in the fixed order the colors are processed.
    pub fn colors(&self) -> impl Iterator<Item = &[usize]> {
        self.colors
            .iter()
            .filter(|cells| !cells.is_empty())
            .map(Vec::as_slice)
    }

    /// Every particle index that may interact with a particle binned in `cell`.
    pub fn neighbors(&self, cell: usize) -> impl Iterator<Item = usize> + '_ {
        self.stencils[cell]
            .iter()
            .flat_map(move |&c| self.cells[c].iter().copied())
    }
}

fn grid_dims(sim_box: &SimBox, min_width: f64) -> [usize; 3] {
    let mut dims = [1usize; 3];
    if !(min_width > 0.0) {
        return dims;
    }
    for (axis, dim) in dims.iter_mut().enumerate().take(sim_box.periodic_axes()) {
        let n = (sim_box.lengths()[axis] / min_width).floor();
        let mut n = if n.is_finite() && n >= 1.0 { n as usize } else { 1 };
        if n >= 3 && n % 2 == 1 {
            n -= 1;
        }
        *dim = n;
    }
    dims
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::LatticeBuilder;
    use crate::core::models::particle::ParticleStore;

    fn lattice(length: f64, count: usize) -> ParticleStore {
        let mut store = ParticleStore::with_types(SimBox::cubic(length).unwrap(), &["A"]).unwrap();
        LatticeBuilder::new(count).populate(&mut store).unwrap();
        store
    }

    #[test]
    fn grid_uses_even_cell_counts() {
        let store = lattice(10.0, 64);
        let cells = CellList::build(store.sim_box(), store.particles(), 1.0, 0.1, 0.0);
        assert_eq!(cells.dims(), [8, 8, 8]);

        let store = lattice(9.0, 27);
        let cells = CellList::build(store.sim_box(), store.particles(), 1.0, 0.1, 0.0);
        assert_eq!(cells.dims(), [6, 6, 6]);
    }

    #[test]
    fn every_particle_is_binned_once() {
        let store = lattice(10.0, 125);
        let cells = CellList::build(store.sim_box(), store.particles(), 1.0, 0.1, 0.0);
        let total: usize = (0..cells.num_cells()).map(|c| cells.members(c).len()).sum();
        assert_eq!(total, store.len());
        for i in 0..store.len() {
            let cell = cells.cell_of(i);
            assert!(cells.members(cell).contains(&i));
            assert!(cells.neighbors(cell).any(|j| j == i));
        }
    }

    #[test]
    fn cells_of_one_color_are_never_neighbors() {
        let store = lattice(12.0, 216);
        let cells = CellList::build(store.sim_box(), store.particles(), 1.0, 0.2, 0.3);
        let mut seen = 0;
        for color in cells.colors() {
            for &a in color {
                for &b in color {
                    if a != b {
                        assert!(!cells.stencil(a).contains(&b), "cells {a} and {b} conflict");
                    }
                }
                seen += 1;
            }
        }
        let occupied = (0..cells.num_cells())
            .filter(|&c| !cells.members(c).is_empty())
            .count();
        assert_eq!(seen, occupied);
    }

    #[test]
    fn neighbors_within_range_are_in_stencil() {
        let store = lattice(8.0, 512);
        let range = 1.1;
        let cells = CellList::build(store.sim_box(), store.particles(), range, 0.05, 0.0);
        for i in 0..store.len() {
            let stencil_members: Vec<usize> = cells.neighbors(cells.cell_of(i)).collect();
            for j in 0..store.len() {
                if store.separation(i, j).norm() < range {
                    assert!(stencil_members.contains(&j));
                }
            }
        }
    }

    #[test]
    fn small_box_collapses_to_single_cell() {
        let store = lattice(2.0, 8);
        let cells = CellList::build(store.sim_box(), store.particles(), 1.0, 0.1, 0.0);
        assert_eq!(cells.dims(), [1, 1, 1]);
        assert_eq!(cells.colors().count(), 1);
        assert!(cells.supports_pass(1.0, 0.1, store.len()));
    }

    #[test]
    fn planar_box_has_one_layer() {
        let mut store = ParticleStore::with_types(SimBox::square(10.0).unwrap(), &["A"]).unwrap();
        LatticeBuilder::new(25).populate(&mut store).unwrap();
        let cells = CellList::build(store.sim_box(), store.particles(), 1.0, 0.1, 0.0);
        assert_eq!(cells.dims()[2], 1);
        assert!(cells.colors().count() <= 4);
    }

    #[test]
    fn drift_eventually_invalidates_grid() {
        let store = lattice(10.0, 64);
        let mut cells = CellList::build(store.sim_box(), store.particles(), 1.0, 0.1, 0.4);
        assert!(cells.supports_pass(1.0, 0.1, store.len()));
        cells.record_drift(0.1);
        assert!(cells.supports_pass(1.0, 0.1, store.len()));
        cells.record_drift(0.2);
        assert!(!cells.supports_pass(1.0, 0.1, store.len()));
        assert!(!cells.supports_pass(1.0, 0.1, store.len() + 1));
    }
}
