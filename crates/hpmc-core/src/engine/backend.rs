//! Schedulers for the cells of one color.
//!
//! Cells of one color never share neighbors, so a backend may run them in any order or all at
//! once. Outcomes are returned in input order so that commits stay deterministic.

use super::config::BackendKind;
use super::kernel::{CellOutcome, SweepKernel};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub trait ExecutionBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn run_color(&self, kernel: &SweepKernel<'_>, cells: &[usize]) -> Vec<CellOutcome>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SerialBackend;

impl ExecutionBackend for SerialBackend {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn run_color(&self, kernel: &SweepKernel<'_>, cells: &[usize]) -> Vec<CellOutcome> {
        cells.iter().map(|&cell| kernel.run_cell(cell)).collect()
    }
}

/// Runs the cells of a color on the rayon thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadedBackend;

impl ExecutionBackend for ThreadedBackend {
    fn name(&self) -> &'static str {
        "threaded"
    }

    fn run_color(&self, kernel: &SweepKernel<'_>, cells: &[usize]) -> Vec<CellOutcome> {
        #[cfg(not(feature = "parallel"))]
        let iterator = cells.iter();
        #[cfg(feature = "parallel")]
        let iterator = cells.par_iter();

        iterator.map(|&cell| kernel.run_cell(cell)).collect()
    }
}

pub fn create(kind: BackendKind) -> Box<dyn ExecutionBackend> {
    match kind {
        BackendKind::Serial => Box::new(SerialBackend),
        BackendKind::Threaded => Box::new(ThreadedBackend),
    }
}
