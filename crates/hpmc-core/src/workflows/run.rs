use crate::engine::counters::{MoveCounters, RunStatistics};
use crate::engine::error::EngineError;
use crate::engine::integrator::HpmcIntegrator;
use crate::engine::progress::{Progress, ProgressReporter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub sweeps: u64,
    /// Zero the integrator's cumulative counters before the first sweep.
    pub reset_counters: bool,
}

impl RunOptions {
    pub fn new(sweeps: u64) -> Self {
        Self {
            sweeps,
            reset_counters: false,
        }
    }

    pub fn reset_counters(mut self, reset: bool) -> Self {
        self.reset_counters = reset;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub statistics: RunStatistics,
    /// Cumulative counters after the run.
    pub total: MoveCounters,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn counters(&self) -> &MoveCounters {
        &self.statistics.counters
    }

    pub fn moves_per_second(&self) -> f64 {
        self.statistics.moves_per_second()
    }
}

/// Runs `options.sweeps` sweeps. `cancel` is polled between sweeps; a cancelled run still
/// returns the statistics of the sweeps it completed.
#[instrument(skip_all, name = "run_workflow", fields(sweeps = options.sweeps))]
pub fn run(
    integrator: &mut HpmcIntegrator,
    options: &RunOptions,
    reporter: &ProgressReporter,
    cancel: Option<&AtomicBool>,
) -> Result<RunSummary, EngineError> {
    reporter.report(Progress::PhaseStart { name: "Validation" });
    integrator.validate()?;
    reporter.report(Progress::PhaseFinish);

    if options.reset_counters {
        integrator.reset_counters();
    }

    info!(
        seed = integrator.config().seed,
        backend = integrator.backend_name(),
        start_timestep = integrator.timestep(),
        "Starting HPMC run."
    );
    reporter.report(Progress::RunStart {
        total_sweeps: options.sweeps,
    });

    let started = Instant::now();
    let mut counters = MoveCounters::default();
    let mut completed = 0;
    let mut cancelled = false;

    for sweep in 1..=options.sweeps {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            info!(completed, "Run cancelled between sweeps.");
            reporter.report(Progress::Message(format!(
                "Cancelled after {completed} sweeps."
            )));
            cancelled = true;
            break;
        }

        let swept = integrator.sweep()?;
        counters += swept;
        completed = sweep;
        reporter.report(Progress::SweepFinished {
            sweep,
            translate_acceptance: swept.translate_acceptance(),
            rotate_acceptance: swept.rotate_acceptance(),
        });
    }

    let statistics = RunStatistics {
        counters,
        sweeps: completed,
        elapsed: started.elapsed(),
    };
    integrator.record_run(statistics);
    reporter.report(Progress::RunFinish);

    info!(
        sweeps = completed,
        translate_acceptance = counters.translate_acceptance(),
        rotate_acceptance = counters.rotate_acceptance(),
        moves_per_second = statistics.moves_per_second(),
        "HPMC run complete."
    );

    Ok(RunSummary {
        statistics,
        total: integrator.counters(),
        cancelled,
    })
}
