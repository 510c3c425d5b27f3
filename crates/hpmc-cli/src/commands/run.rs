use crate::cli::RunArgs;
use crate::commands::prepare_integrator;
use crate::config::{CliOverrides, PartialRunConfig};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use hpmc::{
    core::io::snapshot,
    engine::{progress::ProgressReporter, state::IntegratorState},
    workflows::{self, run::RunOptions},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

pub async fn run(args: RunArgs) -> Result<()> {
    let partial_config = PartialRunConfig::from_file(&args.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&CliOverrides::from(&args))?;

    let mut integrator = prepare_integrator(&config, args.input.as_deref())?;

    if let Some(path) = &args.restore {
        info!("Restoring integrator state from {:?}", path);
        let text = std::fs::read_to_string(path)?;
        let state = IntegratorState::from_json(&text)?;
        integrator.restore_state(&state)?;
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current sweep.");
            signal_flag.store(true, Ordering::SeqCst);
        }
    });

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let options = RunOptions::new(config.sweeps).reset_counters(true);

    println!(
        "Running {} sweep(s) on {} particle(s)...",
        config.sweeps,
        integrator.store()?.len()
    );
    let summary = tokio::task::block_in_place(|| {
        workflows::run::run(&mut integrator, &options, &reporter, Some(&cancel))
    })?;

    let counters = summary.counters();
    if summary.cancelled {
        println!(
            "Run interrupted after {} of {} sweep(s).",
            summary.statistics.sweeps, config.sweeps
        );
    }
    println!(
        "Translate acceptance: {:.4} ({} accepted / {} rejected)",
        counters.translate_acceptance(),
        counters.translate_accept,
        counters.translate_reject
    );
    println!(
        "Rotate acceptance:    {:.4} ({} accepted / {} rejected)",
        counters.rotate_acceptance(),
        counters.rotate_accept,
        counters.rotate_reject
    );
    println!(
        "Overlap checks: {}   Moves/s: {:.1}   Timestep: {}",
        counters.overlap_checks,
        summary.moves_per_second(),
        integrator.timestep()
    );

    if let Some(path) = &args.output {
        snapshot::write_file(path, integrator.store()?)?;
        println!("✓ Final configuration written to: {}", path.display());
    }

    if let Some(path) = &args.checkpoint {
        std::fs::write(path, integrator.snapshot_state()?.to_json()?)?;
        println!("✓ Integrator state written to: {}", path.display());
    }

    Ok(())
}
