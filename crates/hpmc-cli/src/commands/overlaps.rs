use crate::cli::OverlapsArgs;
use crate::commands::prepare_integrator;
use crate::config::{CliOverrides, PartialRunConfig};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use hpmc::engine::progress::ProgressReporter;
use tracing::info;

pub async fn run(args: OverlapsArgs) -> Result<()> {
    let config = PartialRunConfig::from_file(&args.config)?.merge_with_cli(&CliOverrides::default())?;
    let integrator = prepare_integrator(&config, Some(&args.input))?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let pairs = tokio::task::block_in_place(|| integrator.map_overlaps(&reporter))?;
    info!(count = pairs.len(), "Overlap scan finished.");

    if args.list {
        println!("{}", serde_json::to_string_pretty(&pairs).map_err(anyhow::Error::from)?);
    } else {
        println!("{}", pairs.len());
    }
    Ok(())
}
