use clap::{Args, Parser, Subcommand, ValueEnum};
use hpmc::engine::config::BackendKind;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "HPMC CLI - hard-particle Monte Carlo sampling of rigid shapes with implicit depletants.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used by the threaded backend.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a number of sweeps and write the final configuration.
    Run(RunArgs),
    /// Count or list overlapping pairs in a configuration.
    Overlaps(OverlapsArgs),
    /// Print the geometric description of every configured shape as JSON.
    Shapes(ShapesArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    Serial,
    Threaded,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Serial => BackendKind::Serial,
            BackendArg::Threaded => BackendKind::Threaded,
        }
    }
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the run configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Initial configuration as a CSV snapshot. Without it the `[init]` lattice is used.
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Where to write the final configuration as a CSV snapshot.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Override the number of sweeps from the config file.
    #[arg(short = 'n', long, value_name = "INT")]
    pub sweeps: Option<u64>,

    /// Override the random seed from the config file.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Override the execution backend from the config file.
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Restore integrator parameters from a JSON state file before running.
    #[arg(long, value_name = "PATH")]
    pub restore: Option<PathBuf>,

    /// Write the integrator parameters as a JSON state file after the run.
    #[arg(long, value_name = "PATH")]
    pub checkpoint: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S types.A.d=0.2
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `overlaps` subcommand.
#[derive(Args, Debug)]
pub struct OverlapsArgs {
    /// Path to the run configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Configuration to inspect, as a CSV snapshot.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Print every overlapping pair of tags instead of just the count.
    #[arg(long)]
    pub list: bool,
}

/// Arguments for the `shapes` subcommand.
#[derive(Args, Debug)]
pub struct ShapesArgs {
    /// Path to the run configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_arguments_parse_with_overrides() {
        let cli = Cli::parse_from([
            "hpmc", "-vv", "run", "-c", "run.toml", "-n", "500", "--seed", "9", "--backend",
            "serial", "-S", "types.A.d=0.2",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("expected the run command");
        };
        assert_eq!(args.config, PathBuf::from("run.toml"));
        assert_eq!(args.sweeps, Some(500));
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.backend, Some(BackendArg::Serial));
        assert_eq!(args.set_values, vec!["types.A.d=0.2".to_string()]);
        assert!(args.input.is_none());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["hpmc", "-q", "-v", "shapes", "-c", "run.toml"]);
        assert!(result.is_err());
    }

    #[test]
    fn overlaps_requires_input() {
        assert!(Cli::try_parse_from(["hpmc", "overlaps", "-c", "run.toml"]).is_err());
        let cli = Cli::parse_from(["hpmc", "overlaps", "-c", "run.toml", "-i", "in.csv", "--list"]);
        let Commands::Overlaps(args) = cli.command else {
            panic!("expected the overlaps command");
        };
        assert!(args.list);
    }

    #[test]
    fn backend_argument_maps_to_kind() {
        assert_eq!(BackendKind::from(BackendArg::Threaded), BackendKind::Threaded);
    }
}
