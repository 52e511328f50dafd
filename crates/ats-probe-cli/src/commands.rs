//! CLI command definitions using clap

use ats_probe::FailurePolicy;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ats-probe: BDD runner for the ATS regression suite
#[derive(Parser, Debug)]
#[command(name = "ats-probe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run feature files against a browser
    Run(RunArgs),

    /// Print the effective suite configuration as YAML
    Config(ConfigArgs),

    /// List the step vocabulary
    Steps,
}

/// Arguments for the run command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Directory holding the feature files
    #[arg(long, default_value = "features/ATS")]
    pub features: PathBuf,

    /// Only run scenarios carrying this tag (without `@`)
    #[arg(long, default_value = "ATS")]
    pub tags: String,

    /// Scenario scheduling
    #[arg(long, value_enum, default_value = "sequential")]
    pub profile: ProfileArg,

    /// Concurrent scenarios for the parallel profile (default: CPU count)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Suite configuration file (default: ./ats-probe.yaml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Failure policy for every step without an override (fail-fast, soft)
    #[arg(long)]
    pub policy: Option<FailurePolicy>,
}

/// Arguments for the config command
#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    /// Suite configuration file (default: ./ats-probe.yaml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Scenario scheduling profile
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileArg {
    /// One scenario at a time
    #[default]
    Sequential,
    /// Several scenarios at once, one browser each
    Parallel,
}

/// Color argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod parse_tests {
        use super::*;

        #[test]
        fn test_run_defaults() {
            let cli = Cli::try_parse_from(["ats-probe", "run"]).unwrap();
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert_eq!(args.features, PathBuf::from("features/ATS"));
            assert_eq!(args.tags, "ATS");
            assert_eq!(args.profile, ProfileArg::Sequential);
            assert_eq!(args.jobs, None);
            assert!(!args.headed);
            assert_eq!(args.policy, None);
        }

        #[test]
        fn test_run_all_flags() {
            let cli = Cli::try_parse_from([
                "ats-probe",
                "-vv",
                "run",
                "--features",
                "suite",
                "--tags",
                "smoke",
                "--profile",
                "parallel",
                "--jobs",
                "4",
                "--config",
                "ci.yaml",
                "--headed",
                "--policy",
                "soft",
            ])
            .unwrap();
            assert_eq!(cli.verbose, 2);
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert_eq!(args.profile, ProfileArg::Parallel);
            assert_eq!(args.jobs, Some(4));
            assert_eq!(args.config, Some(PathBuf::from("ci.yaml")));
            assert!(args.headed);
            assert_eq!(args.policy, Some(FailurePolicy::Soft));
        }

        #[test]
        fn test_bad_policy_rejected() {
            assert!(Cli::try_parse_from(["ats-probe", "run", "--policy", "lenient"]).is_err());
        }

        #[test]
        fn test_subcommand_required() {
            assert!(Cli::try_parse_from(["ats-probe"]).is_err());
        }

        #[test]
        fn test_color_conversion() {
            use crate::config::ColorChoice;
            assert_eq!(ColorChoice::from(ColorArg::Never), ColorChoice::Never);
            assert_eq!(ColorChoice::from(ColorArg::Always), ColorChoice::Always);
        }
    }
}
