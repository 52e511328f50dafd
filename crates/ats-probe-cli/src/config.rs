//! CLI configuration
//!
//! [`RunSettings`] is the suite configuration file with the command-line
//! overrides applied on top.

use crate::commands::{ProfileArg, RunArgs};
use crate::error::{CliError, CliResult};
use ats_probe::SuiteConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// From `-q` and the `-v` count
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default tracing directive when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn,ats_probe=info",
            Self::Verbose => "info,ats_probe=debug",
            Self::Debug => "debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stdout().features().colors_supported(),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }
}

/// How scenarios are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunProfile {
    /// One scenario at a time
    Sequential,
    /// Up to `jobs` scenarios at once
    Parallel {
        /// Concurrent scenario limit
        jobs: usize,
    },
}

impl RunProfile {
    /// Concurrent scenario limit
    #[must_use]
    pub const fn max_concurrent(self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Parallel { jobs } => jobs,
        }
    }
}

/// Everything a run needs
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Suite configuration, overrides applied
    pub suite: SuiteConfig,
    /// Feature directory
    pub features: PathBuf,
    /// Tag filter, without `@`
    pub tag: String,
    /// Scheduling
    pub profile: RunProfile,
}

impl RunSettings {
    /// Settings for `features` with a default suite configuration
    #[must_use]
    pub fn new(suite: SuiteConfig, features: impl Into<PathBuf>) -> Self {
        Self {
            suite,
            features: features.into(),
            tag: "ATS".to_string(),
            profile: RunProfile::Sequential,
        }
    }

    /// Load the suite configuration and apply command-line overrides
    pub fn resolve(args: &RunArgs) -> CliResult<Self> {
        let mut suite = load_suite(args.config.as_deref())?;
        if args.headed {
            suite.driver.headless = false;
        }
        if let Some(policy) = args.policy {
            suite.policy = policy;
        }

        let profile = match args.profile {
            ProfileArg::Sequential => RunProfile::Sequential,
            ProfileArg::Parallel => {
                let jobs = match args.jobs {
                    Some(0) => return Err(CliError::invalid_argument("--jobs must be at least 1")),
                    Some(jobs) => jobs,
                    None => std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
                };
                RunProfile::Parallel { jobs }
            }
        };

        let tag = args.tags.trim().trim_start_matches('@').to_string();
        if tag.is_empty() {
            return Err(CliError::invalid_argument("--tags must not be empty"));
        }

        Ok(Self {
            suite,
            features: args.features.clone(),
            tag,
            profile,
        })
    }
}

/// Discover and validate the suite configuration
pub fn load_suite(path: Option<&Path>) -> CliResult<SuiteConfig> {
    let suite = SuiteConfig::discover(path).map_err(|e| CliError::config(e.to_string()))?;
    suite.validate().map_err(|e| CliError::config(e.to_string()))?;
    Ok(suite)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use ats_probe::FailurePolicy;
    use clap::Parser;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["run"];
        argv.extend_from_slice(extra);
        RunArgs::try_parse_from(argv).unwrap()
    }

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_from_flags() {
            assert_eq!(Verbosity::from_flags(true, 3), Verbosity::Quiet);
            assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
            assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
            assert_eq!(Verbosity::from_flags(false, 5), Verbosity::Debug);
        }

        #[test]
        fn test_log_directive() {
            assert_eq!(Verbosity::Quiet.log_directive(), "error");
            assert!(Verbosity::Verbose.log_directive().contains("ats_probe=debug"));
            assert!(Verbosity::Debug.is_verbose());
            assert!(!Verbosity::Normal.is_quiet());
        }
    }

    mod settings_tests {
        use super::*;

        #[test]
        fn test_sequential_defaults() {
            let settings = RunSettings::resolve(&run_args(&["--config", "/nonexistent/ats-probe.yaml"]));
            assert!(settings.is_err());

            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("ats-probe.yaml");
            std::fs::write(&path, "policy: soft\n").unwrap();
            let settings = RunSettings::resolve(&run_args(&["--config", path.to_str().unwrap()])).unwrap();
            assert_eq!(settings.profile, RunProfile::Sequential);
            assert_eq!(settings.profile.max_concurrent(), 1);
            assert_eq!(settings.suite.policy, FailurePolicy::Soft);
            assert!(settings.suite.driver.headless);
            assert_eq!(settings.tag, "ATS");
        }

        #[test]
        fn test_overrides_win_over_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("suite.yaml");
            std::fs::write(&path, "policy: soft\n").unwrap();
            let settings = RunSettings::resolve(&run_args(&[
                "--config",
                path.to_str().unwrap(),
                "--policy",
                "fail-fast",
                "--headed",
                "--profile",
                "parallel",
                "--jobs",
                "3",
                "--tags",
                "@smoke",
            ]))
            .unwrap();
            assert_eq!(settings.suite.policy, FailurePolicy::FailFast);
            assert!(!settings.suite.driver.headless);
            assert_eq!(settings.profile, RunProfile::Parallel { jobs: 3 });
            assert_eq!(settings.tag, "smoke");
        }

        #[test]
        fn test_parallel_defaults_to_cpu_count() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("suite.yaml");
            std::fs::write(&path, "{}\n").unwrap();
            let settings =
                RunSettings::resolve(&run_args(&["--config", path.to_str().unwrap(), "--profile", "parallel"]))
                    .unwrap();
            assert!(settings.profile.max_concurrent() >= 1);
        }

        #[test]
        fn test_zero_jobs_rejected() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("suite.yaml");
            std::fs::write(&path, "{}\n").unwrap();
            let err = RunSettings::resolve(&run_args(&[
                "--config",
                path.to_str().unwrap(),
                "--profile",
                "parallel",
                "--jobs",
                "0",
            ]))
            .unwrap_err();
            assert!(matches!(err, CliError::InvalidArgument { .. }));
        }
    }
}
