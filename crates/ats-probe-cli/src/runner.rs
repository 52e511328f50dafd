//! Suite runner
//!
//! Wires [`AtsWorld`] into cucumber: tag filter, scheduling profile, and the
//! before/after hooks that give each scenario its own browser session.

use crate::config::{CliConfig, RunSettings};
use crate::error::{CliError, CliResult};
use crate::output::Reporter;
use crate::world::{install, AtsWorld, WorldSetup};
use ats_probe::SessionLauncher;
use cucumber::gherkin::{Feature, Rule, Scenario};
use cucumber::writer::Stats as _;
use cucumber::World as _;
use futures::FutureExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

static TEARDOWN_FAILURES: AtomicUsize = AtomicUsize::new(0);

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the verbosity flags. A second call is a no-op.
pub fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.color.should_color())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Whether a scenario carries `tag`, directly or through its feature or rule
#[must_use]
pub fn has_tag(feature: &Feature, rule: Option<&Rule>, scenario: &Scenario, tag: &str) -> bool {
    let wanted = |tags: &[String]| tags.iter().any(|t| t.trim_start_matches('@') == tag);
    wanted(&feature.tags) || rule.is_some_and(|r| wanted(&r.tags)) || wanted(&scenario.tags)
}

/// Runs feature files with one browser per scenario
#[derive(Debug)]
pub struct SuiteRunner {
    settings: RunSettings,
    launcher: Arc<dyn SessionLauncher>,
    reporter: Reporter,
}

impl SuiteRunner {
    /// Create a runner
    #[must_use]
    pub fn new(settings: RunSettings, launcher: Arc<dyn SessionLauncher>, config: &CliConfig) -> Self {
        let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
        Self {
            settings,
            launcher,
            reporter,
        }
    }

    /// Settings this runner was built with
    #[must_use]
    pub const fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Run every matching scenario; `Err` when any failed
    pub async fn run(self) -> CliResult<()> {
        if !self.settings.features.exists() {
            return Err(CliError::config(format!(
                "feature directory {} does not exist",
                self.settings.features.display()
            )));
        }

        install(WorldSetup::new(self.settings.suite.clone(), Arc::clone(&self.launcher)));
        TEARDOWN_FAILURES.store(0, Ordering::SeqCst);

        let tag = self.settings.tag.clone();
        let jobs = self.settings.profile.max_concurrent();
        self.reporter.info(&format!(
            "running @{tag} scenarios from {} ({jobs} at a time)",
            self.settings.features.display()
        ));
        tracing::info!(status = "info", tag = %tag, jobs, features = %self.settings.features.display(), "suite started");

        // Our own flags are already parsed; keep cucumber off argv.
        let summary = AtsWorld::cucumber()
            .with_cli(cucumber::cli::Opts::default())
            .max_concurrent_scenarios(jobs)
            .before(|_feature, _rule, scenario, world| {
                async move {
                    if let Err(err) = world.start(&scenario.name).await {
                        tracing::error!(status = "error", scenario = %scenario.name, "{err}");
                    }
                }
                .boxed_local()
            })
            .after(|_feature, _rule, scenario, _event, world| {
                async move {
                    if let Some(world) = world {
                        if let Err(err) = world.finish().await {
                            let _ = TEARDOWN_FAILURES.fetch_add(1, Ordering::SeqCst);
                            tracing::error!(status = "error", scenario = %scenario.name, "teardown: {err}");
                        }
                    }
                }
                .boxed_local()
            })
            .filter_run(self.settings.features.clone(), move |feature, rule, scenario| {
                has_tag(feature, rule, scenario, &tag)
            })
            .await;

        let teardown_failures = TEARDOWN_FAILURES.load(Ordering::SeqCst);
        let failures = summary.failed_steps() + summary.parsing_errors() + summary.hook_errors() + teardown_failures;
        if summary.execution_has_failed() || teardown_failures > 0 {
            self.reporter
                .failure(&format!("suite failed ({teardown_failures} scenario teardown failure(s))"));
            return Err(CliError::SuiteFailed { failures });
        }
        self.reporter.success("suite passed");
        Ok(())
    }
}
