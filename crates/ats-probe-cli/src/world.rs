//! Cucumber world.
//!
//! Every scenario gets its own [`AtsWorld`], and with it its own
//! [`ScenarioContext`] and browser. The runner installs the suite
//! configuration and launcher with [`install`] before cucumber starts
//! building worlds.

use ats_probe::{ProbeResult, ScenarioContext, SessionLauncher, SuiteConfig};
use cucumber::World;
use std::sync::{Arc, RwLock};

/// Configuration and launcher shared by every world of a run
#[derive(Debug, Clone)]
pub struct WorldSetup {
    /// Suite configuration
    pub config: Arc<SuiteConfig>,
    /// Opens one browser per scenario
    pub launcher: Arc<dyn SessionLauncher>,
}

impl WorldSetup {
    /// Bundle a configuration with a launcher
    #[must_use]
    pub fn new(config: SuiteConfig, launcher: Arc<dyn SessionLauncher>) -> Self {
        Self {
            config: Arc::new(config),
            launcher,
        }
    }
}

static SETUP: RwLock<Option<WorldSetup>> = RwLock::new(None);

/// Make `setup` the source of every world created from now on
pub fn install(setup: WorldSetup) {
    match SETUP.write() {
        Ok(mut slot) => *slot = Some(setup),
        Err(poisoned) => *poisoned.into_inner() = Some(setup),
    }
}

fn installed() -> WorldSetup {
    let current = match SETUP.read() {
        Ok(slot) => slot.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    current.unwrap_or_else(|| WorldSetup::new(SuiteConfig::default(), default_launcher()))
}

/// The launcher used when none was installed
#[must_use]
pub fn default_launcher() -> Arc<dyn SessionLauncher> {
    #[cfg(feature = "browser")]
    {
        Arc::new(ats_probe::ChromiumLauncher)
    }
    #[cfg(not(feature = "browser"))]
    {
        Arc::new(ats_probe::FailingLauncher::new(
            "ats-probe-cli was built without the `browser` feature",
        ))
    }
}

/// State of one scenario
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct AtsWorld {
    ctx: ScenarioContext,
    launcher: Arc<dyn SessionLauncher>,
}

impl AtsWorld {
    /// World built from the installed setup
    #[must_use]
    pub fn new() -> Self {
        Self::with_setup(installed())
    }

    /// World built from an explicit setup
    #[must_use]
    pub fn with_setup(setup: WorldSetup) -> Self {
        Self {
            ctx: ScenarioContext::new(setup.config),
            launcher: setup.launcher,
        }
    }

    /// The scenario context steps drive
    pub fn ctx(&mut self) -> &mut ScenarioContext {
        &mut self.ctx
    }

    /// Open the scenario's browser
    pub async fn start(&mut self, scenario: &str) -> ProbeResult<()> {
        self.ctx.start(scenario, self.launcher.as_ref()).await
    }

    /// Close the browser and raise soft failures
    pub async fn finish(&mut self) -> ProbeResult<()> {
        self.ctx.finish().await
    }
}

impl Default for AtsWorld {
    fn default() -> Self {
        Self::new()
    }
}
