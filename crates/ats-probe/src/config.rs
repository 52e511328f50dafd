//! Suite configuration.
//!
//! Everything tunable about a run lives in [`SuiteConfig`], loaded from
//! `ats-probe.yaml` when present. Durations are written in seconds.

use crate::driver::DriverConfig;
use crate::navigation::MenuConfig;
use crate::result::{ProbeError, ProbeResult};
use crate::soft::{FailurePolicy, StepPolicies};
use crate::wait::WaitOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "ats-probe.yaml";

/// Overlay chrome hidden before record and option clicks
pub const DEFAULT_OVERLAY_SELECTORS: &[&str] = &[
    ".welcome-text-for-desktop",
    ".navbar-header",
    ".sticky-header",
    ".overlay",
    ".modal-backdrop",
];

/// Serde helper for durations written as (possibly fractional) seconds
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serialize whole seconds as an integer, anything else as a float
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if value.subsec_nanos() == 0 {
            serializer.serialize_u64(value.as_secs())
        } else {
            serializer.serialize_f64(value.as_secs_f64())
        }
    }

    /// Deserialize a non-negative number of seconds
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "duration must be a non-negative number of seconds, got {secs}"
            )));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}

// =============================================================================
// TIMEOUTS
// =============================================================================

/// Timeouts and fixed delays used by the page flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Element wait timeout
    #[serde(with = "duration_secs")]
    pub element: Duration,
    /// Page-load wait timeout
    #[serde(with = "duration_secs")]
    pub page_load: Duration,
    /// Wait polling interval
    #[serde(with = "duration_secs")]
    pub poll_interval: Duration,
    /// Settle delay after the final login click
    #[serde(with = "duration_secs")]
    pub login_settle: Duration,
    /// Observation delay after clicking an option
    #[serde(with = "duration_secs")]
    pub option_observe: Duration,
    /// Settle delay between scroll steps
    #[serde(with = "duration_secs")]
    pub scroll_settle: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            element: Duration::from_secs(15),
            page_load: Duration::from_secs(20),
            poll_interval: Duration::from_secs(1),
            login_settle: Duration::from_secs(5),
            option_observe: Duration::from_secs(5),
            scroll_settle: Duration::from_secs(1),
        }
    }
}

impl Timeouts {
    /// Wait options for element waits
    #[must_use]
    pub const fn element_wait(&self) -> WaitOptions {
        WaitOptions::new(self.element).with_poll_interval(self.poll_interval)
    }

    /// Wait options for page-level waits
    #[must_use]
    pub const fn page_wait(&self) -> WaitOptions {
        WaitOptions::new(self.page_load).with_poll_interval(self.poll_interval)
    }

    /// Every timeout and delay set to zero-ish values, for tests
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            element: Duration::from_millis(50),
            page_load: Duration::from_millis(50),
            poll_interval: Duration::from_millis(10),
            login_settle: Duration::ZERO,
            option_observe: Duration::ZERO,
            scroll_settle: Duration::ZERO,
        }
    }
}

// =============================================================================
// SUITE CONFIG
// =============================================================================

/// Complete configuration of a suite run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Browser launch settings
    pub driver: DriverConfig,
    /// Timeouts and delays
    pub timeouts: Timeouts,
    /// Default failure policy
    pub policy: FailurePolicy,
    /// Per-step overrides of `policy`
    pub step_policies: StepPolicies,
    /// Overlay selectors hidden before record/option clicks
    pub overlay_selectors: Vec<String>,
    /// Menu discovery settings
    pub menu: MenuConfig,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            driver: DriverConfig::default(),
            timeouts: Timeouts::default(),
            policy: FailurePolicy::default(),
            step_policies: StepPolicies::default(),
            overlay_selectors: DEFAULT_OVERLAY_SELECTORS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            menu: MenuConfig::default(),
        }
    }
}

impl SuiteConfig {
    /// Create config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML
    pub fn from_yaml_str(yaml: &str) -> ProbeResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn load(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded suite config");
        Ok(config)
    }

    /// Load `path` if given, else `ats-probe.yaml` if it exists, else defaults
    pub fn discover(path: Option<&Path>) -> ProbeResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::load(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Effective policy for a step
    #[must_use]
    pub fn policy_for(&self, step: &str) -> FailurePolicy {
        self.step_policies.policy_for(step, self.policy)
    }

    /// Set the default failure policy
    #[must_use]
    pub const fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set timeouts
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Reject configurations no run could succeed with
    pub fn validate(&self) -> ProbeResult<()> {
        if self.timeouts.poll_interval.is_zero() {
            return Err(ProbeError::config("timeouts.poll_interval must be positive"));
        }
        if self.driver.window_width == 0 || self.driver.window_height == 0 {
            return Err(ProbeError::config("driver window size must be non-zero"));
        }
        if self.menu.strategies.is_empty() {
            return Err(ProbeError::config("menu.strategies must name at least one strategy"));
        }
        Ok(())
    }
}
