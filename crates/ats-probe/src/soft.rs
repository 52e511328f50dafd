//! Soft assertions and the per-step failure policy.
//!
//! A step either fails fast (its error ends the scenario) or fails soft (the
//! error is recorded and the scenario continues). Soft failures are flushed
//! together by [`SoftAssertions::assert_all`] at scenario teardown.

use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// FAILURE POLICY
// =============================================================================

/// What a step does with a failed interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Return the error and stop the scenario
    #[default]
    FailFast,
    /// Record a soft failure and continue
    Soft,
}

impl FailurePolicy {
    /// Kebab-case name, as written in config files and on the command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FailFast => "fail-fast",
            Self::Soft => "soft",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Ok(Self::FailFast),
            "soft" => Ok(Self::Soft),
            other => Err(ProbeError::config(format!(
                "unknown failure policy '{other}' (expected fail-fast or soft)"
            ))),
        }
    }
}

/// Per-step policy overrides, keyed by step name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepPolicies(BTreeMap<String, FailurePolicy>);

impl StepPolicies {
    /// Create an empty override map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the policy for `step`
    #[must_use]
    pub fn with(mut self, step: impl Into<String>, policy: FailurePolicy) -> Self {
        let _ = self.0.insert(step.into(), policy);
        self
    }

    /// Policy for `step`, falling back to `default`
    #[must_use]
    pub fn policy_for(&self, step: &str, default: FailurePolicy) -> FailurePolicy {
        self.0.get(step).copied().unwrap_or(default)
    }

    /// Number of overrides
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no overrides
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate overrides in step-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, FailurePolicy)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

// =============================================================================
// SOFT ASSERTIONS
// =============================================================================

/// Collector for failures that should not stop the scenario
#[derive(Debug, Clone, Default)]
pub struct SoftAssertions {
    failures: Vec<String>,
}

impl SoftAssertions {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` unless `condition` holds; returns `condition`
    pub fn check(&mut self, condition: bool, message: impl Into<String>) -> bool {
        if !condition {
            self.fail(message);
        }
        condition
    }

    /// Record a failure
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(status = "error", soft = true, "{message}");
        self.failures.push(message);
    }

    /// Record the error of a failed result; passes the value through otherwise
    pub fn record<T>(&mut self, result: ProbeResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.fail(err.to_string());
                None
            }
        }
    }

    /// Route a step result through `policy`
    ///
    /// `FailFast` returns the error unchanged. `Soft` records it, prefixed with
    /// the step name, and yields `Ok(None)`.
    pub fn apply<T>(
        &mut self,
        policy: FailurePolicy,
        step: &str,
        result: ProbeResult<T>,
    ) -> ProbeResult<Option<T>> {
        match (policy, result) {
            (_, Ok(value)) => Ok(Some(value)),
            (FailurePolicy::FailFast, Err(err)) => Err(err),
            (FailurePolicy::Soft, Err(err)) => {
                self.fail(format!("{step}: {err}"));
                Ok(None)
            }
        }
    }

    /// Recorded failure messages, oldest first
    #[must_use]
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// True if nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Raise every recorded failure as one `AssertionFailed`
    pub fn assert_all(&self) -> ProbeResult<()> {
        if self.failures.is_empty() {
            return Ok(());
        }
        let listing = self
            .failures
            .iter()
            .enumerate()
            .map(|(i, f)| format!("  {}. {f}", i + 1))
            .collect::<Vec<_>>()
            .join("\n");
        Err(ProbeError::AssertionFailed {
            message: format!("{} soft failure(s):\n{listing}", self.failures.len()),
        })
    }

    /// Drop all recorded failures
    pub fn reset(&mut self) {
        self.failures.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod policy_tests {
        use super::*;

        #[test]
        fn test_default_is_fail_fast() {
            assert_eq!(FailurePolicy::default(), FailurePolicy::FailFast);
        }

        #[test]
        fn test_parse_and_display() {
            assert_eq!("soft".parse::<FailurePolicy>().unwrap(), FailurePolicy::Soft);
            assert_eq!(
                "Fail-Fast".parse::<FailurePolicy>().unwrap(),
                FailurePolicy::FailFast
            );
            assert!("lenient".parse::<FailurePolicy>().is_err());
            assert_eq!(FailurePolicy::Soft.to_string(), "soft");
        }

        #[test]
        fn test_step_overrides() {
            let policies = StepPolicies::new().with("find option", FailurePolicy::Soft);
            assert_eq!(
                policies.policy_for("find option", FailurePolicy::FailFast),
                FailurePolicy::Soft
            );
            assert_eq!(
                policies.policy_for("login", FailurePolicy::FailFast),
                FailurePolicy::FailFast
            );
            assert_eq!(policies.len(), 1);
        }

        #[test]
        fn test_step_policies_yaml_is_a_plain_map() {
            let policies: StepPolicies =
                serde_yaml_ng::from_str("find record: soft\nlogin: fail-fast\n").unwrap();
            assert_eq!(
                policies.policy_for("find record", FailurePolicy::FailFast),
                FailurePolicy::Soft
            );
        }
    }

    mod soft_assertion_tests {
        use super::*;

        #[test]
        fn test_empty_collector_passes() {
            assert!(SoftAssertions::new().assert_all().is_ok());
        }

        #[test]
        fn test_assert_all_lists_every_failure() {
            let mut soft = SoftAssertions::new();
            assert!(soft.check(true, "never recorded"));
            assert!(!soft.check(false, "first"));
            soft.fail("second");
            let err = soft.assert_all().unwrap_err();
            let msg = err.to_string();
            assert!(msg.contains("2 soft failure(s)"));
            assert!(msg.contains("1. first"));
            assert!(msg.contains("2. second"));
            assert!(!msg.contains("never recorded"));
        }

        #[test]
        fn test_record_passes_value_through() {
            let mut soft = SoftAssertions::new();
            assert_eq!(soft.record(Ok::<_, ProbeError>(7)), Some(7));
            assert_eq!(soft.record::<i32>(Err(ProbeError::driver("gone"))), None);
            assert_eq!(soft.failures().len(), 1);
        }

        #[test]
        fn test_apply_policy() {
            let mut soft = SoftAssertions::new();
            let fast = soft.apply::<()>(
                FailurePolicy::FailFast,
                "login",
                Err(ProbeError::interaction("x", "boom")),
            );
            assert!(fast.unwrap_err().is_interaction_failure());
            assert!(soft.is_empty());

            let lenient = soft
                .apply::<()>(
                    FailurePolicy::Soft,
                    "find option",
                    Err(ProbeError::interaction("x", "boom")),
                )
                .unwrap();
            assert!(lenient.is_none());
            assert!(soft.failures()[0].starts_with("find option: "));
        }

        #[test]
        fn test_reset() {
            let mut soft = SoftAssertions::new();
            soft.fail("x");
            soft.reset();
            assert!(soft.is_empty());
        }
    }
}
