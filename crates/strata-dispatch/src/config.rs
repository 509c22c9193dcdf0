//! Dispatch configuration
//!
//! ```toml
//! failure_policy = "collect_all"
//! conflict_policy = "reject"
//! local_timeout_ms = 30000
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a node does when one of its child tasks fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Surface the first failure observed (in completion order) at once.
    /// Remaining sibling tasks keep running detached; their results are
    /// discarded and their side effects are not rolled back.
    #[default]
    FailFast,

    /// Surface the first failure and abort in-flight siblings. Aborting a
    /// task drops its own fan-out set, so cancellation reaches the whole
    /// sibling subtree.
    CancelSiblings,

    /// Let every child finish and report all failures together.
    /// The node's local step is skipped if any child failed.
    CollectAll,
}

/// What the aggregator does when two partial results share a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Fail with an aggregation conflict
    #[default]
    Reject,

    /// Keep the value merged last and record the overwritten key
    LastWriteWins,
}

/// Dispatch configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Child failure handling
    pub failure_policy: FailurePolicy,
    /// Key collision handling
    pub conflict_policy: ConflictPolicy,
    /// Upper bound for each node's local step, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_timeout_ms: Option<u64>,
}

impl DispatchConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document
    ///
    /// # Errors
    /// Returns the TOML error for malformed input or unknown keys.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// With failure policy
    #[inline]
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// With conflict policy
    #[inline]
    #[must_use]
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// With local step timeout
    #[inline]
    #[must_use]
    pub fn with_local_timeout(mut self, timeout: Duration) -> Self {
        self.local_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Local step timeout, if any
    #[inline]
    #[must_use]
    pub fn local_timeout(&self) -> Option<Duration> {
        self.local_timeout_ms.map(Duration::from_millis)
    }
}
