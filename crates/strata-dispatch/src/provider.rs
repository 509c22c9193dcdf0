//! Stack providers
//!
//! A [`StackProvider`] is the external system that provisions a single
//! stack. Providers know nothing about groups; fan-out over a tree is the
//! dispatcher's job.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use strata_group::StackId;

/// Lifecycle status of a stack as reported by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StackStatus {
    /// Not yet created
    Pending,
    /// Creation requested
    CreateInProgress,
    /// Created and stable
    CreateComplete,
    /// Deletion requested
    DeleteInProgress,
    /// Gone
    DeleteComplete,
    /// Provider reported a failure
    Failed,
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::CreateInProgress => "CREATE_IN_PROGRESS",
            Self::CreateComplete => "CREATE_COMPLETE",
            Self::DeleteInProgress => "DELETE_IN_PROGRESS",
            Self::DeleteComplete => "DELETE_COMPLETE",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Single-stack provisioning backend
#[async_trait::async_trait]
pub trait StackProvider: Send + Sync + 'static {
    /// Create or update `stack`
    async fn launch(&self, stack: &StackId) -> anyhow::Result<StackStatus>;

    /// Delete `stack`
    async fn delete(&self, stack: &StackId) -> anyhow::Result<StackStatus>;

    /// Current status of `stack`
    async fn describe(&self, stack: &StackId) -> anyhow::Result<StackStatus>;

    /// Stacks `stack` depends on
    async fn dependencies(&self, stack: &StackId) -> anyhow::Result<Vec<StackId>>;
}

/// Provider call, as recorded by [`DryRunProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    /// [`StackProvider::launch`]
    Launch(StackId),
    /// [`StackProvider::delete`]
    Delete(StackId),
    /// [`StackProvider::describe`]
    Describe(StackId),
    /// [`StackProvider::dependencies`]
    Dependencies(StackId),
}

impl ProviderCall {
    /// Stack the call was made for
    #[must_use]
    pub fn stack(&self) -> &StackId {
        match self {
            Self::Launch(s) | Self::Delete(s) | Self::Describe(s) | Self::Dependencies(s) => s,
        }
    }
}

/// Provider that touches nothing
///
/// Every call is recorded. Launch answers `CREATE_COMPLETE`, delete
/// `DELETE_COMPLETE`, describe `PENDING`; dependencies come from the
/// configured map. Stacks registered with [`fail_on`](Self::fail_on) fail
/// every call.
#[derive(Debug, Default)]
pub struct DryRunProvider {
    dependencies: HashMap<StackId, Vec<StackId>>,
    failing: HashSet<StackId>,
    calls: Mutex<Vec<ProviderCall>>,
}

impl DryRunProvider {
    /// Create empty provider
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `stack` depends on `on`
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, stack: impl Into<StackId>, on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StackId>,
    {
        self.dependencies
            .entry(stack.into())
            .or_default()
            .extend(on.into_iter().map(Into::into));
        self
    }

    /// Make every call for `stack` fail
    #[must_use]
    pub fn fail_on(mut self, stack: impl Into<StackId>) -> Self {
        self.failing.insert(stack.into());
        self
    }

    /// Calls made so far, in arrival order
    #[must_use]
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().clone()
    }

    /// Number of calls made so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn record(&self, call: ProviderCall) -> anyhow::Result<()> {
        let stack = call.stack().clone();
        self.calls.lock().push(call);
        if self.failing.contains(&stack) {
            anyhow::bail!("dry-run failure injected for `{stack}`");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl StackProvider for DryRunProvider {
    async fn launch(&self, stack: &StackId) -> anyhow::Result<StackStatus> {
        self.record(ProviderCall::Launch(stack.clone()))?;
        tracing::debug!("[dry-run] launch `{}`", stack);
        Ok(StackStatus::CreateComplete)
    }

    async fn delete(&self, stack: &StackId) -> anyhow::Result<StackStatus> {
        self.record(ProviderCall::Delete(stack.clone()))?;
        tracing::debug!("[dry-run] delete `{}`", stack);
        Ok(StackStatus::DeleteComplete)
    }

    async fn describe(&self, stack: &StackId) -> anyhow::Result<StackStatus> {
        self.record(ProviderCall::Describe(stack.clone()))?;
        Ok(StackStatus::Pending)
    }

    async fn dependencies(&self, stack: &StackId) -> anyhow::Result<Vec<StackId>> {
        self.record(ProviderCall::Dependencies(stack.clone()))?;
        Ok(self.dependencies.get(stack).cloned().unwrap_or_default())
    }
}
