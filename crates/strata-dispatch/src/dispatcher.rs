//! Fan-out dispatcher
//!
//! Runs an [`Operation`] over a group (sub)tree:
//!
//! 1. Spawn one task per child group, each dispatching recursively
//! 2. Merge child aggregates as the tasks complete (completion order)
//! 3. Run the node's own local step and merge its result last
//!
//! Every internal node owns a task set sized to its own child count; there
//! is no global bound. A node's task waits only for its direct children.
//! The tree is shared read-only; each aggregate is written by the single
//! task that owns it.

use crate::aggregate::{AggregateResult, ResultAggregator};
use crate::config::{DispatchConfig, FailurePolicy};
use crate::error::{DispatchError, OperationError};
use crate::operation::{Operation, ResultMap};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use strata_group::{GroupNode, GroupTree};
use tokio::task::{JoinError, JoinSet};

/// Concurrent command dispatcher
///
/// # Failure semantics
///
/// Dispatch is **not transactional**. Under the default
/// [`FailurePolicy::FailFast`], the first failure observed is returned while
/// sibling subtrees keep running to completion in the background; anything
/// they create or delete stays created or deleted. A failed dispatch does
/// not imply that no subtree made forward progress.
#[derive(Debug, Clone, Default)]
pub struct FanoutDispatcher {
    config: Arc<DispatchConfig>,
}

impl FanoutDispatcher {
    /// Create dispatcher with `config`
    #[inline]
    #[must_use]
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Dispatch `operation` over the whole tree
    ///
    /// # Errors
    /// See [`dispatch`](Self::dispatch).
    pub async fn dispatch_tree<O: Operation>(
        &self,
        tree: &GroupTree,
        operation: O,
    ) -> Result<AggregateResult<O::Output>, DispatchError> {
        self.dispatch(tree.root(), operation).await
    }

    /// Dispatch `operation` over `node` and all of its descendants
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Returns
    /// The union of every group's local result
    ///
    /// # Errors
    /// - [`DispatchError::Operation`] when a local step fails
    /// - [`DispatchError::AggregationConflict`] on a key collision
    ///   under [`ConflictPolicy::Reject`](crate::ConflictPolicy::Reject)
    /// - [`DispatchError::TaskPanicked`] / [`DispatchError::Cancelled`]
    /// - [`DispatchError::Multiple`] under [`FailurePolicy::CollectAll`]
    pub async fn dispatch<O: Operation>(
        &self,
        node: &Arc<GroupNode>,
        operation: O,
    ) -> Result<AggregateResult<O::Output>, DispatchError> {
        let name = operation.name();
        let started = Instant::now();
        tracing::info!("Dispatching `{}` on group `{}`", name, node.path());

        let result = guarded(node, &Arc::new(operation), &self.config).await;

        match &result {
            Ok(aggregate) => tracing::info!(
                "`{}` on `{}` completed: {} stacks in {}ms",
                name,
                node.path(),
                aggregate.len(),
                started.elapsed().as_millis()
            ),
            Err(e) => tracing::error!("`{}` on `{}` failed: {}", name, node.path(), e),
        }
        result
    }
}

type NodeFuture<T> = BoxFuture<'static, Result<AggregateResult<T>, DispatchError>>;

fn dispatch_node<O: Operation>(
    node: Arc<GroupNode>,
    operation: Arc<O>,
    config: Arc<DispatchConfig>,
) -> NodeFuture<O::Output> {
    async move {
        let aggregator = ResultAggregator::new(config.conflict_policy);
        let mut aggregate = AggregateResult::new();

        if !node.is_leaf() {
            let mut tasks = JoinSet::new();
            for child in node.children() {
                tasks.spawn(guarded(child, &operation, &config));
            }
            tracing::debug!(
                "`{}` fanned out from `{}` to {} groups",
                operation.name(),
                node.path(),
                tasks.len()
            );

            let mut failures = Vec::new();
            while let Some(joined) = tasks.join_next().await {
                let outcome = joined
                    .unwrap_or_else(|e| Err(join_failure(&e, &node)))
                    .and_then(|child| aggregator.absorb(&mut aggregate, child, node.path()));

                let Err(err) = outcome else { continue };
                match config.failure_policy {
                    FailurePolicy::FailFast => {
                        if !tasks.is_empty() {
                            tracing::warn!(
                                "`{}` under `{}` failed; {} sibling tasks left running",
                                operation.name(),
                                node.path(),
                                tasks.len()
                            );
                        }
                        tasks.detach_all();
                        return Err(err);
                    }
                    FailurePolicy::CancelSiblings => {
                        if !tasks.is_empty() {
                            tracing::warn!(
                                "`{}` under `{}` failed; aborting {} sibling tasks",
                                operation.name(),
                                node.path(),
                                tasks.len()
                            );
                        }
                        tasks.abort_all();
                        return Err(err);
                    }
                    FailurePolicy::CollectAll => failures.push(err),
                }
            }

            if !failures.is_empty() {
                return Err(DispatchError::collect(failures));
            }
        }

        let local = run_local(operation.as_ref(), &node, config.local_timeout())
            .await
            .map_err(|source| DispatchError::Operation {
                operation: operation.name(),
                group: node.path().clone(),
                source,
            })?;
        aggregator.merge(&mut aggregate, local, node.path())?;

        Ok(aggregate)
    }
    .boxed()
}

/// Child dispatch with its panics reported as [`DispatchError::TaskPanicked`]
fn guarded<O: Operation>(
    child: &Arc<GroupNode>,
    operation: &Arc<O>,
    config: &Arc<DispatchConfig>,
) -> NodeFuture<O::Output> {
    let group = child.path().clone();
    AssertUnwindSafe(dispatch_node(
        Arc::clone(child),
        Arc::clone(operation),
        Arc::clone(config),
    ))
    .catch_unwind()
    .map(move |result| result.unwrap_or_else(|_| Err(DispatchError::TaskPanicked { group })))
    .boxed()
}

fn join_failure(error: &JoinError, node: &GroupNode) -> DispatchError {
    if error.is_cancelled() {
        DispatchError::Cancelled {
            group: node.path().clone(),
        }
    } else {
        DispatchError::TaskPanicked {
            group: node.path().clone(),
        }
    }
}

async fn run_local<O: Operation>(
    operation: &O,
    node: &GroupNode,
    timeout: Option<Duration>,
) -> Result<ResultMap<O::Output>, OperationError> {
    match timeout {
        None => operation.run_local(node).await,
        Some(limit) => tokio::time::timeout(limit, operation.run_local(node))
            .await
            .map_err(|_| OperationError::Timeout {
                millis: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            })?,
    }
}
