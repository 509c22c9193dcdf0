//! Stack commands
//!
//! Each command is a typed [`Operation`]: its local step calls the provider
//! for every stack the group owns, in declaration order. [`StackCommands`]
//! exposes one method per command, so an unsupported command is a compile
//! error rather than a failed lookup by name.

use crate::aggregate::AggregateResult;
use crate::dispatcher::FanoutDispatcher;
use crate::error::{DispatchError, OperationError};
use crate::operation::{Operation, ResultMap};
use crate::provider::{StackProvider, StackStatus};
use std::sync::Arc;
use strata_group::{GroupNode, GroupPath, GroupTree, StackId};

/// Provider call applied to every stack of a group
macro_rules! provider_operation {
    ($(#[$doc:meta])* $name:ident, $label:literal, $method:ident -> $output:ty) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name<P> {
            provider: Arc<P>,
        }

        impl<P> $name<P> {
            /// Create operation backed by `provider`
            #[must_use]
            pub fn new(provider: Arc<P>) -> Self {
                Self { provider }
            }
        }

        #[async_trait::async_trait]
        impl<P: StackProvider> Operation for $name<P> {
            type Output = $output;

            fn name(&self) -> &'static str {
                $label
            }

            async fn run_local(&self, node: &GroupNode) -> Result<ResultMap<$output>, OperationError> {
                let mut results = ResultMap::with_capacity(node.stacks().len());
                for stack in node.stacks() {
                    let output = self
                        .provider
                        .$method(stack)
                        .await
                        .map_err(|source| OperationError::Stack {
                            stack: stack.clone(),
                            source,
                        })?;
                    results.insert(stack.clone(), output);
                }
                Ok(results)
            }
        }
    };
}

provider_operation!(
    /// Create or update every stack
    Launch, "launch", launch -> StackStatus
);
provider_operation!(
    /// Delete every stack
    Delete, "delete", delete -> StackStatus
);
provider_operation!(
    /// Report every stack's status
    Describe, "describe", describe -> StackStatus
);
provider_operation!(
    /// Collect every stack's dependencies
    Dependencies, "dependencies", dependencies -> Vec<StackId>
);

/// Commands available on a group (sub)tree
#[async_trait::async_trait]
pub trait StackCommands {
    /// Launch all stacks
    async fn launch(&self) -> Result<AggregateResult<StackStatus>, DispatchError>;

    /// Delete all stacks
    async fn delete(&self) -> Result<AggregateResult<StackStatus>, DispatchError>;

    /// Describe all stacks
    async fn describe(&self) -> Result<AggregateResult<StackStatus>, DispatchError>;

    /// Dependencies of all stacks
    async fn dependencies(&self) -> Result<AggregateResult<Vec<StackId>>, DispatchError>;
}

/// A group (sub)tree bound to a provider and a dispatcher
#[derive(Debug)]
pub struct StackGroup<P> {
    target: Arc<GroupNode>,
    provider: Arc<P>,
    dispatcher: FanoutDispatcher,
}

impl<P> Clone for StackGroup<P> {
    fn clone(&self) -> Self {
        Self {
            target: Arc::clone(&self.target),
            provider: Arc::clone(&self.provider),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<P: StackProvider> StackGroup<P> {
    /// Bind the whole `tree`
    #[must_use]
    pub fn new(tree: &GroupTree, provider: Arc<P>, dispatcher: FanoutDispatcher) -> Self {
        Self {
            target: Arc::clone(tree.root()),
            provider,
            dispatcher,
        }
    }

    /// Bind only the subtree rooted at `path`
    ///
    /// Returns `None` if `path` is not a group of `tree`.
    #[must_use]
    pub fn scoped(
        tree: &GroupTree,
        path: &GroupPath,
        provider: Arc<P>,
        dispatcher: FanoutDispatcher,
    ) -> Option<Self> {
        tree.subtree(path).map(|target| Self {
            target: Arc::clone(target),
            provider,
            dispatcher,
        })
    }

    /// Root of the bound subtree
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Arc<GroupNode> {
        &self.target
    }

    /// Bound provider
    #[inline]
    #[must_use]
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }
}

#[async_trait::async_trait]
impl<P: StackProvider> StackCommands for StackGroup<P> {
    async fn launch(&self) -> Result<AggregateResult<StackStatus>, DispatchError> {
        let op = Launch::new(Arc::clone(&self.provider));
        self.dispatcher.dispatch(&self.target, op).await
    }

    async fn delete(&self) -> Result<AggregateResult<StackStatus>, DispatchError> {
        let op = Delete::new(Arc::clone(&self.provider));
        self.dispatcher.dispatch(&self.target, op).await
    }

    async fn describe(&self) -> Result<AggregateResult<StackStatus>, DispatchError> {
        let op = Describe::new(Arc::clone(&self.provider));
        self.dispatcher.dispatch(&self.target, op).await
    }

    async fn dependencies(&self) -> Result<AggregateResult<Vec<StackId>>, DispatchError> {
        let op = Dependencies::new(Arc::clone(&self.provider));
        self.dispatcher.dispatch(&self.target, op).await
    }
}
