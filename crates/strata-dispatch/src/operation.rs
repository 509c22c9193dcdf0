//! Operation trait
//!
//! An [`Operation`] is the node-local logic of a command. The dispatcher
//! runs it on every group of a (sub)tree; implementations never traverse
//! or spawn anything themselves.

use crate::error::OperationError;
use std::collections::HashMap;
use strata_group::{GroupNode, StackId};

/// Per-stack results produced by one local step
pub type ResultMap<T> = HashMap<StackId, T>;

/// Node-local step of a command
///
/// Arguments are carried by the implementing value. The same value is
/// shared by every concurrently running task, so implementations must not
/// rely on unsynchronized mutable state.
#[async_trait::async_trait]
pub trait Operation: Send + Sync + 'static {
    /// Per-stack result type
    type Output: Send + 'static;

    /// Operation name, used in logs and errors
    fn name(&self) -> &'static str;

    /// Run the operation for `node` itself (not its sub-groups)
    ///
    /// Called for every group, leaf or internal. An empty map contributes
    /// nothing to the aggregate.
    ///
    /// # Errors
    /// Any [`OperationError`]; it aborts the dispatch according to the
    /// configured failure policy.
    async fn run_local(&self, node: &GroupNode) -> Result<ResultMap<Self::Output>, OperationError>;
}
