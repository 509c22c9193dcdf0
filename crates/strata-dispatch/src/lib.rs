//! Strata Dispatch
//!
//! Concurrent fan-out of commands over a group tree, with per-stack result
//! aggregation.
//!
//! # Core Concepts
//!
//! - [`Operation`]: Node-local step of a command
//! - [`FanoutDispatcher`]: Runs an operation on every group, one task per child
//! - [`ResultAggregator`]: Merges partial results into an [`AggregateResult`]
//! - [`StackCommands`]: Typed launch/delete/describe/dependencies commands
//! - [`DependencyGraph`]: Launch and delete order from stack dependencies
//!
//! Dispatch is not transactional: see [`FanoutDispatcher`] for the failure
//! semantics.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use strata_dispatch::{DryRunProvider, FanoutDispatcher, StackCommands, StackGroup, StackStatus};
//! use strata_group::{GroupNode, GroupTree};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tree = GroupTree::new(GroupNode::branch(
//!     "root",
//!     [GroupNode::leaf("g1", ["s1", "s2"])?, GroupNode::leaf("g2", ["s3"])?],
//! )?)?;
//!
//! let group = StackGroup::new(&tree, Arc::new(DryRunProvider::new()), FanoutDispatcher::default());
//! let launched = group.launch().await?;
//! assert_eq!(launched.get("s3"), Some(&StackStatus::CreateComplete));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod aggregate;
mod commands;
mod config;
mod dispatcher;
mod error;
mod graph;
mod operation;
mod provider;

// Re-exports
pub use aggregate::{AggregateResult, ResultAggregator};
pub use commands::{Delete, Dependencies, Describe, Launch, StackCommands, StackGroup};
pub use config::{ConflictPolicy, DispatchConfig, FailurePolicy};
pub use dispatcher::FanoutDispatcher;
pub use error::{DispatchError, OperationError};
pub use graph::{DependencyGraph, GraphError};
pub use operation::{Operation, ResultMap};
pub use provider::{DryRunProvider, ProviderCall, StackProvider, StackStatus};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
