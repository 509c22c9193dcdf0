//! Strata Groups
//!
//! The hierarchical organization of managed resources ("stacks") into nested
//! groups.
//!
//! # Core Concepts
//!
//! - [`GroupNode`]: A group; leaves own stacks, internal groups own sub-groups
//! - [`GroupTree`]: A validated root with unique group paths and stack ids
//! - [`GroupPath`]: Hierarchical `/`-separated group address
//! - [`GroupSpec`]: YAML form of a group tree
//!
//! # Example
//!
//! ```rust
//! use strata_group::{GroupNode, GroupTree};
//!
//! let root = GroupNode::branch(
//!     "dev",
//!     [
//!         GroupNode::leaf("ew1", ["vpc", "jump-host"])?,
//!         GroupNode::leaf("uw2", ["db"])?,
//!     ],
//! )?;
//! let tree = GroupTree::new(root)?;
//! assert_eq!(tree.stack_count(), 3);
//! # Ok::<(), strata_group::TreeError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
pub mod naming;
mod node;
mod path;
mod spec;

// Re-exports
pub use error::TreeError;
pub use node::{GroupNode, GroupTree, StackId};
pub use path::{validate_segment, GroupPath, PathError, SEPARATOR};
pub use spec::GroupSpec;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
