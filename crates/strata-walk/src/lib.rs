//! Strata Walk
//!
//! Generic depth-first visitor over nested mapping/sequence structures.
//!
//! # Core Concepts
//!
//! - [`Walkable`]: A nested structure (`serde_json::Value`, `serde_yaml::Value`)
//! - [`StructureWalker`]: Finds values matching a predicate and visits them
//! - [`Slot`]: Container path, key/index and `&mut` access for in-place replacement
//! - [`resolve_tagged`]: Replaces tagged deferred values in YAML documents
//!
//! # Example
//!
//! ```rust
//! use serde_json::{json, Value};
//! use strata_walk::{walk, Slot};
//!
//! let mut config = json!({"a": [1, {"b": "X"}], "c": "X"});
//! let visited = walk(
//!     &mut config,
//!     |mut slot: Slot<'_, Value>| {
//!         slot.replace(json!("Y"));
//!         Ok::<_, std::convert::Infallible>(())
//!     },
//!     |v: &Value| v == "X",
//! )?;
//!
//! assert_eq!(visited, 2);
//! assert_eq!(config, json!({"a": [1, {"b": "Y"}], "c": "Y"}));
//! # Ok::<(), strata_walk::WalkError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod resolve;
mod value;
mod walker;

// Re-exports
pub use error::{ResolveError, VisitError, WalkError};
pub use resolve::{resolve_tagged, tag_name, DeferredResolver, StaticResolver};
pub use value::{render_path, Entries, Location, Walkable};
pub use walker::{walk, Slot, StructureWalker, WalkOptions, DEFAULT_MAX_DEPTH};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
