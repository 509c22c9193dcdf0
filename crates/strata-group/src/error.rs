//! Error types for group trees

use crate::node::StackId;
use crate::path::{GroupPath, PathError};

/// Group tree construction and validation errors
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Invalid group name or path
    #[error("invalid group path: {0}")]
    Path(#[from] PathError),

    /// Two groups resolve to the same path
    #[error("duplicate group: {0}")]
    DuplicateGroup(GroupPath),

    /// A stack is owned by more than one group
    #[error("stack `{stack}` declared by both `{first}` and `{second}`")]
    DuplicateStack {
        /// The repeated stack
        stack: StackId,
        /// Group that declared it first
        first: GroupPath,
        /// Group that declared it again
        second: GroupPath,
    },

    /// Group tree document could not be parsed
    #[error("failed to parse group tree: {0}")]
    Parse(#[from] serde_yaml::Error),
}
