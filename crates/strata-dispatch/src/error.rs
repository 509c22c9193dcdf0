//! Error types for dispatch
//!
//! Provides error handling for:
//! - Failures raised by operation implementations
//! - Aggregation conflicts (broken name uniqueness)
//! - Panicked or cancelled fan-out tasks
//! - Several failures reported together

use strata_group::{GroupPath, StackId};

/// Error raised by an operation's local step
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    /// The provider failed for one stack
    #[error("stack `{stack}`: {source}")]
    Stack {
        /// Stack being operated on
        stack: StackId,
        /// Provider error
        source: anyhow::Error,
    },

    /// The local step exceeded its time bound
    #[error("local step timed out after {millis}ms")]
    Timeout {
        /// Configured bound in milliseconds
        millis: u64,
    },

    /// Operation-specific failure
    #[error("{0}")]
    Failed(String),
}

impl OperationError {
    /// Create operation-specific failure
    #[inline]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Error returned by a dispatch call
///
/// An `Err` does not mean nothing happened: sibling subtrees may have made
/// forward progress (created or deleted stacks) before or after the failure
/// was observed. No partial aggregate is returned, and none should be
/// treated as authoritative.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// An operation failed on a group
    #[error("`{operation}` failed on group `{group}`: {source}")]
    Operation {
        /// Operation name
        operation: &'static str,
        /// Group whose local step failed
        group: GroupPath,
        /// Underlying failure
        source: OperationError,
    },

    /// Two partial results carried the same key
    #[error("aggregation conflict on `{key}` while merging into group `{group}`")]
    AggregationConflict {
        /// Colliding key
        key: StackId,
        /// Group whose aggregate received the collision
        group: GroupPath,
    },

    /// A fan-out task panicked
    #[error("dispatch task for group `{group}` panicked")]
    TaskPanicked {
        /// Group the task was dispatching
        group: GroupPath,
    },

    /// A fan-out task was cancelled before completing
    #[error("dispatch task under group `{group}` was cancelled")]
    Cancelled {
        /// Group that owned the task
        group: GroupPath,
    },

    /// Several failures from the same dispatch
    #[error("{} failures during dispatch: {}", .0.len(), summarize(.0))]
    Multiple(Vec<DispatchError>),
}

impl DispatchError {
    /// Fold collected errors into one, flattening nested [`Multiple`](Self::Multiple)
    ///
    /// A single error is returned as-is.
    #[must_use]
    pub fn collect(errors: Vec<DispatchError>) -> Self {
        let mut flat: Vec<DispatchError> = errors
            .into_iter()
            .flat_map(|err| match err {
                Self::Multiple(inner) => inner,
                other => vec![other],
            })
            .collect();
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Self::Multiple(flat)
        }
    }

    /// Individual failures (one element unless [`Multiple`](Self::Multiple))
    #[must_use]
    pub fn errors(&self) -> Vec<&DispatchError> {
        match self {
            Self::Multiple(inner) => inner.iter().collect(),
            other => vec![other],
        }
    }

    /// Check if error signals a broken uniqueness invariant
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::AggregationConflict { .. } => true,
            Self::Multiple(inner) => inner.iter().any(Self::is_conflict),
            _ => false,
        }
    }

    /// Group the error originated from, if it has one
    #[must_use]
    pub fn group(&self) -> Option<&GroupPath> {
        match self {
            Self::Operation { group, .. }
            | Self::AggregationConflict { group, .. }
            | Self::TaskPanicked { group }
            | Self::Cancelled { group } => Some(group),
            Self::Multiple(_) => None,
        }
    }
}

fn summarize(errors: &[DispatchError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op_error(group: &str) -> DispatchError {
        DispatchError::Operation {
            operation: "launch",
            group: group.parse().unwrap(),
            source: OperationError::failed("boom"),
        }
    }

    #[test]
    fn collect_single_is_unwrapped() {
        let err = DispatchError::collect(vec![op_error("a")]);
        assert!(matches!(err, DispatchError::Operation { .. }));
    }

    #[test]
    fn collect_flattens_nested() {
        let nested = DispatchError::Multiple(vec![op_error("a/b"), op_error("a/c")]);
        let err = DispatchError::collect(vec![nested, op_error("d")]);
        assert_eq!(err.errors().len(), 3);
    }

    #[test]
    fn display_mentions_group_and_operation() {
        let msg = op_error("dev/ew1").to_string();
        assert_eq!(msg, "`launch` failed on group `dev/ew1`: boom");
    }

    #[test]
    fn multiple_display_lists_all() {
        let err = DispatchError::Multiple(vec![op_error("a"), op_error("b")]);
        let msg = err.to_string();
        assert!(msg.starts_with("2 failures during dispatch"));
        assert!(msg.contains("`a`") && msg.contains("`b`"));
    }

    #[test]
    fn conflict_detection_looks_inside_multiple() {
        let conflict = DispatchError::AggregationConflict {
            key: StackId::from("s1"),
            group: "root".parse().unwrap(),
        };
        assert!(conflict.is_conflict());
        assert!(DispatchError::Multiple(vec![op_error("a"), conflict]).is_conflict());
        assert!(!op_error("a").is_conflict());
    }
}
