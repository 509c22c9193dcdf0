//! Error types for structure walking

/// Error produced by a visitor callback
pub type VisitError = Box<dyn std::error::Error + Send + Sync>;

/// Walk errors
#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    /// A non-empty container sits deeper than the depth bound
    ///
    /// The bound is the only trigger. Owned values cannot be cyclic, so for
    /// them this reports deep nesting; custom [`Walkable`](crate::Walkable)
    /// implementations that alias containers hit it instead of looping.
    #[error("structure nested deeper than the {limit}-level bound at `{path}`")]
    StructuralCycle {
        /// Configured depth bound
        limit: usize,
        /// Container path where the bound was hit
        path: String,
    },

    /// The visitor failed
    #[error("visit failed at `{path}`: {source}")]
    Visit {
        /// Path of the value being visited
        path: String,
        /// Visitor error
        source: VisitError,
    },
}

/// Deferred value resolution errors
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No value is known for the reference
    #[error("unresolved reference !{tag} {argument}")]
    Unresolved {
        /// Tag name without `!`
        tag: String,
        /// Reference argument
        argument: String,
    },

    /// The tagged argument has an unsupported shape
    #[error("!{tag} expects a string argument")]
    InvalidArgument {
        /// Tag name without `!`
        tag: String,
    },
}
