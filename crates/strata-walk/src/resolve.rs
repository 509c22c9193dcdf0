//! Deferred value resolution
//!
//! Configuration documents embed deferred values as YAML tags, e.g.
//! `vpc_id: !stack_output vpc::VpcId`. Resolution walks the document and
//! replaces every handled tag with a concrete value.

use crate::error::{ResolveError, WalkError};
use crate::walker::{Slot, StructureWalker};
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::Value;
use std::collections::HashMap;

/// Resolves tagged placeholders into values
pub trait DeferredResolver {
    /// True if this resolver owns values tagged with `tag`
    fn handles(&self, tag: &Tag) -> bool;

    /// Compute the value replacing `tagged`
    ///
    /// # Errors
    /// Returns [`ResolveError`] if the reference cannot be resolved.
    fn resolve(&self, tagged: &TaggedValue) -> Result<Value, ResolveError>;
}

/// Tag name without the leading `!`
#[must_use]
pub fn tag_name(tag: &Tag) -> String {
    tag.to_string().trim_start_matches('!').to_string()
}

/// Replace every tagged value handled by `resolver`, in place
///
/// # Returns
/// Number of values replaced
///
/// # Errors
/// [`WalkError::Visit`] wrapping the first [`ResolveError`].
pub fn resolve_tagged<R>(document: &mut Value, resolver: &R) -> Result<usize, WalkError>
where
    R: DeferredResolver + ?Sized,
{
    let resolved = StructureWalker::new().walk(
        document,
        |mut slot: Slot<'_, Value>| {
            let Value::Tagged(tagged) = slot.value() else {
                return Ok(());
            };
            let value = resolver.resolve(tagged)?;
            tracing::debug!("resolved {} at {}", tagged.tag, slot.render());
            slot.replace(value);
            Ok::<_, ResolveError>(())
        },
        |value: &Value| matches!(value, Value::Tagged(tagged) if resolver.handles(&tagged.tag)),
    )?;
    tracing::debug!("resolved {resolved} deferred values");
    Ok(resolved)
}

/// Resolver backed by a fixed lookup table
///
/// Handles a single tag whose argument is a string key into the table.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    tag: String,
    values: HashMap<String, Value>,
}

impl StaticResolver {
    /// Create resolver for `tag` (with or without leading `!`)
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.trim_start_matches('!').to_string(),
            values: HashMap::new(),
        }
    }

    /// With a known value
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Add a known value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }
}

impl DeferredResolver for StaticResolver {
    fn handles(&self, tag: &Tag) -> bool {
        tag_name(tag) == self.tag
    }

    fn resolve(&self, tagged: &TaggedValue) -> Result<Value, ResolveError> {
        let argument = tagged
            .value
            .as_str()
            .ok_or_else(|| ResolveError::InvalidArgument {
                tag: self.tag.clone(),
            })?;
        self.values
            .get(argument)
            .cloned()
            .ok_or_else(|| ResolveError::Unresolved {
                tag: self.tag.clone(),
                argument: argument.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = r"
parameters:
  vpc_id: !stack_output vpc::VpcId
  subnets:
    - !stack_output vpc::SubnetA
    - literal
  untouched: !other thing
";

    fn resolver() -> StaticResolver {
        StaticResolver::new("!stack_output")
            .with_value("vpc::VpcId", "vpc-123")
            .with_value("vpc::SubnetA", "subnet-a")
    }

    #[test]
    fn replaces_handled_tags_only() {
        let mut doc: Value = serde_yaml::from_str(DOC).unwrap();
        let count = resolve_tagged(&mut doc, &resolver()).unwrap();
        assert_eq!(count, 2);

        let expected: Value = serde_yaml::from_str(
            r"
parameters:
  vpc_id: vpc-123
  subnets:
    - subnet-a
    - literal
  untouched: !other thing
",
        )
        .unwrap();
        assert_eq!(doc, expected);
    }

    #[test]
    fn unresolved_reference_fails_with_path() {
        let mut doc: Value = serde_yaml::from_str("a: !stack_output db::Port\n").unwrap();
        let err = resolve_tagged(&mut doc, &resolver()).unwrap_err();
        match err {
            WalkError::Visit { path, source } => {
                assert_eq!(path, "$.a");
                assert!(source.to_string().contains("db::Port"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_string_argument_is_invalid() {
        let mut doc: Value = serde_yaml::from_str("a: !stack_output [1, 2]\n").unwrap();
        let err = resolve_tagged(&mut doc, &resolver()).unwrap_err();
        assert!(err.to_string().contains("expects a string argument"));
    }

    #[test]
    fn tag_name_strips_bang() {
        let doc: Value = serde_yaml::from_str("!stack_output x").unwrap();
        let Value::Tagged(tagged) = doc else {
            panic!("expected tagged value");
        };
        assert_eq!(tag_name(&tagged.tag), "stack_output");
    }
}
