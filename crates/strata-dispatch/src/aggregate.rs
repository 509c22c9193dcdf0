//! Result aggregation
//!
//! [`ResultAggregator`] folds partial per-stack results into an
//! [`AggregateResult`]. Keys are stack ids, which are unique in a validated
//! tree; a collision therefore means the tree invariant is broken.

use crate::config::ConflictPolicy;
use crate::error::DispatchError;
use crate::operation::ResultMap;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use strata_group::{GroupPath, StackId};

/// Merged per-stack results of one dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult<T> {
    entries: HashMap<StackId, T>,
    overwritten: Vec<StackId>,
}

impl<T> AggregateResult<T> {
    /// Create empty aggregate
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            overwritten: Vec::new(),
        }
    }

    /// Number of stacks
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no stack contributed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Result for `stack`
    #[inline]
    #[must_use]
    pub fn get(&self, stack: &str) -> Option<&T> {
        self.entries.get(stack)
    }

    /// Check if `stack` has a result
    #[inline]
    #[must_use]
    pub fn contains(&self, stack: &str) -> bool {
        self.entries.contains_key(stack)
    }

    /// Iterate entries (arbitrary order)
    pub fn iter(&self) -> impl Iterator<Item = (&StackId, &T)> {
        self.entries.iter()
    }

    /// Entries ordered by stack id
    #[must_use]
    pub fn sorted(&self) -> BTreeMap<&StackId, &T> {
        self.entries.iter().collect()
    }

    /// Keys whose earlier value was overwritten (last-write-wins mode only)
    #[inline]
    #[must_use]
    pub fn overwritten(&self) -> &[StackId] {
        &self.overwritten
    }
}

impl<T> Default for AggregateResult<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IntoIterator for AggregateResult<T> {
    type Item = (StackId, T);
    type IntoIter = std::collections::hash_map::IntoIter<StackId, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Merge policy used by the dispatcher
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultAggregator {
    policy: ConflictPolicy,
}

impl ResultAggregator {
    /// Create aggregator with `policy`
    #[inline]
    #[must_use]
    pub fn new(policy: ConflictPolicy) -> Self {
        Self { policy }
    }

    /// Merge one local step's `partial` result into `aggregate`
    ///
    /// `group` is the group owning `aggregate`, reported on conflict.
    ///
    /// # Returns
    /// Number of keys merged
    ///
    /// # Errors
    /// [`DispatchError::AggregationConflict`] on the first colliding key
    /// under [`ConflictPolicy::Reject`].
    pub fn merge<T>(
        &self,
        aggregate: &mut AggregateResult<T>,
        partial: ResultMap<T>,
        group: &GroupPath,
    ) -> Result<usize, DispatchError> {
        let merged = partial.len();
        for (key, value) in partial {
            self.insert(aggregate, key, value, group)?;
        }
        Ok(merged)
    }

    /// Merge a child's whole aggregate into `aggregate`
    ///
    /// Overwrite records of the child are carried over.
    ///
    /// # Errors
    /// Same as [`merge`](Self::merge).
    pub fn absorb<T>(
        &self,
        aggregate: &mut AggregateResult<T>,
        child: AggregateResult<T>,
        group: &GroupPath,
    ) -> Result<usize, DispatchError> {
        aggregate.overwritten.extend(child.overwritten);
        self.merge(aggregate, child.entries, group)
    }

    fn insert<T>(
        &self,
        aggregate: &mut AggregateResult<T>,
        key: StackId,
        value: T,
        group: &GroupPath,
    ) -> Result<(), DispatchError> {
        match aggregate.entries.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(mut slot) => match self.policy {
                ConflictPolicy::Reject => {
                    return Err(DispatchError::AggregationConflict {
                        key: slot.key().clone(),
                        group: group.clone(),
                    });
                }
                ConflictPolicy::LastWriteWins => {
                    tracing::warn!(
                        "result for `{}` overwritten while merging into `{}`",
                        slot.key(),
                        group
                    );
                    aggregate.overwritten.push(slot.key().clone());
                    slot.insert(value);
                }
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(entries: &[(&str, u32)]) -> ResultMap<u32> {
        entries
            .iter()
            .map(|(k, v)| (StackId::from(*k), *v))
            .collect()
    }

    fn root() -> GroupPath {
        GroupPath::single("root")
    }

    #[test]
    fn merges_disjoint_partials() {
        let aggregator = ResultAggregator::default();
        let mut aggregate = AggregateResult::new();

        aggregator.merge(&mut aggregate, partial(&[("a", 1), ("b", 2)]), &root()).unwrap();
        aggregator.merge(&mut aggregate, partial(&[("c", 3)]), &root()).unwrap();

        assert_eq!(aggregate.len(), 3);
        assert_eq!(aggregate.get("c"), Some(&3));
        assert!(aggregate.overwritten().is_empty());
    }

    #[test]
    fn empty_partial_is_noop() {
        let aggregator = ResultAggregator::default();
        let mut aggregate = AggregateResult::new();
        let merged = aggregator.merge(&mut aggregate, partial(&[]), &root()).unwrap();
        assert_eq!(merged, 0);
        assert!(aggregate.is_empty());
    }

    #[test]
    fn reject_policy_reports_conflict() {
        let aggregator = ResultAggregator::new(ConflictPolicy::Reject);
        let mut aggregate = AggregateResult::new();
        aggregator.merge(&mut aggregate, partial(&[("a", 1)]), &root()).unwrap();

        let err = aggregator
            .merge(&mut aggregate, partial(&[("a", 2)]), &root())
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::AggregationConflict { ref key, ref group }
                if key.as_str() == "a" && group.to_string() == "root"
        ));
    }

    #[test]
    fn last_write_wins_records_overwrite() {
        let aggregator = ResultAggregator::new(ConflictPolicy::LastWriteWins);
        let mut aggregate = AggregateResult::new();
        aggregator.merge(&mut aggregate, partial(&[("a", 1)]), &root()).unwrap();
        aggregator.merge(&mut aggregate, partial(&[("a", 2)]), &root()).unwrap();

        assert_eq!(aggregate.get("a"), Some(&2));
        assert_eq!(aggregate.overwritten(), &[StackId::from("a")]);
    }

    #[test]
    fn absorb_carries_overwrites() {
        let aggregator = ResultAggregator::new(ConflictPolicy::LastWriteWins);
        let mut child = AggregateResult::new();
        aggregator.merge(&mut child, partial(&[("x", 1)]), &root()).unwrap();
        aggregator.merge(&mut child, partial(&[("x", 2)]), &root()).unwrap();

        let mut parent = AggregateResult::new();
        aggregator.absorb(&mut parent, child, &root()).unwrap();
        assert_eq!(parent.get("x"), Some(&2));
        assert_eq!(parent.overwritten().len(), 1);
    }

    #[test]
    fn sorted_orders_by_stack() {
        let aggregator = ResultAggregator::default();
        let mut aggregate = AggregateResult::new();
        aggregator
            .merge(&mut aggregate, partial(&[("b", 2), ("a", 1)]), &root())
            .unwrap();
        let keys: Vec<&str> = aggregate.sorted().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
