//! Stack dependency graph
//!
//! Built from the aggregate of a `dependencies` dispatch. Edges point from
//! a dependency to its dependent, so a topological order is a valid launch
//! order and its reverse a valid delete order.

use crate::aggregate::AggregateResult;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::HashMap;
use strata_group::StackId;

/// Dependency graph errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A stack lists itself as a dependency
    #[error("stack `{0}` depends on itself")]
    SelfLoop(StackId),

    /// Dependencies form a cycle through `stack`
    #[error("dependency cycle through stack `{stack}`")]
    CycleDetected {
        /// A stack on the cycle
        stack: StackId,
    },

    /// A dependency names a stack outside the aggregate
    #[error("stack `{stack}` depends on unknown stack `{dependency}`")]
    UnknownStack {
        /// Dependent stack
        stack: StackId,
        /// Missing dependency
        dependency: StackId,
    },
}

/// Acyclic dependency graph over stacks
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    stacks: Vec<StackId>,
    index: HashMap<StackId, usize>,
    inner: DiGraphMap<usize, ()>,
}

impl DependencyGraph {
    /// Build graph from per-stack dependency lists
    ///
    /// # Errors
    /// - [`GraphError::SelfLoop`] if a stack depends on itself
    /// - [`GraphError::UnknownStack`] if a dependency is not in `aggregate`
    /// - [`GraphError::CycleDetected`] if dependencies are cyclic
    pub fn from_aggregate(aggregate: &AggregateResult<Vec<StackId>>) -> Result<Self, GraphError> {
        // Sorted so orders are stable across runs
        let stacks: Vec<StackId> = aggregate.sorted().into_keys().cloned().collect();
        let index: HashMap<StackId, usize> = stacks
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();

        let mut inner = DiGraphMap::with_capacity(stacks.len(), 0);
        for i in 0..stacks.len() {
            inner.add_node(i);
        }

        for (stack, dependencies) in aggregate.sorted() {
            let to = index[stack];
            for dependency in dependencies {
                if dependency == stack {
                    return Err(GraphError::SelfLoop(stack.clone()));
                }
                let from = *index.get(dependency).ok_or_else(|| GraphError::UnknownStack {
                    stack: stack.clone(),
                    dependency: dependency.clone(),
                })?;
                inner.add_edge(from, to, ());
            }
        }

        if let Err(cycle) = toposort(&inner, None) {
            return Err(GraphError::CycleDetected {
                stack: stacks[cycle.node_id()].clone(),
            });
        }

        Ok(Self { stacks, index, inner })
    }

    /// Number of stacks
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    /// Check if graph has no stacks
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Number of dependency edges
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Stacks in an order where every dependency precedes its dependents
    #[must_use]
    pub fn launch_order(&self) -> Vec<&StackId> {
        // Acyclicity was checked on construction
        toposort(&self.inner, None)
            .unwrap_or_default()
            .into_iter()
            .map(|i| &self.stacks[i])
            .collect()
    }

    /// Stacks in an order where every dependent precedes its dependencies
    #[must_use]
    pub fn delete_order(&self) -> Vec<&StackId> {
        let mut order = self.launch_order();
        order.reverse();
        order
    }

    /// Direct dependencies of `stack`
    #[must_use]
    pub fn dependencies_of(&self, stack: &str) -> Vec<&StackId> {
        self.neighbors(stack, Direction::Incoming)
    }

    /// Stacks that directly depend on `stack`
    #[must_use]
    pub fn dependents_of(&self, stack: &str) -> Vec<&StackId> {
        self.neighbors(stack, Direction::Outgoing)
    }

    /// Stacks with no dependencies
    #[must_use]
    pub fn roots(&self) -> Vec<&StackId> {
        self.inner
            .nodes()
            .filter(|n| {
                self.inner
                    .neighbors_directed(*n, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|i| &self.stacks[i])
            .collect()
    }

    fn neighbors(&self, stack: &str, direction: Direction) -> Vec<&StackId> {
        let Some(&i) = self.index.get(stack) else {
            return Vec::new();
        };
        let mut found: Vec<&StackId> = self
            .inner
            .neighbors_directed(i, direction)
            .map(|n| &self.stacks[n])
            .collect();
        found.sort();
        found
    }
}
