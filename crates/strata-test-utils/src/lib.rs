//! Testing utilities for the Strata workspace
//!
//! Shared tree fixtures and instrumented operations.

#![allow(missing_docs)]

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use strata_dispatch::{Operation, OperationError, ResultMap};
use strata_group::{GroupNode, GroupPath, GroupTree, StackId};

/// `root{g1[s1, s2], g2[s3]}`
pub fn sample_tree() -> GroupTree {
    GroupTree::new(
        GroupNode::branch(
            "root",
            [
                GroupNode::leaf("g1", ["s1", "s2"]).unwrap(),
                GroupNode::leaf("g2", ["s3"]).unwrap(),
            ],
        )
        .unwrap(),
    )
    .unwrap()
}

/// `root{fast[a], slow{deep[b], deeper[c]}}`
pub fn nested_tree() -> GroupTree {
    let slow = GroupNode::branch(
        "slow",
        [
            GroupNode::leaf("deep", ["b"]).unwrap(),
            GroupNode::leaf("deeper", ["c"]).unwrap(),
        ],
    )
    .unwrap();
    GroupTree::new(
        GroupNode::branch("root", [GroupNode::leaf("fast", ["a"]).unwrap(), slow]).unwrap(),
    )
    .unwrap()
}

/// Build a tree from a parent table
///
/// Group `i + 1` is a child of group `parents[i] % (i + 1)`; group 0 is the
/// root. Group `i` is named `g{i}` and owns `stacks[i]` stacks named
/// `s{i}_{j}` (missing entries mean no stacks).
pub fn tree_from_parents(parents: &[usize], stacks: &[usize]) -> GroupTree {
    let count = parents.len() + 1;
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (i, parent) in parents.iter().enumerate() {
        children[parent % (i + 1)].push(i + 1);
    }

    fn build(i: usize, children: &[Vec<usize>], stacks: &[usize]) -> GroupNode {
        let name = format!("g{i}");
        let owned: Vec<String> = (0..stacks.get(i).copied().unwrap_or(0))
            .map(|j| format!("s{i}_{j}"))
            .collect();
        if children[i].is_empty() {
            GroupNode::leaf(&name, owned).unwrap()
        } else {
            GroupNode::branch(&name, children[i].iter().map(|c| build(*c, children, stacks)))
                .unwrap()
                .with_stacks(owned)
        }
    }

    GroupTree::new(build(0, &children, stacks)).unwrap()
}

/// Shared state of a [`RecordingOperation`]
#[derive(Debug, Default)]
pub struct Recorder {
    visited: Mutex<Vec<GroupPath>>,
    completed: AtomicUsize,
}

impl Recorder {
    /// Groups whose local step started, in start order
    pub fn visited(&self) -> Vec<GroupPath> {
        self.visited.lock().clone()
    }

    /// Local steps that finished successfully
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Whether the local step of `group` started
    pub fn saw(&self, group: &str) -> bool {
        self.visited.lock().iter().any(|p| p.to_string() == group)
    }
}

/// Operation that reports each stack's group path and records every call
///
/// Groups are matched by their last path segment.
#[derive(Debug, Default)]
pub struct RecordingOperation {
    recorder: Arc<Recorder>,
    fail_on: HashSet<String>,
    panic_on: HashSet<String>,
    delays: HashMap<String, Duration>,
}

impl RecordingOperation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorder(&self) -> Arc<Recorder> {
        Arc::clone(&self.recorder)
    }

    pub fn fail_on(mut self, group: &str) -> Self {
        self.fail_on.insert(group.to_string());
        self
    }

    pub fn panic_on(mut self, group: &str) -> Self {
        self.panic_on.insert(group.to_string());
        self
    }

    pub fn delay(mut self, group: &str, delay: Duration) -> Self {
        self.delays.insert(group.to_string(), delay);
        self
    }
}

#[async_trait::async_trait]
impl Operation for RecordingOperation {
    type Output = String;

    fn name(&self) -> &'static str {
        "record"
    }

    async fn run_local(&self, node: &GroupNode) -> Result<ResultMap<String>, OperationError> {
        let last = node.path().last().unwrap_or_default().to_string();
        self.recorder.visited.lock().push(node.path().clone());

        if let Some(delay) = self.delays.get(&last) {
            tokio::time::sleep(*delay).await;
        }
        if self.panic_on.contains(&last) {
            panic!("injected panic in `{}`", node.path());
        }
        if self.fail_on.contains(&last) {
            return Err(OperationError::failed(format!("injected failure in `{}`", node.path())));
        }

        self.recorder.completed.fetch_add(1, Ordering::SeqCst);
        Ok(node
            .stacks()
            .iter()
            .map(|s| (s.clone(), node.name()))
            .collect())
    }
}

/// Operation where every non-empty group reports the same key
#[derive(Debug, Clone)]
pub struct FixedKeyOperation {
    pub key: StackId,
}

impl FixedKeyOperation {
    pub fn new(key: &str) -> Self {
        Self {
            key: StackId::from(key),
        }
    }
}

#[async_trait::async_trait]
impl Operation for FixedKeyOperation {
    type Output = String;

    fn name(&self) -> &'static str {
        "fixed-key"
    }

    async fn run_local(&self, node: &GroupNode) -> Result<ResultMap<String>, OperationError> {
        let mut result = ResultMap::new();
        if !node.stacks().is_empty() {
            result.insert(self.key.clone(), node.name());
        }
        Ok(result)
    }
}
