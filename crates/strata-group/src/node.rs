//! Group tree nodes
//!
//! A [`GroupNode`] is either a leaf, owning stacks directly, or an internal
//! node owning sub-groups. [`GroupTree`] wraps a validated root.

use crate::error::TreeError;
use crate::path::{validate_segment, GroupPath};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Identifier of a managed resource (stack)
///
/// Stack ids are the keys of every aggregate result.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackId(String);

impl StackId {
    /// Create new stack id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get id as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StackId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for StackId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for StackId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One node of the group tree
///
/// Children are held behind [`Arc`] so dispatch tasks can share the tree
/// read-only without copying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNode {
    path: GroupPath,
    children: Vec<Arc<GroupNode>>,
    stacks: Vec<StackId>,
}

impl GroupNode {
    /// Create a leaf group owning `stacks`
    ///
    /// # Errors
    /// Returns [`TreeError::Path`] if `name` is not a valid group name.
    pub fn leaf<I, S>(name: &str, stacks: I) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<StackId>,
    {
        validate_segment(name)?;
        Ok(Self {
            path: GroupPath::single(name),
            children: Vec::new(),
            stacks: stacks.into_iter().map(Into::into).collect(),
        })
    }

    /// Create an internal group owning `children`
    ///
    /// Children's paths are re-rooted under this group.
    ///
    /// # Errors
    /// Returns [`TreeError::Path`] if `name` is not a valid group name.
    pub fn branch<I>(name: &str, children: I) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = GroupNode>,
    {
        validate_segment(name)?;
        let path = GroupPath::single(name);
        let children = children
            .into_iter()
            .map(|mut child| {
                child.reroot(&path);
                Arc::new(child)
            })
            .collect();

        Ok(Self {
            path,
            children,
            stacks: Vec::new(),
        })
    }

    /// Attach stacks to this group (internal groups may own stacks too)
    #[must_use]
    pub fn with_stacks<I, S>(mut self, stacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StackId>,
    {
        self.stacks.extend(stacks.into_iter().map(Into::into));
        self
    }

    fn reroot(&mut self, prefix: &GroupPath) {
        self.path = self.path.prefixed(prefix);
        for child in &mut self.children {
            Arc::make_mut(child).reroot(prefix);
        }
    }

    /// Full path of this group
    #[inline]
    #[must_use]
    pub fn path(&self) -> &GroupPath {
        &self.path
    }

    /// Fully-qualified name (path joined with `/`)
    #[inline]
    #[must_use]
    pub fn name(&self) -> String {
        self.path.to_string()
    }

    /// Direct sub-groups
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[Arc<GroupNode>] {
        &self.children
    }

    /// Stacks owned directly by this group
    #[inline]
    #[must_use]
    pub fn stacks(&self) -> &[StackId] {
        &self.stacks
    }

    /// True when the group has no sub-groups
    #[inline]
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Depth-first, pre-order iterator over this group and its descendants
    pub fn descendants(&self) -> impl Iterator<Item = &GroupNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev().map(AsRef::as_ref));
            Some(node)
        })
    }

    /// Find a strict descendant by full path
    #[must_use]
    pub fn find(&self, path: &GroupPath) -> Option<&Arc<GroupNode>> {
        self.children
            .iter()
            .find(|child| child.path.is_prefix_of(path))
            .and_then(|child| {
                if child.path == *path {
                    Some(child)
                } else {
                    child.find(path)
                }
            })
    }
}

/// A validated group tree
///
/// Guarantees that every group path and every stack id is unique, which
/// is what lets aggregate merges stay conflict-free.
#[derive(Debug, Clone)]
pub struct GroupTree {
    root: Arc<GroupNode>,
    group_count: usize,
    stack_count: usize,
}

impl GroupTree {
    /// Validate `root` and wrap it
    ///
    /// # Errors
    /// - [`TreeError::DuplicateGroup`] if two groups share a path
    /// - [`TreeError::DuplicateStack`] if two groups declare the same stack
    ///   (or one group declares it twice)
    pub fn new(root: GroupNode) -> Result<Self, TreeError> {
        let mut groups: HashSet<&GroupPath> = HashSet::new();
        let mut stacks: HashMap<&StackId, &GroupPath> = HashMap::new();

        for node in root.descendants() {
            if !groups.insert(&node.path) {
                return Err(TreeError::DuplicateGroup(node.path.clone()));
            }
            for stack in &node.stacks {
                if let Some(first) = stacks.insert(stack, &node.path) {
                    return Err(TreeError::DuplicateStack {
                        stack: stack.clone(),
                        first: first.clone(),
                        second: node.path.clone(),
                    });
                }
            }
        }

        let group_count = groups.len();
        let stack_count = stacks.len();
        Ok(Self {
            root: Arc::new(root),
            group_count,
            stack_count,
        })
    }

    /// Root group
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Arc<GroupNode> {
        &self.root
    }

    /// Group at `path`, or the root when `path` is the root's path
    #[must_use]
    pub fn subtree(&self, path: &GroupPath) -> Option<&Arc<GroupNode>> {
        if self.root.path == *path {
            Some(&self.root)
        } else {
            self.root.find(path)
        }
    }

    /// Number of groups in the tree
    #[inline]
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    /// Number of stacks in the tree
    #[inline]
    #[must_use]
    pub fn stack_count(&self) -> usize {
        self.stack_count
    }

    /// All stacks in depth-first group order
    pub fn stacks(&self) -> impl Iterator<Item = &StackId> {
        self.root.descendants().flat_map(|node| node.stacks.iter())
    }
}
