//! Declarative group tree documents
//!
//! A group tree is described in YAML:
//!
//! ```yaml
//! name: dev
//! groups:
//!   - name: ew1
//!     stacks: [vpc, jump-host]
//!   - name: uw2
//!     stacks: [db]
//! ```

use crate::error::TreeError;
use crate::node::{GroupNode, GroupTree, StackId};
use serde::{Deserialize, Serialize};

/// Serialized form of one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupSpec {
    /// Own name of the group (one path segment)
    pub name: String,

    /// Stacks owned directly by the group
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stacks: Vec<StackId>,

    /// Sub-groups
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupSpec>,
}

impl GroupSpec {
    /// Parse a YAML document
    ///
    /// # Errors
    /// Returns [`TreeError::Parse`] on malformed YAML or unknown fields.
    pub fn from_yaml_str(source: &str) -> Result<Self, TreeError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Build the node this document describes
    ///
    /// # Errors
    /// Returns [`TreeError::Path`] for invalid group names.
    pub fn into_node(self) -> Result<GroupNode, TreeError> {
        let node = if self.groups.is_empty() {
            GroupNode::leaf(&self.name, self.stacks)?
        } else {
            let children = self
                .groups
                .into_iter()
                .map(GroupSpec::into_node)
                .collect::<Result<Vec<_>, _>>()?;
            GroupNode::branch(&self.name, children)?.with_stacks(self.stacks)
        };
        Ok(node)
    }

    /// Build and validate the whole tree
    ///
    /// # Errors
    /// Any [`TreeError`] from node construction or tree validation.
    pub fn into_tree(self) -> Result<GroupTree, TreeError> {
        GroupTree::new(self.into_node()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TREE: &str = r"
name: dev
stacks: [shared]
groups:
  - name: ew1
    stacks: [vpc, jump-host]
  - name: uw2
    groups:
      - name: data
        stacks: [db]
";

    #[test]
    fn parses_nested_groups() {
        let tree = GroupSpec::from_yaml_str(TREE).unwrap().into_tree().unwrap();
        assert_eq!(tree.group_count(), 4);
        assert_eq!(tree.stack_count(), 4);

        let data = tree.subtree(&"dev/uw2/data".parse().unwrap()).unwrap();
        assert_eq!(data.stacks(), &[StackId::from("db")]);
        assert_eq!(tree.root().stacks(), &[StackId::from("shared")]);
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = GroupSpec::from_yaml_str("name: dev\nstack: [a]\n").unwrap_err();
        assert!(matches!(err, TreeError::Parse(_)));
    }

    #[test]
    fn rejects_duplicate_stacks_across_groups() {
        let source = "name: dev\ngroups:\n  - name: a\n    stacks: [vpc]\n  - name: b\n    stacks: [vpc]\n";
        let err = GroupSpec::from_yaml_str(source)
            .unwrap()
            .into_tree()
            .unwrap_err();
        assert!(matches!(err, TreeError::DuplicateStack { .. }));
    }

    #[test]
    fn rejects_invalid_group_name() {
        let err = GroupSpec::from_yaml_str("name: 'dev/ew1'\n")
            .unwrap()
            .into_node()
            .unwrap_err();
        assert!(matches!(err, TreeError::Path(_)));
    }
}
