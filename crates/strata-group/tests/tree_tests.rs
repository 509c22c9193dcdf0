//! Group tree integration tests

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use strata_group::naming::{camel_to_snake_case, external_stack_name, mask_key};
use strata_group::{GroupNode, GroupPath, GroupSpec, GroupTree, TreeError};

const ENVIRONMENTS: &str = r"
name: prj
groups:
  - name: dev
    stacks: [dev-shared]
    groups:
      - name: ew1
        stacks: [vpc, jump-host]
      - name: ue1
        stacks: [db]
  - name: prod
    groups:
      - name: ew1
        stacks: [prod-vpc]
";

#[test]
fn yaml_tree_prefixes_child_paths() {
    let tree = GroupSpec::from_yaml_str(ENVIRONMENTS)
        .unwrap()
        .into_tree()
        .unwrap();

    assert_eq!(tree.group_count(), 6);
    assert_eq!(tree.stack_count(), 5);

    let names: Vec<String> = tree.root().descendants().map(GroupNode::name).collect();
    assert_eq!(
        names,
        vec!["prj", "prj/dev", "prj/dev/ew1", "prj/dev/ue1", "prj/prod", "prj/prod/ew1"]
    );

    let dev: GroupPath = "prj/dev".parse().unwrap();
    let subtree = tree.subtree(&dev).unwrap();
    assert_eq!(subtree.stacks().len(), 1);
    assert_eq!(subtree.children().len(), 2);
}

#[test]
fn same_name_under_different_parents_is_allowed() {
    let tree = GroupSpec::from_yaml_str(ENVIRONMENTS)
        .unwrap()
        .into_tree()
        .unwrap();
    assert!(tree.subtree(&"prj/dev/ew1".parse().unwrap()).is_some());
    assert!(tree.subtree(&"prj/prod/ew1".parse().unwrap()).is_some());
}

#[test]
fn duplicate_stack_across_groups_is_rejected() {
    let source = "name: r\ngroups:\n  - name: a\n    stacks: [s]\n  - name: b\n    stacks: [s]\n";
    let err = GroupSpec::from_yaml_str(source)
        .unwrap()
        .into_tree()
        .unwrap_err();
    match err {
        TreeError::DuplicateStack { stack, first, second } => {
            assert_eq!(stack.as_str(), "s");
            assert_eq!(first.to_string(), "r/a");
            assert_eq!(second.to_string(), "r/b");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_sibling_group_is_rejected() {
    let root = GroupNode::branch(
        "r",
        [
            GroupNode::leaf("a", ["s1"]).unwrap(),
            GroupNode::leaf("a", ["s2"]).unwrap(),
        ],
    )
    .unwrap();
    assert!(matches!(GroupTree::new(root), Err(TreeError::DuplicateGroup(_))));
}

#[test]
fn unknown_fields_and_bad_names_are_rejected() {
    assert!(matches!(
        GroupSpec::from_yaml_str("name: r\nstackz: [a]\n"),
        Err(TreeError::Parse(_))
    ));
    assert!(matches!(
        GroupSpec::from_yaml_str("name: \"bad name\"\n")
            .unwrap()
            .into_tree(),
        Err(TreeError::Path(_))
    ));
}

#[test]
fn name_helpers() {
    assert_eq!(external_stack_name("prj", "dev/ew1/jump-host"), "prj-dev-ew1-jump-host");
    assert_eq!(mask_key("abcdefgh"), "****efgh");
    assert_eq!(mask_key("abc"), "abc");
    assert_eq!(camel_to_snake_case("ASGScalingProcesses"), "asg_scaling_processes");
}

proptest! {
    #[test]
    fn prop_distinct_leaves_always_validate(widths in proptest::collection::vec(0..5usize, 1..8)) {
        let leaves: Vec<GroupNode> = widths
            .iter()
            .enumerate()
            .map(|(i, n)| GroupNode::leaf(&format!("g{i}"), (0..*n).map(|j| format!("s{i}-{j}"))).unwrap())
            .collect();
        let tree = GroupTree::new(GroupNode::branch("root", leaves).unwrap()).unwrap();

        prop_assert_eq!(tree.group_count(), widths.len() + 1);
        prop_assert_eq!(tree.stack_count(), widths.iter().sum::<usize>());
        prop_assert_eq!(tree.stacks().count(), tree.stack_count());
    }
}
