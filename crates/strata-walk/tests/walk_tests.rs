//! Structure walker integration tests

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};
use strata_walk::{
    resolve_tagged, walk, Location, Slot, StaticResolver, StructureWalker, WalkError,
};

const MARKER: &str = "X";

fn is_marker(v: &Value) -> bool {
    v == MARKER
}

fn count_markers(v: &Value) -> usize {
    match v {
        Value::Array(items) => items.iter().map(count_markers).sum(),
        Value::Object(map) => map.values().map(count_markers).sum(),
        other => usize::from(is_marker(other)),
    }
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(json!(MARKER)),
        Just(Value::Null),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,4}".prop_map(Value::from),
    ];
    leaf.prop_recursive(5, 64, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            proptest::collection::btree_map("[A-Za-z]{1,3}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn prop_every_marker_is_visited_once(root in proptest::collection::vec(arb_value(), 0..6)) {
        let mut doc = Value::Array(root);
        let expected = count_markers(&doc);

        let visited = walk(
            &mut doc,
            |mut slot: Slot<'_, Value>| {
                slot.replace(json!("Y"));
                Ok::<_, std::convert::Infallible>(())
            },
            is_marker,
        )
        .unwrap();

        prop_assert_eq!(visited, expected);
        prop_assert_eq!(count_markers(&doc), 0);
    }
}

#[test]
fn visits_nested_marker_with_container_path() {
    let mut doc = json!({"a": [1, {"b": "X"}], "c": "X"});
    let mut seen = Vec::new();

    walk(
        &mut doc,
        |slot: Slot<'_, Value>| {
            seen.push((slot.container_path().to_vec(), slot.location().clone()));
            Ok::<_, std::convert::Infallible>(())
        },
        is_marker,
    )
    .unwrap();

    seen.sort_by_key(|(path, _)| path.len());
    assert_eq!(
        seen,
        vec![
            (vec![], Location::Key("c".into())),
            (
                vec![Location::Key("a".into()), Location::Index(1)],
                Location::Key("b".into())
            ),
        ]
    );
}

#[test]
fn marker_keys_are_not_matched() {
    let mut doc = json!({"X": 1, "k": {"X": "y"}});
    let visited = walk(
        &mut doc,
        |_: Slot<'_, Value>| Ok::<_, std::convert::Infallible>(()),
        is_marker,
    )
    .unwrap();
    assert_eq!(visited, 0);
}

#[test]
fn depth_bound_reports_path() {
    let mut doc = json!({"a": {"b": {"c": {"d": "X"}}}});
    let err = StructureWalker::new()
        .with_max_depth(2)
        .walk(
            &mut doc,
            |_: Slot<'_, Value>| Ok::<_, std::convert::Infallible>(()),
            is_marker,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        WalkError::StructuralCycle { limit: 2, ref path } if path == "$.a.b"
    ));
    assert_eq!(
        err.to_string(),
        "structure nested deeper than the 2-level bound at `$.a.b`"
    );
}

#[test]
fn resolves_yaml_stack_outputs() {
    let source = "\
vpc_id: !stack_output vpc::VpcId
subnets:
  - !stack_output vpc::SubnetA
  - literal
other: !env HOME
";
    let mut doc: serde_yaml::Value = serde_yaml::from_str(source).unwrap();
    let resolver = StaticResolver::new("stack_output")
        .with_value("vpc::VpcId", "vpc-123")
        .with_value("vpc::SubnetA", "subnet-a");

    let resolved = resolve_tagged(&mut doc, &resolver).unwrap();
    assert_eq!(resolved, 2);
    assert_eq!(doc["vpc_id"], serde_yaml::Value::from("vpc-123"));
    assert_eq!(doc["subnets"][0], serde_yaml::Value::from("subnet-a"));
    assert_eq!(doc["subnets"][1], serde_yaml::Value::from("literal"));
    assert!(matches!(doc["other"], serde_yaml::Value::Tagged(_)));
}

#[test]
fn unresolved_reference_fails_with_location() {
    let mut doc: serde_yaml::Value =
        serde_yaml::from_str("db:\n  port: !stack_output db::Port\n").unwrap();
    let err = resolve_tagged(&mut doc, &StaticResolver::new("stack_output")).unwrap_err();
    assert!(matches!(err, WalkError::Visit { ref path, .. } if path == "$.db.port"));
}
