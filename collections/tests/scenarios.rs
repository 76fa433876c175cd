use std::any::Any;

use expect_test::expect;
use funcollect::prelude::*;

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::Int).collect()
}

#[derive(Debug)]
struct Point {
    x: i64,
    y: i64,
}

impl Object for Point {
    fn type_name(&self) -> &str {
        "Point"
    }

    fn is_instance_of(&self, type_name: &str) -> bool {
        matches!(type_name, "Point" | "Shape")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
struct Label;

impl Object for Label {
    fn type_name(&self) -> &str {
        "Label"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn generic_string_list_pipeline() {
    let names = GenericList::from_typed("string", ["key", "key2", "key3"].map(Value::from)).unwrap();
    let mut tagged = names
        .filter(|v| v.as_str() != Some("key"))
        .map(|v| Value::from(format!("{}_", v.to_plain_string())));

    assert_eq!(
        tagged.to_vec().unwrap(),
        vec![Value::from("key2_"), Value::from("key3_")]
    );
    assert_eq!(tagged.contract().value_type(), &TypeSpec::String);

    let err = tagged.add(Value::Int(1)).unwrap_err();
    expect!["Invalid type: expected <string>, got <int> 1"].assert_eq(&err.to_string());
}

#[test]
fn generic_int_list_accepts_only_ints() {
    let mut numbers = GenericList::of_type("int").unwrap();

    assert!(numbers.add(Value::from("string")).unwrap_err().is_invalid_type());
    numbers.add(Value::Int(5)).unwrap();
    assert_eq!(numbers.get(0).unwrap(), Some(Value::Int(5)));
    assert_eq!(numbers.count().unwrap(), 1);
}

#[test]
fn immutable_add_leaves_source_alone() {
    let list: ImmutableList = ImmutableList::of([1, 2]).unwrap();
    let grown = list.add(Value::Int(3)).unwrap();

    assert!(grown.contains(&Value::Int(3)).unwrap());
    assert!(!list.contains(&Value::Int(3)).unwrap());
}

#[test]
fn map_set_overwrites() {
    let key = Value::from("k");
    let mut map: Map = Map::from_pairs([(key.clone(), Value::Int(1))]).unwrap();
    map.set(key.clone(), Value::Int(2)).unwrap();

    assert_eq!(map.get(&key).unwrap(), Value::Int(2));
    assert_eq!(map.count().unwrap(), 1);
}

#[test]
fn ranges_and_infinite_sequences() {
    let range = Seq::range("1..5").unwrap();
    assert_eq!(range.to_vec().unwrap(), ints(&[1, 2, 3, 4, 5]));
    assert_eq!(range.to_vec().unwrap(), ints(&[1, 2, 3, 4, 5]));

    assert!(matches!(
        Seq::infinite().reverse(),
        Err(CollectionError::UnsupportedOperation(_))
    ));
    assert_eq!(Seq::infinite().take(3).to_vec().unwrap(), ints(&[1, 2, 3]));
}

#[test]
fn instance_of_contracts_follow_object_interfaces() {
    let registry = TypeRegistry::default().with_type("Shape");
    let contract = TypeContract::for_list("instance_of_Shape", &registry).unwrap();
    let mut shapes = GenericList::with_contract(contract, []).unwrap();

    shapes.add(Value::object(Point { x: 1, y: 2 })).unwrap();
    assert!(shapes.add(Value::object(Label)).unwrap_err().is_invalid_type());

    let first = shapes.first().unwrap().unwrap();
    let point = first.downcast_ref::<Point>().unwrap();
    assert_eq!((point.x, point.y), (1, 2));

    assert!(TypeContract::for_list("instance_of_Circle", &registry).is_err());
}

#[test]
fn collections_nest_inside_generic_maps() {
    let mut index = GenericMap::of_types("string", "instance_of_ListCollection").unwrap();
    let evens: List = List::of([2, 4]).unwrap();
    let frozen: ImmutableList = ImmutableList::of([1]).unwrap();

    index.set(Value::from("evens"), Value::object(evens)).unwrap();
    index.set(Value::from("frozen"), Value::object(frozen)).unwrap();
    assert!(index.set(Value::from("map"), Value::object(Map::new())).is_err());

    expect![[r#"{"evens": [2, 4], "frozen": [1]}"#]]
        .assert_eq(&index.to_array().unwrap().to_string());
}

#[test]
fn sequences_feed_collections() {
    let squares = Seq::infinite()
        .map(|v| Value::Int(v.as_int().unwrap_or_default().pow(2)))
        .take_while(|v| v.as_int().is_some_and(|n| n < 50))
        .to_list()
        .unwrap();
    assert_eq!(squares.to_vec().unwrap(), ints(&[1, 4, 9, 16, 25, 36, 49]));

    let grouped = squares
        .group_by(|v| Value::Bool(v.as_int().is_some_and(|n| n % 2 == 0)))
        .unwrap();
    expect!["{false: [1, 9, 25, 49], true: [4, 16, 36]}"]
        .assert_eq(&grouped.to_array().unwrap().to_string());
}
