use super::*;
use crate::contract::VALUE_KINDS;
use crate::list::List;
use crate::traits::ListView;
use expect_test::expect;

fn key(name: &str) -> Value {
    Value::from(name)
}

fn scores() -> Map {
    Map::from_pairs([
        (key("ann"), Value::Int(3)),
        (key("bob"), Value::Int(8)),
        (key("cat"), Value::Int(5)),
    ])
    .unwrap()
}

fn int_of(v: &Value) -> i64 {
    v.as_int().unwrap_or_default()
}

// ============================================================================
// Keys
// ============================================================================

#[test]
fn set_existing_key_overwrites() {
    let mut map: Map = Map::from_pairs([(key("k"), Value::Int(1))]).unwrap();
    map.set(key("k"), Value::Int(2)).unwrap();

    assert_eq!(map.get(&key("k")).unwrap(), Value::Int(2));
    assert_eq!(map.count().unwrap(), 1);
}

#[test]
fn overwrite_keeps_insertion_position() {
    let mut map = scores();
    map.set(key("ann"), Value::Int(0)).unwrap();
    map.set(key("dan"), Value::Int(1)).unwrap();

    assert_eq!(
        map.keys().unwrap().to_vec().unwrap(),
        vec![key("ann"), key("bob"), key("cat"), key("dan")]
    );
}

#[test]
fn missing_key_is_undefined() {
    let map = scores();

    let err = map.get(&key("zed")).unwrap_err();
    expect![[r#"Undefined key: "zed""#]].assert_eq(&err.to_string());
    assert_eq!(map.get_or_none(&key("zed")).unwrap(), None);
    assert!(!map.contains_key(&key("zed")).unwrap());
    assert!(map.contains_key(&key("bob")).unwrap());
}

#[test]
fn keys_must_be_scalar() {
    let mut map = Map::new();

    assert!(map.set(Value::array([]), Value::Int(1)).unwrap_err().is_invalid_type());
    assert!(map.set(Value::object(List::new()), Value::Int(1)).is_err());
    assert!(Map::<Unchecked>::from_pairs([(Value::Null, Value::Int(1))]).is_err());
    map.set(Value::Bool(true), Value::Int(1)).unwrap();
    map.set(Value::from(1.5), Value::Int(2)).unwrap();
    assert_eq!(map.count().unwrap(), 2);
}

#[test]
fn remove_and_clear() {
    let mut map = scores();

    assert_eq!(map.remove(&key("bob")).unwrap(), Some(Value::Int(8)));
    assert_eq!(map.remove(&key("bob")).unwrap(), None);
    assert_eq!(map.count().unwrap(), 2);

    map.clear().unwrap();
    assert!(map.is_empty().unwrap());
}

// ============================================================================
// Deferred pipeline
// ============================================================================

#[test]
fn map_and_filter_see_key_and_value() {
    let map = scores();
    let derived = map
        .filter(|k, v| k != &key("ann") && int_of(v) > 4)
        .map(|k, v| Value::from(format!("{}={}", k.to_plain_string(), int_of(v))));

    assert_eq!(derived.pending_stages(), vec!["Filter", "Map"]);
    assert_eq!(
        derived.entries().unwrap(),
        vec![
            (key("bob"), Value::from("bob=8")),
            (key("cat"), Value::from("cat=5")),
        ]
    );
    assert_eq!(map.get(&key("ann")).unwrap(), Value::Int(3));
}

#[test]
fn set_collapses_pending_stages_first() {
    let mut map = scores().map(|_, v| Value::Int(int_of(v) * 10));
    map.set(key("dan"), Value::Int(1)).unwrap();

    assert_eq!(map.get(&key("ann")).unwrap(), Value::Int(30));
    assert_eq!(map.get(&key("dan")).unwrap(), Value::Int(1));
}

#[test]
fn iter_yields_collapsed_entries() {
    let map = scores().filter(|_, v| int_of(v) != 8);

    let keys: Vec<Value> = map.iter().unwrap().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![key("ann"), key("cat")]);
}

// ============================================================================
// Reads
// ============================================================================

#[test]
fn find_and_find_key() {
    let map = scores();

    assert_eq!(map.find(|_, v| int_of(v) > 4).unwrap(), Some(Value::Int(8)));
    assert_eq!(map.find_key(|_, v| int_of(v) == 5).unwrap(), Some(key("cat")));
    assert_eq!(map.find(|_, v| int_of(v) > 100).unwrap(), None);
}

#[test]
fn keys_values_and_pairs_are_lists() {
    let map = scores();

    assert_eq!(
        map.values().unwrap().to_vec().unwrap(),
        vec![Value::Int(3), Value::Int(8), Value::Int(5)]
    );
    expect![[r#"[["ann", 3], ["bob", 8], ["cat", 5]]"#]]
        .assert_eq(&map.pairs().unwrap().to_array().unwrap().to_string());
}

#[test]
fn contains_checks_values() {
    let map = scores();

    assert!(map.contains(&Value::Int(8)).unwrap());
    assert!(!map.contains(&key("bob")).unwrap());
    assert!(map.contains_by(|k, _| k == &key("cat")).unwrap());
}

#[test]
fn each_and_reduce() {
    let map = scores();
    let mut visited = Vec::new();
    map.each(|k, _| visited.push(k.to_plain_string())).unwrap();

    assert_eq!(visited, vec!["ann", "bob", "cat"]);
    assert_eq!(
        map.reduce(|acc, _, v| Value::Int(int_of(&acc) + int_of(v)), Value::Int(0))
            .unwrap(),
        Value::Int(16)
    );
}

#[test]
fn to_seq_yields_pairs() {
    let first = scores().to_seq().unwrap().first().unwrap();

    assert_eq!(first, Some(Value::array([key("ann"), Value::Int(3)])));
}

#[test]
fn from_dict_and_recursive_export() {
    let dict = Value::dict([
        (key("xs"), Value::array([Value::Int(1), Value::Int(2)])),
        (key("n"), Value::Int(0)),
    ]);

    let flat = Map::from_dict(&dict).unwrap();
    assert_eq!(flat.get(&key("xs")).unwrap().type_name(), "array");

    let nested = Map::from_recursive(match &dict {
        Value::Dict(entries) => entries.clone(),
        _ => unreachable!(),
    })
    .unwrap();
    assert_eq!(nested.get(&key("xs")).unwrap().type_name(), "List");
    assert_eq!(nested.to_array().unwrap(), dict);

    assert!(Map::from_dict(&Value::Int(1)).unwrap_err().is_invalid_type());
}

// ============================================================================
// Generic maps
// ============================================================================

#[test]
fn generic_map_checks_keys_and_values() {
    let mut map = GenericMap::of_types("string", "int").unwrap();

    map.set(key("a"), Value::Int(1)).unwrap();
    assert!(map.set(Value::Int(1), Value::Int(1)).unwrap_err().is_invalid_type());
    assert!(map.set(key("b"), Value::from("1")).unwrap_err().is_invalid_type());
    assert!(map.get(&Value::Int(1)).unwrap_err().is_invalid_type());
    assert!(map.remove(&Value::Int(1)).is_err());
    assert_eq!(map.count().unwrap(), 1);
}

#[test]
fn generic_map_violation_leaves_map_unchanged() {
    let map = GenericMap::from_typed("string", "int", [(key("a"), Value::Int(1))]).unwrap();
    let broken = map.map(|_, _| Value::Null);

    assert!(broken.count().unwrap_err().is_invalid_type());
    assert_eq!(broken.pending_stages(), vec!["Map"]);
    assert_eq!(map.get(&key("a")).unwrap(), Value::Int(1));
}

#[test]
fn generic_map_to_retypes_values() {
    let map = GenericMap::from_typed("string", "int", [(key("a"), Value::Int(1))]).unwrap();
    let flags = map.map_to(TypeSpec::Bool, |_, v| Value::Bool(int_of(v) > 0));

    assert_eq!(flags.get(&key("a")).unwrap(), Value::Bool(true));
    assert_eq!(flags.contract().value_type(), &TypeSpec::Bool);
    assert_eq!(flags.contract().key_type(), &TypeSpec::String);
    assert_eq!(map.contract().value_type(), &TypeSpec::Int);
}

#[test]
fn generic_map_construction_rules() {
    assert!(matches!(
        GenericMap::from_pairs([]),
        Err(CollectionError::UnsupportedOperation(_))
    ));
    assert!(GenericMap::of_types("array", "int").unwrap_err().is_invalid_type());
    assert!(GenericMap::from_typed("int", "string", [(key("a"), key("b"))]).is_err());

    let registry = TypeRegistry::default();
    let contract = TypeContract::new("object", "int", VALUE_KINDS, VALUE_KINDS, &registry).unwrap();
    assert!(GenericMap::with_contract(contract, []).unwrap_err().is_invalid_type());
}

#[test]
fn object_identity() {
    let generic = GenericMap::of_types("int", "int").unwrap();

    assert_eq!(Map::new().type_name(), "Map");
    assert_eq!(generic.type_name(), "GenericMap");
    assert!(generic.is_instance_of("MapCollection"));
    assert!(!generic.is_instance_of("ListCollection"));
}

// ============================================================================
// Immutable maps
// ============================================================================

#[test]
fn immutable_set_returns_new_map() {
    let map: ImmutableMap = ImmutableMap::from_pairs([(key("k"), Value::Int(1))]).unwrap();
    let updated = map.set(key("k"), Value::Int(2)).unwrap();

    assert_eq!(updated[&key("k")], Value::Int(2));
    assert_eq!(map[&key("k")], Value::Int(1));
    assert_eq!(updated.len(), 1);
}

#[test]
fn immutable_remove_filter_map() {
    let map: ImmutableMap = scores().as_immutable().unwrap();

    let removed = map.remove(&key("ann")).unwrap();
    assert_eq!(removed.len(), 2);
    assert_eq!(map.len(), 3);

    let high = map.filter(|_, v| int_of(v) > 4);
    assert_eq!(high.keys().unwrap().to_vec().unwrap(), vec![key("bob"), key("cat")]);

    let doubled = map.map(|_, v| Value::Int(int_of(v) * 2)).unwrap();
    assert_eq!(doubled[&key("cat")], Value::Int(10));
    assert!(map.clear().is_empty());
}

#[test]
fn immutable_map_borrows_captured_state() {
    let map: ImmutableMap = scores().as_immutable().unwrap();
    let bonus = Value::Int(10);

    let raised = map.map(|_, v| Value::Int(int_of(v) + int_of(&bonus))).unwrap();
    assert_eq!(raised[&key("ann")], Value::Int(13));
    assert_eq!(map[&key("ann")], Value::Int(3));
}

#[test]
fn immutable_filter_keeps_survivor_order() {
    let map: ImmutableMap = ImmutableMap::from_pairs([
        (key("d"), Value::Int(4)),
        (key("a"), Value::Int(1)),
        (key("c"), Value::Int(3)),
        (key("b"), Value::Int(2)),
    ])
    .unwrap();

    let even = map.filter(|_, v| int_of(v) % 2 == 0);
    let entries: Vec<_> = even.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    assert_eq!(
        entries,
        vec![(key("d"), Value::Int(4)), (key("b"), Value::Int(2))]
    );
    assert_eq!(map.len(), 4);
    assert!(map.filter(|_, _| false).is_empty());
}

#[test]
#[should_panic(expected = "undefined key")]
fn immutable_index_panics_on_missing_key() {
    let map = ImmutableMap::new();
    let _ = &map[&key("missing")];
}

#[test]
fn immutable_generic_checks_at_call_time() {
    let map = ImmutableGenericMap::from_typed("int", "string", [(Value::Int(1), key("one"))]).unwrap();

    assert!(map.set(key("two"), key("two")).is_err());
    assert!(map.map(|_, _| Value::Int(0)).unwrap_err().is_invalid_type());

    let lengths = map
        .map_to(TypeSpec::Int, |_, v| Value::from(v.as_str().map_or(0, str::len)))
        .unwrap();
    assert_eq!(lengths[&Value::Int(1)], Value::Int(3));
    assert!(ImmutableGenericMap::from_pairs([]).is_err());
}

#[test]
fn conversions_are_independent() {
    let frozen: ImmutableMap = ImmutableMap::from_pairs([(key("a"), Value::Int(1))]).unwrap();
    let mut thawed = frozen.as_mutable();
    thawed.set(key("b"), Value::Int(2)).unwrap();

    assert_eq!(frozen.len(), 1);
    assert_eq!(thawed.count().unwrap(), 2);

    let generic = GenericMap::of_types("string", "int").unwrap();
    let frozen_generic = generic.as_immutable().unwrap();
    assert!(frozen_generic.set(key("x"), key("y")).is_err());
}

#[test]
fn immutable_recursive_nesting() {
    let map = ImmutableMap::from_recursive([(key("xs"), Value::array([Value::Int(1)]))]).unwrap();

    assert_eq!(map[&key("xs")].type_name(), "ImmutableList");
}
