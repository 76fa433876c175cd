use super::*;
use std::any::Any;

use crate::value::Object;

#[derive(Debug)]
struct User;

impl Object for User {
    fn type_name(&self) -> &str {
        "User"
    }

    fn is_instance_of(&self, type_name: &str) -> bool {
        matches!(type_name, "User" | "Entity")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
struct Order;

impl Object for Order {
    fn type_name(&self) -> &str {
        "Order"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn registry() -> TypeRegistry {
    TypeRegistry::default()
        .with_type("User")
        .with_type("Order")
        .with_type("Entity")
}

// Token parsing

#[test]
fn parse_primitive_tokens() {
    let registry = TypeRegistry::default();

    assert_eq!(TypeSpec::parse("string", &registry), Ok(TypeSpec::String));
    assert_eq!(TypeSpec::parse("int", &registry), Ok(TypeSpec::Int));
    assert_eq!(TypeSpec::parse("float", &registry), Ok(TypeSpec::Float));
    assert_eq!(TypeSpec::parse("bool", &registry), Ok(TypeSpec::Bool));
    assert_eq!(TypeSpec::parse("array", &registry), Ok(TypeSpec::Array));
    assert_eq!(TypeSpec::parse("object", &registry), Ok(TypeSpec::Object));
}

#[test]
fn parse_unknown_token_fails() {
    let err = TypeSpec::parse("integer", &TypeRegistry::default()).unwrap_err();

    assert!(err.is_invalid_type());
    assert_eq!(
        err.to_string(),
        "Invalid type declaration `integer`: unknown type"
    );
}

#[test]
fn parse_instance_of_registered_type() {
    let spec = TypeSpec::parse("instance_of_Entity", &registry()).unwrap();

    assert_eq!(spec.kind(), TypeKind::InstanceOf);
    assert_eq!(spec.to_string(), "instance_of_Entity");
}

#[test]
fn parse_instance_of_builtin_collection() {
    let spec = TypeSpec::parse("instance_of_ListCollection", &TypeRegistry::default());
    assert!(spec.is_ok());
}

#[test]
fn instance_of_unknown_type_fails() {
    let err = TypeSpec::parse("instance_of_Ghost", &registry()).unwrap_err();

    assert!(matches!(
        err,
        CollectionError::InvalidTypeDeclaration { ref token, .. } if token == "instance_of_Ghost"
    ));
}

#[test]
fn instance_of_empty_suffix_fails() {
    let err = TypeSpec::parse("instance_of_", &registry()).unwrap_err();

    assert!(err.is_invalid_type());
    assert!(err.to_string().contains("missing type name"));
}

#[test]
fn empty_registry_knows_nothing() {
    let registry = TypeRegistry::empty();

    assert!(registry.is_empty());
    assert!(TypeSpec::parse("instance_of_List", &registry).is_err());
    assert!(TypeRegistry::default().len() >= BUILTIN_TYPES.len());
}

// Matching

#[test]
fn bool_matches_only_real_booleans() {
    assert!(TypeSpec::Bool.accepts(&Value::Bool(false)));
    assert!(!TypeSpec::Bool.accepts(&Value::Int(0)));
    assert!(!TypeSpec::Bool.accepts(&Value::from("")));
    assert!(!TypeSpec::Bool.accepts(&Value::Null));
}

#[test]
fn float_rejects_integers() {
    assert!(TypeSpec::Float.accepts(&Value::from(1.0)));
    assert!(!TypeSpec::Float.accepts(&Value::Int(1)));
    assert!(!TypeSpec::Int.accepts(&Value::from(1.0)));
}

#[test]
fn array_accepts_arrays_and_dicts() {
    assert!(TypeSpec::Array.accepts(&Value::array([])));
    assert!(TypeSpec::Array.accepts(&Value::dict([])));
    assert!(!TypeSpec::Array.accepts(&Value::from("[]")));
}

#[test]
fn instance_of_is_polymorphic() {
    let registry = registry();
    let entity = TypeSpec::parse("instance_of_Entity", &registry).unwrap();
    let user = TypeSpec::parse("instance_of_User", &registry).unwrap();

    assert!(entity.accepts(&Value::object(User)));
    assert!(user.accepts(&Value::object(User)));
    assert!(!entity.accepts(&Value::object(Order)));
    assert!(!entity.accepts(&Value::from("User")));
    assert!(TypeSpec::Object.accepts(&Value::object(Order)));
}

// Contracts

#[test]
fn list_contract_has_int_keys() {
    let contract = TypeContract::for_list("string", &TypeRegistry::default()).unwrap();

    assert_eq!(contract.key_type(), &TypeSpec::Int);
    assert_eq!(contract.value_type(), &TypeSpec::String);
    assert_eq!(contract.to_string(), "<int, string>");
}

#[test]
fn map_contract_rejects_non_scalar_key_type() {
    let err = TypeContract::for_map("array", "int", &TypeRegistry::default()).unwrap_err();

    assert_eq!(
        err.to_string(),
        "Invalid type declaration `array`: not permitted here; allowed: int, string, float, bool"
    );
}

#[test]
fn caller_can_restrict_allowed_tokens() {
    let registry = TypeRegistry::default();

    let ok = TypeContract::new(
        "string",
        "int",
        &[TypeKind::Int, TypeKind::String],
        &[TypeKind::Int],
        &registry,
    );
    assert!(ok.is_ok());

    let err = TypeContract::new(
        "string",
        "float",
        &[TypeKind::Int, TypeKind::String],
        &[TypeKind::Int],
        &registry,
    )
    .unwrap_err();
    assert!(err.is_invalid_type());
}

#[test]
fn assert_value_reports_expected_and_actual() {
    let contract = TypeContract::for_list("int", &TypeRegistry::default()).unwrap();

    assert_eq!(contract.assert_value(&Value::Int(5)), Ok(()));
    assert_eq!(
        contract.assert_value(&Value::from("string")),
        Err(CollectionError::InvalidType {
            expected: "int".to_string(),
            actual: "string".to_string(),
            value: "\"string\"".to_string(),
        })
    );
}

#[test]
fn assert_key_uses_key_type() {
    let contract = TypeContract::for_map("string", "int", &TypeRegistry::default()).unwrap();

    assert!(contract.assert_key(&Value::from("k")).is_ok());
    assert!(contract.assert_key(&Value::Int(1)).is_err());
}

#[test]
fn retyped_checked_leaves_source_untouched() {
    let source = Checked::new(TypeContract::for_list("string", &TypeRegistry::default()).unwrap());
    let mapped = source.retyped(TypeSpec::Int);

    assert_eq!(source.contract().value_type(), &TypeSpec::String);
    assert_eq!(mapped.contract().value_type(), &TypeSpec::Int);
    assert_eq!(mapped.contract().key_type(), &TypeSpec::Int);
}

#[test]
fn unchecked_accepts_everything() {
    assert!(Unchecked.check_value(&Value::Null).is_ok());
    assert!(Unchecked.check_key(&Value::array([])).is_ok());
    assert!(!Unchecked.is_generic());
    assert!(Checked::new(TypeContract::for_list("int", &TypeRegistry::default()).unwrap()).is_generic());
}
