use std::error::Error as StdError;
use wirebox_core::Error;

#[test]
fn lookup_error_messages() {
    assert_eq!(
        Error::unknown_service_id("foo").to_string(),
        "No service found for serviceId 'foo'"
    );
    assert_eq!(
        Error::unknown_service_type("alloc::string::String").to_string(),
        "Found 0 services for serviceType 'alloc::string::String', expecting 1"
    );
    assert_eq!(
        Error::ambiguous_service_type("alloc::string::String", 2).to_string(),
        "Found 2 services for serviceType 'alloc::string::String', expecting 1"
    );
    assert_eq!(
        Error::type_mismatch("child", "alloc::string::String").to_string(),
        "Incompatible type for serviceId 'child'"
    );
}

#[test]
fn structural_error_messages() {
    let chain = vec![
        "circular1".to_string(),
        "circular2".to_string(),
        "circular3".to_string(),
        "circular1".to_string(),
    ];
    assert_eq!(
        Error::circular_dependency(chain).to_string(),
        "Circular dependency reference detected [circular1, circular2, circular3, circular1]"
    );
    assert_eq!(
        Error::duplicate_key("mapBean", "\"key1\"").to_string(),
        "Duplicate contribution key \"key1\" for serviceId 'mapBean'"
    );
    assert_eq!(
        Error::ordering_conflict(vec!["a".into(), "b".into(), "a".into()]).to_string(),
        "Ordering conflict detected [a, b, a]"
    );
    assert_eq!(
        Error::assembly("Duplicate serviceId 'string1'").to_string(),
        "Duplicate serviceId 'string1'"
    );
}

#[test]
fn type_mismatch_source_names_the_expected_type() {
    let err = Error::type_mismatch("child", "alloc::string::String");
    assert_eq!(err.to_string(), "Incompatible type for serviceId 'child'");
    let source = err.source().map(ToString::to_string);
    assert_eq!(
        source.as_deref(),
        Some("expected serviceType 'alloc::string::String'")
    );
}

#[test]
fn user_errors_get_wrapped_once_with_the_service_id() {
    let wrapped = Error::wrap_build("greeter", Error::from("boom"));
    assert_eq!(wrapped.to_string(), "Error building service 'greeter'");
    let source = wrapped.source().map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("boom"));
}

#[test]
fn structural_errors_pass_through_unwrapped() {
    let inner = Error::unknown_service_id("missing");
    let passed = Error::wrap_build("greeter", inner);
    assert_eq!(passed.to_string(), "No service found for serviceId 'missing'");

    let cycle = Error::circular_dependency(vec!["a".into(), "a".into()]);
    let passed = Error::wrap_build("greeter", cycle);
    assert!(matches!(passed, Error::CircularDependency { .. }));
}

#[test]
fn already_wrapped_build_errors_are_not_rewrapped() {
    let once = Error::wrap_build("inner", Error::from("boom"));
    let twice = Error::wrap_build("outer", once);
    assert_eq!(twice.to_string(), "Error building service 'inner'");
}

#[test]
fn structural_classification() {
    assert!(Error::unknown_service_id("x").is_structural());
    assert!(Error::assembly("bad").is_structural());
    assert!(Error::internal("bad").is_structural());
    assert!(!Error::from("user failure").is_structural());
    assert!(!Error::from("user failure".to_string()).is_structural());
}
