use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wirebox::{RegistryBuilder, ServiceBinder, ServiceId, ServiceType};

struct Child;

struct Parent {
    child: Arc<Child>,
}

struct GrandParent {
    parent: Arc<Parent>,
    child: Arc<Child>,
}

fn family_module(binder: &mut ServiceBinder) {
    binder.bind::<GrandParent, _>(|ctx| {
        Ok(GrandParent {
            parent: ctx.get_by_type()?,
            child: ctx.get_by_type()?,
        })
    });
    binder.bind::<Parent, _>(|ctx| {
        Ok(Parent {
            child: ctx.get_by_type()?,
        })
    });
    binder.bind::<Child, _>(|_| Ok(Child));
}

#[test]
fn nested_resolution_shares_one_instance_per_service() {
    let registry = RegistryBuilder::new()
        .with_module(family_module)
        .build()
        .unwrap();

    let grand_parent = registry.get_by_type::<GrandParent>().unwrap();
    let parent = registry.get_by_type::<Parent>().unwrap();
    let child = registry.get_by_type::<Child>().unwrap();

    assert!(Arc::ptr_eq(&child, &parent.child));
    assert!(Arc::ptr_eq(&child, &grand_parent.child));
    assert!(Arc::ptr_eq(&parent, &grand_parent.parent));
}

#[test]
fn unknown_service_id_is_reported() {
    let registry = RegistryBuilder::new()
        .with_module(family_module)
        .build()
        .unwrap();
    let err = registry.get_by_id("foo").unwrap_err();
    assert_eq!(err.to_string(), "No service found for serviceId 'foo'");
}

#[test]
fn type_lookup_with_zero_matches_is_reported() {
    let registry = RegistryBuilder::new()
        .with_module(family_module)
        .build()
        .unwrap();
    let err = registry.get_by_type::<String>().unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "Found 0 services for serviceType '{}', expecting 1",
            std::any::type_name::<String>()
        )
    );
}

#[test]
fn type_lookup_with_two_matches_is_reported() {
    let registry = RegistryBuilder::new()
        .with_module(|binder: &mut ServiceBinder| {
            binder.bind_instance("hello".to_string()).with_id("string1");
            binder.bind_instance("world".to_string()).with_id("string2");
        })
        .build()
        .unwrap();
    let err = registry.get_by_type::<String>().unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "Found 2 services for serviceType '{}', expecting 1",
            std::any::type_name::<String>()
        )
    );
}

#[test]
fn id_lookup_with_wrong_type_is_reported() {
    let registry = RegistryBuilder::new()
        .with_module(family_module)
        .build()
        .unwrap();
    let err = registry.get_by_id_as::<String>("child").unwrap_err();
    assert_eq!(err.to_string(), "Incompatible type for serviceId 'child'");
}

struct NamedStrings {
    string1: String,
    string2: String,
}

#[test]
fn explicit_ids_and_introspection() {
    let registry = RegistryBuilder::new()
        .with_module(|binder: &mut ServiceBinder| {
            binder.bind::<NamedStrings, _>(|ctx| {
                Ok(NamedStrings {
                    string1: ctx.get_by_id_as::<String>("string1")?.as_str().to_owned(),
                    string2: ctx.get_by_id_as::<String>("string2")?.as_str().to_owned(),
                })
            });
            binder.bind_instance("hello".to_string()).with_id("string1");
            binder.bind_instance("world".to_string()).with_id("string2");
        })
        .build()
        .unwrap();

    let named = registry.get_by_type::<NamedStrings>().unwrap();
    assert_eq!(named.string1, "hello");
    assert_eq!(named.string2, "world");

    let expected_ids: std::collections::BTreeSet<ServiceId> =
        ["namedStrings", "string1", "string2"]
            .into_iter()
            .map(ServiceId::new)
            .collect();
    assert_eq!(registry.ids(), expected_ids);

    let types = registry.types();
    assert!(types.contains(&ServiceType::of::<String>()));
    assert!(types.contains(&ServiceType::of::<NamedStrings>()));
    assert_eq!(types.len(), 2);

    let strings = registry.get_all_by_type::<String>().unwrap();
    assert_eq!(strings.len(), 2);
    assert_eq!(strings[&ServiceId::new("string1")].as_str(), "hello");
    assert_eq!(strings[&ServiceId::new("string2")].as_str(), "world");
}

#[test]
fn all_by_type_with_zero_matches_is_empty() {
    let registry = RegistryBuilder::new()
        .with_module(family_module)
        .build()
        .unwrap();
    let strings = registry.get_all_by_type::<String>().unwrap();
    assert!(strings.is_empty());
}

#[test]
fn builders_run_at_most_once() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);
    let registry = RegistryBuilder::new()
        .with_module(move |binder: &mut ServiceBinder| {
            let counter = Arc::clone(&counter);
            binder.bind::<String, _>(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("lazy".to_string())
            });
        })
        .build()
        .unwrap();

    assert_eq!(built.load(Ordering::SeqCst), 0);
    let first = registry.get_by_type::<String>().unwrap();
    let second = registry.get_by_type::<String>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[test]
fn duplicate_service_ids_fail_assembly() {
    let err = RegistryBuilder::new()
        .with_module(|binder: &mut ServiceBinder| {
            binder.bind_instance("a".to_string()).with_id("string1");
        })
        .with_module(|binder: &mut ServiceBinder| {
            binder.bind_instance("b".to_string()).with_id("string1");
        })
        .build()
        .unwrap_err();
    assert_eq!(err.to_string(), "Duplicate serviceId 'string1'");
}

#[test]
fn service_ids_compare_case_insensitively() {
    let err = RegistryBuilder::new()
        .with_module(|binder: &mut ServiceBinder| {
            binder.bind_instance("a".to_string()).with_id("String1");
            binder.bind_instance("b".to_string()).with_id("string1");
        })
        .build()
        .unwrap_err();
    assert_eq!(err.to_string(), "Duplicate serviceId 'string1'");

    let registry = RegistryBuilder::new()
        .with_module(|binder: &mut ServiceBinder| {
            binder.bind_instance("hello".to_string()).with_id("MyString");
        })
        .build()
        .unwrap();
    assert_eq!(
        registry.get_by_id_as::<String>("mystring").unwrap().as_str(),
        "hello"
    );
}

#[test]
fn failed_build_is_terminal_for_the_slot() {
    let registry = RegistryBuilder::new()
        .with_module(|binder: &mut ServiceBinder| {
            binder.bind::<String, _>(|_| Err("boom".into())).with_id("bad");
        })
        .build()
        .unwrap();

    let first = registry.get_by_id("bad").unwrap_err();
    assert_eq!(first.to_string(), "Error building service 'bad'");

    let second = registry.get_by_id("bad").unwrap_err();
    assert_eq!(
        second.to_string(),
        "Internal error: Service 'bad' is unavailable after a failed build"
    );
}
