use wirebox::{RegistryBuilder, ServiceBinder};

fn base_module(binder: &mut ServiceBinder) {
    binder.bind_instance("foo".to_string()).with_id("string1");
}

fn override_module(binder: &mut ServiceBinder) {
    binder
        .override_instance("foo-override".to_string())
        .with_id("string1");
}

#[test]
fn override_replaces_the_builder() {
    let registry = RegistryBuilder::new()
        .with_module(base_module)
        .with_module(override_module)
        .build()
        .unwrap();
    assert_eq!(
        registry.get_by_id_as::<String>("string1").unwrap().as_str(),
        "foo-override"
    );
}

#[test]
fn override_without_a_binding_fails_assembly() {
    let err = RegistryBuilder::new()
        .with_module(override_module)
        .build()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Attempted to override unknown serviceId 'string1'"
    );
}

#[test]
fn second_override_for_one_id_fails_assembly() {
    let err = RegistryBuilder::new()
        .with_module(base_module)
        .with_module(override_module)
        .with_module(override_module)
        .build()
        .unwrap_err();
    assert_eq!(err.to_string(), "Duplicate override for serviceId 'string1'");
}

#[test]
fn override_must_match_the_declared_type() {
    let err = RegistryBuilder::new()
        .with_module(|binder: &mut ServiceBinder| {
            binder.bind_instance(42_u32).with_id("answer");
        })
        .with_module(|binder: &mut ServiceBinder| {
            binder.override_instance("nope".to_string()).with_id("answer");
        })
        .build()
        .unwrap_err();
    let message = err.to_string();
    assert!(
        message.starts_with("Override for serviceId 'answer'"),
        "unexpected message: {message}"
    );
}

#[test]
fn decorators_apply_over_the_overriding_builder() {
    let registry = RegistryBuilder::new()
        .with_module(|binder: &mut ServiceBinder| {
            binder.bind_instance("original".to_string()).with_id("string1");
            binder.decorate::<String, _, _>("string1", "d1", |_, value| Ok(format!("[{value}]")));
        })
        .with_module(override_module)
        .build()
        .unwrap();
    assert_eq!(
        registry.get_by_id_as::<String>("string1").unwrap().as_str(),
        "[foo-override]"
    );
}

#[test]
fn override_builder_can_resolve_other_services() {
    let registry = RegistryBuilder::new()
        .with_module(|binder: &mut ServiceBinder| {
            binder.bind_instance("base".to_string()).with_id("string1");
            binder.bind_instance("suffix".to_string()).with_id("string2");
        })
        .with_module(|binder: &mut ServiceBinder| {
            binder
                .override_with::<String, _>(|ctx| {
                    let suffix = ctx.get_by_id_as::<String>("string2")?;
                    Ok(format!("overridden-{suffix}"))
                })
                .with_id("string1");
        })
        .build()
        .unwrap();
    assert_eq!(
        registry.get_by_id_as::<String>("string1").unwrap().as_str(),
        "overridden-suffix"
    );
}
