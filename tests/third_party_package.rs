//! End-to-end runs of the third-party-package program and close variants.

use declkit::core::config::RunConfig;
use declkit::core::types::RunState;
use declkit::program::third_party_package;
use declkit::sdk::pkg::{module, Provider, ProviderArgs, Thing, ThingArgs};
use declkit::sdk::Resource;
use declkit::tripwire::eventlog;
use declkit::{Context, Driver, Error, PropertyValue, Result, StringMap};

/// Same declarations, but the third reuses the name "Question".
fn with_duplicate_name(ctx: &mut Context) -> Result<()> {
    Thing::new(ctx, "Other", ThingArgs::default().idea("Support Third Party"))?;
    module::Object::new(ctx, "Question", module::ObjectArgs::default().answer(42.0))?;
    module::Object::new(ctx, "Question", module::ObjectArgs::default().answer(24.0))?;
    Provider::new(
        ctx,
        "Provider",
        ProviderArgs::default().object_prop(StringMap::from([("prop1", "foo")])),
    )?;
    Ok(())
}

#[test]
fn reference_program_succeeds_with_four_descriptors() {
    let mut driver = Driver::new(RunConfig::default());
    let outcome = driver.run(third_party_package);
    assert_eq!(driver.state(), RunState::Succeeded);
    assert_eq!(outcome.exit_code(), 0);

    let registry = outcome.into_result().unwrap();
    assert_eq!(
        registry.names(),
        vec!["Other", "Question", "Question2", "Provider"]
    );

    let other = registry.get("Other").unwrap();
    assert_eq!(
        other.input("idea"),
        Some(&PropertyValue::string("Support Third Party"))
    );
    assert_eq!(
        registry.get("Question").unwrap().input("answer"),
        Some(&PropertyValue::number(42.0).unwrap())
    );
    assert_eq!(
        registry.get("Question2").unwrap().input("answer"),
        Some(&PropertyValue::number(24.0).unwrap())
    );
    let expected_props = PropertyValue::map([
        ("prop3", PropertyValue::string("fizz")),
        ("prop1", PropertyValue::string("foo")),
        ("prop2", PropertyValue::string("bar")),
    ])
    .unwrap();
    assert_eq!(
        registry.get("Provider").unwrap().input("objectProp"),
        Some(&expected_props)
    );
}

#[test]
fn duplicate_name_fails_after_two_registrations() {
    let mut ctx = Context::new(RunConfig::default(), "r-direct");
    let err = with_duplicate_name(&mut ctx).unwrap_err();
    assert_eq!(err, Error::DuplicateName("Question".to_string()));
    assert_eq!(ctx.registry().names(), vec!["Other", "Question"]);
    assert!(!ctx.registry().contains("Provider"));
}

#[test]
fn duplicate_name_run_outcome_is_single_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig::new("third-party-package", "dev").with_state_dir(dir.path());
    let mut driver = Driver::new(config);
    let outcome = driver.run(with_duplicate_name);

    assert_eq!(driver.state(), RunState::Failed);
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(
        outcome.error(),
        Some(&Error::DuplicateName("Question".to_string()))
    );

    let registered = eventlog::read_events(dir.path(), "dev")
        .unwrap()
        .into_iter()
        .filter(|e| {
            matches!(
                e.event,
                declkit::core::types::RunEvent::ResourceRegistered { .. }
            )
        })
        .count();
    assert_eq!(registered, 2);
    assert!(declkit::core::state::load_snapshot(dir.path(), "dev")
        .unwrap()
        .is_none());
}

#[test]
fn rerun_in_fresh_context_is_identical() {
    let first = declkit::run(RunConfig::default(), third_party_package)
        .into_result()
        .unwrap();
    let second = declkit::run(RunConfig::default(), third_party_package)
        .into_result()
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn non_finite_answer_fails_run() {
    let outcome = declkit::run(RunConfig::default(), |ctx| {
        module::Object::new(ctx, "Question", module::ObjectArgs::default().answer(f64::NAN))?;
        Ok(())
    });
    assert!(matches!(
        outcome.error(),
        Some(Error::InvalidArgument { field, .. }) if field == "answer"
    ));
}

#[test]
fn handles_expose_typed_inputs() {
    let mut ctx = Context::new(RunConfig::default(), "r-handles");
    let thing = Thing::new(&mut ctx, "Other", ThingArgs::default().idea("x")).unwrap();
    let object =
        module::Object::new(&mut ctx, "Question", module::ObjectArgs::default().answer(42.0))
            .unwrap();
    assert_eq!(thing.name(), "Other");
    assert_eq!(object.answer(), Some(42.0));
    assert_eq!(ctx.registry().get("Question"), Some(object.descriptor()));
}
