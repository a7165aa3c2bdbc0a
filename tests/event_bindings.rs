mod common;

use common::*;
use exprbind::{Action, BindFlag, Binding, BindingSet, Error, EventBinding, EventHandler, RelayCommand, Value};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn registered_event_trigger_fires_action() {
    let configuration = configuration();
    configuration.configure_named_event_trigger(&VIEW, "Clicked", clicked);
    let view = View::new();
    let (count, action) = counter();

    let binding = EventBinding::new(Value::object(&view), "Clicked", action, BindFlag::empty(), &configuration).unwrap();
    assert_eq!(view.clicked.handler_count(), 1);
    assert_eq!(count.get(), 0);

    view.click().unwrap();
    view.click().unwrap();
    assert_eq!(count.get(), 2);

    binding.dispose();
    binding.dispose();
    assert_eq!(view.clicked.handler_count(), 0);
    view.click().unwrap();
    assert_eq!(count.get(), 2);
}

#[test]
fn unregistered_event_falls_back_to_event_source() {
    let view = View::new();
    let (count, action) = counter();
    let binding =
        EventBinding::new(Value::object(&view), "TextChanged", action, BindFlag::empty(), &configuration()).unwrap();
    view.type_text("a").unwrap();
    assert_eq!(count.get(), 1);
    assert!(binding.is_attached());

    drop(binding);
    assert_eq!(view.text_changed.handler_count(), 0);
}

#[test]
fn unknown_event_is_an_error() {
    let (_, action) = counter();
    let plain = PlainObject::new(0);
    let err = EventBinding::new(Value::object(&plain), "Clicked", action.clone(), BindFlag::empty(), &configuration())
        .err()
        .unwrap();
    assert!(matches!(&err, Error::UnregisteredEvent { event, type_name } if event == "Clicked" && type_name == "PlainObject"));

    let view = View::new();
    let err = EventBinding::new(Value::object(&view), "Scrolled", action, BindFlag::empty(), &configuration())
        .err()
        .unwrap();
    assert!(matches!(err, Error::UnregisteredEvent { .. }));
}

#[test]
fn null_target_and_empty_name_are_rejected() {
    let (_, action) = counter();
    let err = EventBinding::new(Value::Null, "Clicked", action.clone(), BindFlag::empty(), &configuration())
        .err()
        .unwrap();
    assert!(matches!(err, Error::NullArgument("target")));

    let view = View::new();
    let err = EventBinding::new(Value::object(&view), "", action, BindFlag::empty(), &configuration())
        .err()
        .unwrap();
    assert!(matches!(err, Error::NullArgument("event_name")));
}

#[test]
fn one_time_event_disposes_after_first_fire() {
    let configuration = configuration();
    configuration.configure_named_event_trigger(&VIEW, "Clicked", clicked);
    let view = View::new();
    let (count, action) = counter();
    let binding = EventBinding::new(Value::object(&view), "Clicked", action, BindFlag::ONE_TIME, &configuration).unwrap();

    for _ in 0..3 {
        view.click().unwrap();
    }
    assert_eq!(count.get(), 1);
    assert!(binding.is_disposed());
    assert_eq!(view.clicked.handler_count(), 0);
}

static SUBSCRIBED_H0: AtomicUsize = AtomicUsize::new(0);
static SUBSCRIBED_H2: AtomicUsize = AtomicUsize::new(0);

fn register_counting(configuration: &exprbind::Configuration, level: usize, counter: &'static AtomicUsize) {
    configuration.configure_named_trigger::<HierarchyObject, EventHandler<()>, _, _, _>(
        &HIERARCHY[level],
        "Changed",
        |action: Action| -> EventHandler<()> { Rc::new(move |_: &()| action()) },
        move |object: &HierarchyObject, handler: &EventHandler<()>| {
            counter.fetch_add(1, Ordering::SeqCst);
            hierarchy_changed(object).add(handler.clone());
            Ok(())
        },
        |object: &HierarchyObject, handler: &EventHandler<()>| {
            hierarchy_changed(object).remove(handler);
            Ok(())
        },
    );
}

#[test]
fn most_derived_registration_wins() {
    let configuration = configuration();
    register_counting(&configuration, 0, &SUBSCRIBED_H0);
    register_counting(&configuration, 2, &SUBSCRIBED_H2);

    let (count, action) = counter();
    let deepest = HierarchyObject::new(3);
    let _b3 = EventBinding::new(Value::object(&deepest), "Changed", action.clone(), BindFlag::empty(), &configuration)
        .unwrap();
    assert_eq!(SUBSCRIBED_H2.load(Ordering::SeqCst), 1);
    assert_eq!(SUBSCRIBED_H0.load(Ordering::SeqCst), 0);

    let base = HierarchyObject::new(1);
    let _b1 = EventBinding::new(Value::object(&base), "Changed", action, BindFlag::empty(), &configuration).unwrap();
    assert_eq!(SUBSCRIBED_H0.load(Ordering::SeqCst), 1);

    deepest.changed.raise(&()).unwrap();
    base.changed.raise(&()).unwrap();
    assert_eq!(count.get(), 2);
}

#[test]
fn commands_run_only_when_executable() {
    let view = View::new();
    let enabled = Rc::new(Cell::new(false));
    let runs = Rc::new(Cell::new(0));
    let (e, r) = (enabled.clone(), runs.clone());
    let command = RelayCommand::new(move |parameter: &Value| {
        assert!(parameter.is_null());
        r.set(r.get() + 1);
        Ok(())
    })
    .with_can_execute(move |_| e.get());

    let mut set = BindingSet::with_configuration(configuration());
    set.bind_command(Value::object(&view), "Clicked", Rc::new(command)).unwrap();
    view.click().unwrap();
    assert_eq!(runs.get(), 0);
    enabled.set(true);
    view.click().unwrap();
    assert_eq!(runs.get(), 1);

    set.dispose();
    assert_eq!(view.clicked.handler_count(), 0);
}
