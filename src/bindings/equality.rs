use super::{getter_or_fallback, subscribe_all, unsubscribe_all, Binding};
use crate::ast::Expr;
use crate::config::Configuration;
use crate::error::Error;
use crate::event::Action;
use crate::flags::BindFlag;
use crate::runtime::{ExpressionInterpreter, Getter, Setter};
use crate::triggers::{Trigger, TriggerCollector};
use crate::types::Value;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use tracing::warn;

struct State {
    configuration: Arc<Configuration>,
    flags: BindFlag,
    /// Last value written in either direction.
    value: RefCell<Value>,
    left_triggers: RefCell<Vec<Trigger>>,
    right_triggers: RefCell<Vec<Trigger>>,
    disposed: Cell<bool>,
}

impl State {
    fn set_value(&self, setter: &Setter, value: Value) -> Result<(), Error> {
        let setter = setter.clone();
        self.configuration
            .dispatch_assignment(Box::new(move || setter(value)))?;
        if self.flags.is_one_time() {
            self.dispose();
        }
        Ok(())
    }

    fn on_side_changed(&self, getter: &Getter, setter: &Setter) -> Result<(), Error> {
        if self.disposed.get() {
            return Ok(());
        }
        let value = getter()?;
        if *self.value.borrow() == value {
            return Ok(());
        }
        self.value.replace(value.clone());
        self.set_value(setter, value)
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        unsubscribe_all(&mut self.left_triggers.borrow_mut());
        unsubscribe_all(&mut self.right_triggers.borrow_mut());
    }
}

fn side_changed(state: &Rc<State>, getter: Getter, setter: Setter) -> Action {
    let state: Weak<State> = Rc::downgrade(state);
    Rc::new(move || match state.upgrade() {
        Some(state) => state.on_side_changed(&getter, &setter),
        None => Ok(()),
    })
}

/// `left == right`: keeps the left side equal to the right side, and the
/// other way round with [`BindFlag::TWO_WAY`].
pub struct EqualityBinding {
    state: Rc<State>,
}

impl EqualityBinding {
    pub fn new(left: &Expr, right: &Expr, flags: BindFlag, configuration: Arc<Configuration>) -> Result<Self, Error> {
        let source = format!("{left} == {right}");
        let is_constant_or_call = |e: &Expr| e.is_constant() || e.as_call().is_some();
        if (left.is_constant() && is_constant_or_call(right)) || (right.is_constant() && is_constant_or_call(left)) {
            return Err(Error::ConstantBinding(source));
        }

        let state = Rc::new(State {
            configuration: configuration.clone(),
            flags,
            value: RefCell::new(Value::Null),
            left_triggers: RefCell::new(Vec::new()),
            right_triggers: RefCell::new(Vec::new()),
            disposed: Cell::new(false),
        });
        let binding = Self { state };
        let state = &binding.state;
        let mut interpreter = ExpressionInterpreter::new();
        let setters = configuration.setters();

        let left_setter = interpreter.try_build_setter(left, Some(setters))?;
        match &left_setter {
            None => warn!("Value setting to the LEFT side of expression [{source}] is DISABLED: no assignable target member found"),
            Some(left_setter) => {
                let right_getter = getter_or_fallback(&mut interpreter, right)?;
                let initial = right_getter()?;
                state.value.replace(initial.clone());
                if flags.has_initial_trigger() {
                    state.set_value(left_setter, initial)?;
                    if flags.is_one_time() {
                        return Ok(binding);
                    }
                }
                let mut triggers = TriggerCollector::new(&mut interpreter, configuration.member_triggers()).parse(right)?;
                subscribe_all(&mut triggers, &side_changed(state, right_getter, left_setter.clone()))?;
                state.right_triggers.replace(triggers);
            }
        }

        if flags.is_two_way() {
            match interpreter.try_build_setter(right, Some(setters))? {
                None => warn!("Value setting to the RIGHT side of expression [{source}] is DISABLED: no assignable target member found"),
                Some(right_setter) => {
                    let left_getter = getter_or_fallback(&mut interpreter, left)?;
                    if left_setter.is_none() {
                        let initial = left_getter()?;
                        state.value.replace(initial.clone());
                        if flags.has_initial_trigger() {
                            state.set_value(&right_setter, initial)?;
                            if flags.is_one_time() {
                                return Ok(binding);
                            }
                        }
                    }
                    let mut triggers = TriggerCollector::new(&mut interpreter, configuration.member_triggers()).parse(left)?;
                    subscribe_all(&mut triggers, &side_changed(state, left_getter, right_setter))?;
                    state.left_triggers.replace(triggers);
                }
            }
        }

        if state.left_triggers.borrow().is_empty() && state.right_triggers.borrow().is_empty() {
            warn!("Could not find any triggering members for binding from expression [{source}]");
        }
        Ok(binding)
    }

    /// Last value propagated by this binding.
    pub fn value(&self) -> Value {
        self.state.value.borrow().clone()
    }

    /// Number of currently subscribed triggers on both sides.
    pub fn subscription_count(&self) -> usize {
        let count = |triggers: &RefCell<Vec<Trigger>>| triggers.borrow().iter().filter(|t| t.is_subscribed()).count();
        count(&self.state.left_triggers) + count(&self.state.right_triggers)
    }
}

impl Binding for EqualityBinding {
    fn dispose(&self) {
        self.state.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.state.disposed.get()
    }
}

impl Drop for EqualityBinding {
    fn drop(&mut self) {
        self.state.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{builtin, MethodDef, TypeInfo};
    use crate::types::StructValue;

    #[test]
    fn constant_pairs_are_rejected() {
        let ty = TypeInfo::class("Clock")
            .method(MethodDef::function("Now", &builtin::INT, |_| Ok(Value::Integer(0))).param("tz", &builtin::INT))
            .build();
        let call = Expr::static_call(&ty, "Now", vec![Expr::constant(1)]).unwrap();
        let config = Arc::new(Configuration::new());

        let err = EqualityBinding::new(&Expr::constant(1), &call, BindFlag::empty(), config.clone()).err().unwrap();
        assert!(matches!(err, Error::ConstantBinding(_)));
        let err = EqualityBinding::new(&Expr::constant(1), &Expr::constant(2), BindFlag::empty(), config).err().unwrap();
        assert!(matches!(err, Error::ConstantBinding(_)));
    }

    #[test]
    fn struct_target_receives_initial_value() {
        let point = TypeInfo::structure("Point").struct_field("X", &builtin::INT).build();
        let x = Expr::var("p", StructValue::new(&point)).member("X").unwrap();
        let binding =
            EqualityBinding::new(&x, &Expr::constant(3), BindFlag::empty(), Arc::new(Configuration::new())).unwrap();
        assert_eq!(binding.value(), Value::Integer(3));
        assert_eq!(binding.subscription_count(), 0);
        binding.dispose();
        assert!(binding.is_disposed());
    }
}
