use super::{subscribe_all, unsubscribe_all, Binding};
use crate::ast::{CallExpr, Expr};
use crate::config::Configuration;
use crate::error::Error;
use crate::event::Action;
use crate::flags::BindFlag;
use crate::runtime::{eval, ExpressionInterpreter};
use crate::triggers::{Trigger, TriggerCollector};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, warn};

struct State {
    configuration: Arc<Configuration>,
    triggers: RefCell<Vec<Trigger>>,
    disposed: Cell<bool>,
}

impl State {
    fn perform(&self, action: &Action) -> Result<(), Error> {
        let action = action.clone();
        self.configuration.dispatch_action(Box::new(move || action()))
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        unsubscribe_all(&mut self.triggers.borrow_mut());
    }
}

/// Method call re-invoked whenever one of its inputs changes.
pub struct ActionBinding {
    state: Rc<State>,
}

impl ActionBinding {
    pub fn new(call: &CallExpr, flags: BindFlag, configuration: Arc<Configuration>) -> Result<Self, Error> {
        let expr = Expr::Call(call.clone());
        let binding = Self {
            state: Rc::new(State {
                configuration: configuration.clone(),
                triggers: RefCell::new(Vec::new()),
                disposed: Cell::new(false),
            }),
        };
        let state = &binding.state;
        let mut interpreter = ExpressionInterpreter::new();

        let action = match interpreter.try_build_method_delegate(call)? {
            Some(action) => action,
            None => {
                debug!(expr = %expr, "using the expression evaluator");
                let fallback = expr.clone();
                let action: Action = Rc::new(move || eval(&fallback).map(|_| ()));
                action
            }
        };

        if flags.has_initial_trigger() {
            state.perform(&action)?;
            if flags.is_one_time() {
                state.disposed.set(true);
                return Ok(binding);
            }
        }

        let mut triggers = TriggerCollector::new(&mut interpreter, configuration.member_triggers()).parse(&expr)?;
        if triggers.is_empty() {
            warn!("Could not find any triggering members for binding from expression [{expr}]");
        }
        let weak = Rc::downgrade(state);
        let on_change: Action = Rc::new(move || {
            let Some(state) = weak.upgrade() else {
                return Ok(());
            };
            if state.disposed.get() {
                return Ok(());
            }
            state.perform(&action)?;
            if flags.is_one_time() {
                state.dispose();
            }
            Ok(())
        });
        subscribe_all(&mut triggers, &on_change)?;
        state.triggers.replace(triggers);
        Ok(binding)
    }

    pub fn subscription_count(&self) -> usize {
        self.state.triggers.borrow().iter().filter(|t| t.is_subscribed()).count()
    }
}

impl Binding for ActionBinding {
    fn dispose(&self) {
        self.state.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.state.disposed.get()
    }
}

impl Drop for ActionBinding {
    fn drop(&mut self) {
        self.state.dispose();
    }
}
