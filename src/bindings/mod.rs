//! Binding kinds and their shared plumbing.

mod action;
mod equality;
mod event;

pub use action::ActionBinding;
pub use equality::EqualityBinding;
pub use event::EventBinding;

use crate::ast::{BinaryOp, Expr};
use crate::config::Configuration;
use crate::error::Error;
use crate::event::Action;
use crate::flags::BindFlag;
use crate::runtime::{eval, ExpressionInterpreter, Getter};
use crate::triggers::Trigger;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, warn};

/// A live binding. Dropping it has the same effect as [`Binding::dispose`].
pub trait Binding {
    /// Releases every subscription. Calling it again does nothing.
    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}

/// Builds the binding matching the shape of `expr`: `left == right` or a method call.
pub fn create(expr: &Expr, flags: BindFlag, configuration: Arc<Configuration>) -> Result<Box<dyn Binding>, Error> {
    match expr {
        Expr::Binary { op: BinaryOp::Equal, left, right, .. } => {
            Ok(Box::new(EqualityBinding::new(left, right, flags, configuration)?))
        }
        Expr::Call(call) => Ok(Box::new(ActionBinding::new(call, flags, configuration)?)),
        other => Err(Error::unsupported(other, "only equality and method call expressions can be bound")),
    }
}

pub(crate) fn getter_or_fallback(interpreter: &mut ExpressionInterpreter, expr: &Expr) -> Result<Getter, Error> {
    if let Some(getter) = interpreter.try_build_getter(expr)? {
        return Ok(getter);
    }
    debug!(expr = %expr, "using the expression evaluator");
    let expr = expr.clone();
    Ok(Rc::new(move || eval(&expr)))
}

pub(crate) fn subscribe_all(triggers: &mut [Trigger], action: &Action) -> Result<(), Error> {
    for trigger in triggers.iter_mut() {
        trigger.subscribe(action.clone())?;
    }
    Ok(())
}

pub(crate) fn unsubscribe_all(triggers: &mut [Trigger]) {
    for trigger in triggers.iter_mut() {
        if let Err(e) = trigger.unsubscribe() {
            warn!(trigger = %trigger.label(), "failed to unsubscribe: {e}");
        }
    }
}
