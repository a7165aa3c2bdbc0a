use super::Binding;
use crate::config::Configuration;
use crate::error::Error;
use crate::event::{Action, Handler};
use crate::flags::BindFlag;
use crate::runtime::Target;
use crate::triggers::TriggerDelegate;
use crate::types::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, warn};

struct State {
    event_name: String,
    delegate: Option<TriggerDelegate>,
    target: RefCell<Option<Value>>,
    handler: RefCell<Option<Handler>>,
    disposed: Cell<bool>,
}

impl State {
    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        let (Some(target), Some(handler)) = (self.target.take(), self.handler.take()) else {
            return;
        };
        match &self.delegate {
            Some(delegate) => {
                if let Err(e) = delegate.unsubscribe(&Target::Instance(target.clone()), &handler) {
                    warn!("failed to remove [{}] handler from {}: {e}", self.event_name, target.type_name());
                }
            }
            None => {
                let removed = target
                    .as_object()
                    .and_then(|o| o.event(&self.event_name))
                    .map(|source| source.remove_universal(&handler))
                    .unwrap_or(false);
                if !removed {
                    warn!("[{}] handler was not attached to {}", self.event_name, target.type_name());
                }
            }
        }
        debug!("Removed handler [{}] for {}", self.event_name, target.type_name());
    }
}

/// Named event of a target object bound to an action.
pub struct EventBinding {
    state: Rc<State>,
}

impl EventBinding {
    pub fn new(
        target: Value,
        event_name: &str,
        action: Action,
        flags: BindFlag,
        configuration: &Configuration,
    ) -> Result<Self, Error> {
        if target.is_null() {
            return Err(Error::NullArgument("target"));
        }
        if event_name.is_empty() {
            return Err(Error::NullArgument("event_name"));
        }
        let target_type = target.runtime_type().ok_or(Error::NullArgument("target"))?;
        let delegate = configuration
            .event_triggers()
            .find_trigger_delegate(event_name, &target_type);

        let state = Rc::new(State {
            event_name: event_name.to_string(),
            delegate,
            target: RefCell::new(Some(target.clone())),
            handler: RefCell::new(None),
            disposed: Cell::new(false),
        });

        let action = if flags.is_one_time() {
            let weak = Rc::downgrade(&state);
            let once: Action = Rc::new(move || {
                action()?;
                if let Some(state) = weak.upgrade() {
                    state.dispose();
                }
                Ok(())
            });
            once
        } else {
            action
        };

        let handler = match &state.delegate {
            Some(delegate) => {
                let handler = delegate.create_handler(action);
                delegate.subscribe(&Target::Instance(target.clone()), &handler)?;
                handler
            }
            None => {
                let source = target
                    .as_object()
                    .and_then(|o| o.event(event_name))
                    .ok_or_else(|| Error::UnregisteredEvent {
                        event: event_name.to_string(),
                        type_name: target_type.name().to_string(),
                    })?;
                let handler = source.add_universal(action);
                warn!(
                    "Used a universal handler for [{}.{}]; configure an event trigger for it",
                    target_type.name(),
                    event_name
                );
                handler
            }
        };
        state.handler.replace(Some(handler));
        debug!("Added [{}] handler for {}", event_name, target_type.name());
        Ok(Self { state })
    }

    pub fn event_name(&self) -> &str {
        &self.state.event_name
    }

    /// Whether the handler is still attached to the target.
    pub fn is_attached(&self) -> bool {
        self.state.handler.borrow().is_some()
    }
}

impl Binding for EventBinding {
    fn dispose(&self) {
        self.state.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.state.disposed.get()
    }
}

impl Drop for EventBinding {
    fn drop(&mut self) {
        self.state.dispose();
    }
}
