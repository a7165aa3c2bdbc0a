//! Change-notification plumbing: how to subscribe to "this member changed"
//! for a given member or event, and the live subscriptions bindings own.

mod collector;
mod event_setup;
mod member_setup;
mod setters;

pub use collector::TriggerCollector;
pub use event_setup::EventTriggerSetup;
pub use member_setup::MemberTriggerSetup;
pub use setters::{CustomSetter, SetterContainer};

use crate::error::Error;
use crate::event::{Action, Event, EventHandler, Handler, PropertyChangedArgs};
use crate::reflect::Object;
use crate::runtime::Target;
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

type HandlerFactory = Arc<dyn Fn(Action) -> Handler + Send + Sync>;
type SubscribeFn = Arc<dyn Fn(&Target, &Handler) -> Result<(), Error> + Send + Sync>;

/// Recipe for turning an action into a handler and attaching it to a target.
#[derive(Clone)]
pub struct TriggerDelegate {
    create_handler: HandlerFactory,
    subscribe: SubscribeFn,
    unsubscribe: SubscribeFn,
}

fn target_object<T: Object>(target: &Target) -> Result<&T, Error> {
    match target {
        Target::Instance(v) => v.downcast_ref::<T>(),
        Target::Type(t) => Err(Error::TypeMismatch(format!(
            "type [{}] cannot be used as a trigger target",
            t.name()
        ))),
    }
}

fn handler_of<H: 'static>(handler: &Handler) -> Result<&H, Error> {
    handler
        .downcast_ref::<H>()
        .ok_or_else(|| Error::TypeMismatch("handler was created by a different trigger".to_string()))
}

impl TriggerDelegate {
    pub fn new<C, S, U>(create_handler: C, subscribe: S, unsubscribe: U) -> Self
    where
        C: Fn(Action) -> Handler + Send + Sync + 'static,
        S: Fn(&Target, &Handler) -> Result<(), Error> + Send + Sync + 'static,
        U: Fn(&Target, &Handler) -> Result<(), Error> + Send + Sync + 'static,
    {
        Self {
            create_handler: Arc::new(create_handler),
            subscribe: Arc::new(subscribe),
            unsubscribe: Arc::new(unsubscribe),
        }
    }

    /// Delegate over a concrete target type `T` and handler type `H`.
    pub fn typed<T, H, C, S, U>(trigger_to_handler: C, subscribe: S, unsubscribe: U) -> Self
    where
        T: Object,
        H: 'static,
        C: Fn(Action) -> H + Send + Sync + 'static,
        S: Fn(&T, &H) -> Result<(), Error> + Send + Sync + 'static,
        U: Fn(&T, &H) -> Result<(), Error> + Send + Sync + 'static,
    {
        Self::new(
            move |action: Action| -> Handler { Rc::new(trigger_to_handler(action)) },
            move |target: &Target, handler: &Handler| subscribe(target_object::<T>(target)?, handler_of::<H>(handler)?),
            move |target: &Target, handler: &Handler| unsubscribe(target_object::<T>(target)?, handler_of::<H>(handler)?),
        )
    }

    /// Change signalled by an [`Event`] of the target; event arguments are ignored.
    pub fn event<T: Object, A: 'static>(event_of: fn(&T) -> &Event<A>) -> Self {
        Self::typed::<T, EventHandler<A>, _, _, _>(
            |action: Action| -> EventHandler<A> { Rc::new(move |_: &A| action()) },
            move |target: &T, handler: &EventHandler<A>| {
                event_of(target).add(handler.clone());
                Ok(())
            },
            move |target: &T, handler: &EventHandler<A>| {
                event_of(target).remove(handler);
                Ok(())
            },
        )
    }

    /// Standard property change notification filtered by property name.
    pub fn property_changed(property_name: &str) -> Self {
        let name = property_name.to_string();
        Self::new(
            move |action: Action| -> Handler {
                let name = name.clone();
                let handler: EventHandler<PropertyChangedArgs> = Rc::new(move |args: &PropertyChangedArgs| {
                    if args.property_name() == name {
                        action()
                    } else {
                        Ok(())
                    }
                });
                Rc::new(handler)
            },
            |target: &Target, handler: &Handler| {
                notifier(target)?.add(handler_of::<EventHandler<PropertyChangedArgs>>(handler)?.clone());
                Ok(())
            },
            |target: &Target, handler: &Handler| {
                notifier(target)?.remove(handler_of::<EventHandler<PropertyChangedArgs>>(handler)?);
                Ok(())
            },
        )
    }

    pub fn create_handler(&self, action: Action) -> Handler {
        (self.create_handler)(action)
    }

    pub fn subscribe(&self, target: &Target, handler: &Handler) -> Result<(), Error> {
        (self.subscribe)(target, handler)
    }

    pub fn unsubscribe(&self, target: &Target, handler: &Handler) -> Result<(), Error> {
        (self.unsubscribe)(target, handler)
    }
}

fn notifier(target: &Target) -> Result<&crate::PropertyChangedEvent, Error> {
    target
        .instance()
        .and_then(|v| v.as_object())
        .and_then(|o| o.property_changed())
        .ok_or_else(|| {
            Error::TypeMismatch(format!(
                "[{}] does not raise property change notifications",
                target.type_name()
            ))
        })
}

/// A live (or not yet live) subscription of one binding to one change source.
pub struct Trigger {
    target: Target,
    delegate: TriggerDelegate,
    label: String,
    handler: Option<Handler>,
}

impl Trigger {
    pub fn new<L: Into<String>>(target: Target, delegate: TriggerDelegate, label: L) -> Self {
        Self {
            target,
            delegate,
            label: label.into(),
            handler: None,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_subscribed(&self) -> bool {
        self.handler.is_some()
    }

    pub fn subscribe(&mut self, action: Action) -> Result<(), Error> {
        self.unsubscribe()?;
        let handler = self.delegate.create_handler(action);
        self.delegate.subscribe(&self.target, &handler)?;
        debug!(trigger = %self.label, target = %self.target.type_name(), "subscribed");
        self.handler = Some(handler);
        Ok(())
    }

    /// No-op when not subscribed.
    pub fn unsubscribe(&mut self) -> Result<(), Error> {
        if let Some(handler) = self.handler.take() {
            self.delegate.unsubscribe(&self.target, &handler)?;
            debug!(trigger = %self.label, target = %self.target.type_name(), "unsubscribed");
        }
        Ok(())
    }
}
