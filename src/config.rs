//! Binding configuration: default flag, dispatchers and trigger registrations.

use crate::error::Error;
use crate::event::{Action, Event};
use crate::flags::BindFlag;
use crate::reflect::{MemberRef, Object, TypeRef};
use crate::runtime::Target;
use crate::triggers::{CustomSetter, EventTriggerSetup, MemberTriggerSetup, SetterContainer, TriggerDelegate};
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Deferred unit of work handed to a dispatcher.
pub type Job = Box<dyn FnOnce() -> Result<(), Error>>;

/// Runs (or schedules) a job, typically on the host's UI loop.
pub type Dispatcher = Arc<dyn Fn(Job) -> Result<(), Error> + Send + Sync>;

/// Serializable part of a [`Configuration`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigurationSettings {
    pub default_flag: BindFlag,
}

pub struct Configuration {
    default_flag: BindFlag,
    action_dispatcher: Option<Dispatcher>,
    assignment_dispatcher: Option<Dispatcher>,
    member_triggers: MemberTriggerSetup,
    event_triggers: EventTriggerSetup,
    setters: SetterContainer,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self::from_settings(ConfigurationSettings::default())
    }

    pub fn from_settings(settings: ConfigurationSettings) -> Self {
        Self {
            default_flag: settings.default_flag,
            action_dispatcher: None,
            assignment_dispatcher: None,
            member_triggers: MemberTriggerSetup::new(),
            event_triggers: EventTriggerSetup::new(),
            setters: SetterContainer::new(),
        }
    }

    /// Reads settings such as `{"default_flag": "TWO_WAY"}`.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let settings: ConfigurationSettings =
            serde_json::from_str(json).map_err(|e| Error::InvalidSettings(e.to_string()))?;
        Ok(Self::from_settings(settings))
    }

    pub fn settings(&self) -> ConfigurationSettings {
        ConfigurationSettings { default_flag: self.default_flag }
    }

    pub fn with_default_flag(mut self, flag: BindFlag) -> Self {
        self.default_flag = flag;
        self
    }

    /// Wraps every action invocation of action bindings.
    pub fn with_action_dispatcher<F>(mut self, dispatcher: F) -> Self
    where
        F: Fn(Job) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.action_dispatcher = Some(Arc::new(dispatcher));
        self
    }

    /// Wraps every write performed by equality bindings.
    pub fn with_assignment_dispatcher<F>(mut self, dispatcher: F) -> Self
    where
        F: Fn(Job) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.assignment_dispatcher = Some(Arc::new(dispatcher));
        self
    }

    pub fn default_flag(&self) -> BindFlag {
        self.default_flag
    }

    pub fn member_triggers(&self) -> &MemberTriggerSetup {
        &self.member_triggers
    }

    pub fn event_triggers(&self) -> &EventTriggerSetup {
        &self.event_triggers
    }

    pub fn setters(&self) -> &SetterContainer {
        &self.setters
    }

    /// Member of `T` whose changes are signalled through a handler of type `H`.
    pub fn configure_trigger<T, H, C, S, U>(&self, member: &MemberRef, trigger_to_handler: C, subscribe: S, unsubscribe: U)
    where
        T: Object,
        H: 'static,
        C: Fn(Action) -> H + Send + Sync + 'static,
        S: Fn(&T, &H) -> Result<(), Error> + Send + Sync + 'static,
        U: Fn(&T, &H) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.member_triggers
            .add_trigger(member, TriggerDelegate::typed::<T, H, _, _, _>(trigger_to_handler, subscribe, unsubscribe));
    }

    /// Same as [`Configuration::configure_trigger`], also overriding how the
    /// member is written.
    pub fn configure_trigger_with_setter<T, H, C, S, U, W>(
        &self,
        member: &MemberRef,
        trigger_to_handler: C,
        subscribe: S,
        unsubscribe: U,
        setter: W,
    ) where
        T: Object,
        H: 'static,
        C: Fn(Action) -> H + Send + Sync + 'static,
        S: Fn(&T, &H) -> Result<(), Error> + Send + Sync + 'static,
        U: Fn(&T, &H) -> Result<(), Error> + Send + Sync + 'static,
        W: Fn(&T, Value) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.configure_trigger::<T, H, _, _, _>(member, trigger_to_handler, subscribe, unsubscribe);
        let custom: CustomSetter = Arc::new(move |target: &Target, value: Value| -> Result<(), Error> {
            match target {
                Target::Instance(v) => setter(v.downcast_ref::<T>()?, value),
                Target::Type(t) => Err(Error::TypeMismatch(format!("[{}] is not an instance", t.name()))),
            }
        });
        self.setters.add_setter(member, custom);
    }

    /// Member of `T` whose changes are signalled by one of its events.
    pub fn configure_event_trigger<T: Object, A: 'static>(&self, member: &MemberRef, event_of: fn(&T) -> &Event<A>) {
        self.member_triggers.add_trigger(member, TriggerDelegate::event(event_of));
    }

    /// Named event of `ty` (and its subtypes) available to event bindings.
    pub fn configure_named_trigger<T, H, C, S, U>(
        &self,
        ty: &TypeRef,
        event_name: &str,
        trigger_to_handler: C,
        subscribe: S,
        unsubscribe: U,
    ) where
        T: Object,
        H: 'static,
        C: Fn(Action) -> H + Send + Sync + 'static,
        S: Fn(&T, &H) -> Result<(), Error> + Send + Sync + 'static,
        U: Fn(&T, &H) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.event_triggers.add_trigger(
            ty,
            event_name,
            TriggerDelegate::typed::<T, H, _, _, _>(trigger_to_handler, subscribe, unsubscribe),
        );
    }

    pub fn configure_named_event_trigger<T: Object, A: 'static>(
        &self,
        ty: &TypeRef,
        event_name: &str,
        event_of: fn(&T) -> &Event<A>,
    ) {
        self.event_triggers.add_trigger(ty, event_name, TriggerDelegate::event(event_of));
    }

    pub fn add_member_trigger(&self, member: &MemberRef, delegate: TriggerDelegate) {
        self.member_triggers.add_trigger(member, delegate);
    }

    pub fn add_event_trigger(&self, ty: &TypeRef, event_name: &str, delegate: TriggerDelegate) {
        self.event_triggers.add_trigger(ty, event_name, delegate);
    }

    pub fn add_setter(&self, member: &MemberRef, setter: CustomSetter) {
        self.setters.add_setter(member, setter);
    }

    pub(crate) fn dispatch_action(&self, job: Job) -> Result<(), Error> {
        match &self.action_dispatcher {
            Some(dispatch) => dispatch(job),
            None => job(),
        }
    }

    pub(crate) fn dispatch_assignment(&self, job: Job) -> Result<(), Error> {
        match &self.assignment_dispatcher {
            Some(dispatch) => dispatch(job),
            None => job(),
        }
    }
}

lazy_static::lazy_static! {
    static ref DEFAULT_CONFIGURATION: Arc<Configuration> = Arc::new(Configuration::new());
}

/// Process-wide configuration used when none is given explicitly.
pub fn default_configuration() -> Arc<Configuration> {
    DEFAULT_CONFIGURATION.clone()
}
