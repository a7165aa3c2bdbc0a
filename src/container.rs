//! Ordered set of bindings sharing a configuration and a flag cursor.

use crate::ast::Expr;
use crate::bindings::{self, Binding, EventBinding};
use crate::command::Command;
use crate::config::{default_configuration, Configuration};
use crate::error::Error;
use crate::event::Action;
use crate::flags::BindFlag;
use crate::types::Value;
use std::rc::Rc;
use std::sync::Arc;

/// One item of a binding list.
pub enum Entry {
    /// Changes the flag applied to the entries that follow.
    Flag(BindFlag),
    Expr(Expr),
    Event {
        target: Value,
        event_name: String,
        action: Action,
    },
    Command {
        target: Value,
        event_name: String,
        command: Rc<dyn Command>,
    },
    Custom(Box<dyn Binding>),
}

impl From<BindFlag> for Entry {
    fn from(flag: BindFlag) -> Self {
        Entry::Flag(flag)
    }
}

impl From<Expr> for Entry {
    fn from(expr: Expr) -> Self {
        Entry::Expr(expr)
    }
}

pub struct BindingSet {
    configuration: Arc<Configuration>,
    current_flag: BindFlag,
    bindings: Vec<Box<dyn Binding>>,
}

impl Default for BindingSet {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingSet {
    /// Empty set using the process-wide configuration.
    pub fn new() -> Self {
        Self::with_configuration(default_configuration())
    }

    pub fn with_configuration(configuration: Arc<Configuration>) -> Self {
        Self {
            current_flag: configuration.default_flag(),
            configuration,
            bindings: Vec::new(),
        }
    }

    pub fn from_entries<I, E>(configuration: Arc<Configuration>, entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = E>,
        E: Into<Entry>,
    {
        let mut set = Self::with_configuration(configuration);
        for entry in entries {
            set.add(entry.into())?;
        }
        Ok(set)
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    pub fn current_flag(&self) -> BindFlag {
        self.current_flag
    }

    /// Flag for bindings added from now on. Existing bindings keep theirs.
    pub fn set_flag(&mut self, flag: BindFlag) {
        self.current_flag = flag;
    }

    pub fn add(&mut self, entry: Entry) -> Result<(), Error> {
        match entry {
            Entry::Flag(flag) => {
                self.set_flag(flag);
                Ok(())
            }
            Entry::Expr(expr) => self.bind(&expr),
            Entry::Event { target, event_name, action } => self.bind_event(target, &event_name, action),
            Entry::Command { target, event_name, command } => self.bind_command(target, &event_name, command),
            Entry::Custom(binding) => {
                self.push(binding);
                Ok(())
            }
        }
    }

    /// Binds `left == right` or a method call.
    pub fn bind(&mut self, expr: &Expr) -> Result<(), Error> {
        let index = self.bindings.len();
        let binding = bindings::create(expr, self.current_flag, self.configuration.clone())
            .map_err(|e| e.at_entry(index, Some(expr.to_string())))?;
        self.bindings.push(binding);
        Ok(())
    }

    pub fn bind_event(&mut self, target: Value, event_name: &str, action: Action) -> Result<(), Error> {
        let index = self.bindings.len();
        let binding = EventBinding::new(target, event_name, action, self.current_flag, &self.configuration)
            .map_err(|e| e.at_entry(index, None))?;
        self.bindings.push(Box::new(binding));
        Ok(())
    }

    /// Executes `command` with a null parameter whenever the event fires and
    /// the command allows it.
    pub fn bind_command(&mut self, target: Value, event_name: &str, command: Rc<dyn Command>) -> Result<(), Error> {
        let action: Action = Rc::new(move || command.try_execute(&Value::Null).map(|_| ()));
        self.bind_event(target, event_name, action)
    }

    pub fn push(&mut self, binding: Box<dyn Binding>) {
        self.bindings.push(binding);
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Binding> + '_ {
        self.bindings.iter().map(|b| &**b)
    }

    /// Disposes every binding in order, then clears the set.
    pub fn dispose(&mut self) {
        for binding in &self.bindings {
            binding.dispose();
        }
        self.bindings.clear();
    }
}

impl Drop for BindingSet {
    fn drop(&mut self) {
        self.dispose();
    }
}
