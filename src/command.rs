use crate::error::Error;
use crate::types::Value;

/// Executable operation with an availability check, bound to events with
/// [`crate::BindingSet::bind_command`].
pub trait Command {
    fn can_execute(&self, parameter: &Value) -> bool;

    fn execute(&self, parameter: &Value) -> Result<(), Error>;

    /// Executes only when `can_execute` allows it. Returns whether it ran.
    fn try_execute(&self, parameter: &Value) -> Result<bool, Error> {
        if !self.can_execute(parameter) {
            return Ok(false);
        }
        self.execute(parameter)?;
        Ok(true)
    }
}

type ExecuteFn = Box<dyn Fn(&Value) -> Result<(), Error>>;
type CanExecuteFn = Box<dyn Fn(&Value) -> bool>;

/// Closure-backed command.
pub struct RelayCommand {
    execute: ExecuteFn,
    can_execute: Option<CanExecuteFn>,
}

impl RelayCommand {
    pub fn new<F>(execute: F) -> Self
    where
        F: Fn(&Value) -> Result<(), Error> + 'static,
    {
        Self {
            execute: Box::new(execute),
            can_execute: None,
        }
    }

    pub fn with_can_execute<F>(mut self, can_execute: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        self.can_execute = Some(Box::new(can_execute));
        self
    }
}

impl Command for RelayCommand {
    fn can_execute(&self, parameter: &Value) -> bool {
        self.can_execute.as_ref().map(|f| f(parameter)).unwrap_or(true)
    }

    fn execute(&self, parameter: &Value) -> Result<(), Error> {
        (self.execute)(parameter)
    }
}
