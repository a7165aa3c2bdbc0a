//! Declarative data bindings driven by expression trees.
//!
//! An expression `left == right` keeps `left` equal to `right` (and optionally
//! the other way round), a method call is re-invoked whenever one of its
//! inputs changes, and named events can be bound to actions or commands.
//! Change notifications are discovered by walking the expression tree and
//! matching member accesses against the trigger registrations of a
//! [`Configuration`].

pub mod ast;
pub mod bindings;
pub mod command;
pub mod config;
pub mod container;
pub mod error;
pub mod event;
pub mod flags;
pub mod reflect;
pub mod runtime;
pub mod triggers;
pub mod types;

pub use ast::{BinaryOp, CallExpr, Expr, MemberExpr, UnaryOp};
pub use bindings::{ActionBinding, Binding, EqualityBinding, EventBinding};
pub use command::{Command, RelayCommand};
pub use config::{default_configuration, Configuration, ConfigurationSettings, Dispatcher, Job};
pub use container::{BindingSet, Entry};
pub use error::Error;
pub use event::{Action, Event, EventHandler, EventSource, Handler, PropertyChangedArgs, PropertyChangedEvent};
pub use flags::BindFlag;
pub use reflect::{
    builtin, MemberDef, MemberInfo, MemberKind, MemberRef, MethodDef, MethodInfo, MethodRef, Object, ObjectRef, TypeInfo,
    TypeKind, TypeRef,
};
pub use triggers::{Trigger, TriggerDelegate};
pub use types::{StructValue, Value};

use std::sync::Arc;

/// Binds `expr` with the process-wide configuration and its default flag.
pub fn bind(expr: &Expr) -> Result<Box<dyn Binding>, Error> {
    let configuration = default_configuration();
    let flags = configuration.default_flag();
    bindings::create(expr, flags, configuration)
}

/// Binds `expr` with an explicit flag and configuration.
pub fn bind_with(expr: &Expr, flags: BindFlag, configuration: &Arc<Configuration>) -> Result<Box<dyn Binding>, Error> {
    bindings::create(expr, flags, configuration.clone())
}

/// Evaluates `expr` once, without caching anything.
pub fn evaluate(expr: &Expr) -> Result<Value, Error> {
    runtime::eval(expr)
}
