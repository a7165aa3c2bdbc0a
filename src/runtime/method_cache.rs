//! Cache of call-ready method delegates.
//!
//! A delegate is specialised by total arity, by whether the method returns a
//! value and by whether the receiver is a value type (passed by reference so
//! the method can mutate it in place). Delegates are created lazily and shared
//! process-wide, keyed by (method, concrete receiver type).

use crate::error::Error;
use crate::reflect::{MethodBody, MethodInfo, MethodRef, TypeRef};
use crate::types::Value;
use dashmap::DashMap;
use std::sync::Arc;

/// Largest total argument count (receiver included) a delegate supports.
pub const MAX_ARITY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegateKind {
    Action(usize),
    Function(usize),
    ValueInstanceAction(usize),
    ValueInstanceFunction(usize),
}

impl DelegateKind {
    fn of(method: &MethodInfo) -> Self {
        let arity = method.total_arity();
        match (method.returns_void(), method.has_value_receiver()) {
            (true, false) => DelegateKind::Action(arity),
            (false, false) => DelegateKind::Function(arity),
            (true, true) => DelegateKind::ValueInstanceAction(arity),
            (false, true) => DelegateKind::ValueInstanceFunction(arity),
        }
    }

    pub fn arity(self) -> usize {
        match self {
            DelegateKind::Action(n)
            | DelegateKind::Function(n)
            | DelegateKind::ValueInstanceAction(n)
            | DelegateKind::ValueInstanceFunction(n) => n,
        }
    }

    pub fn returns_value(self) -> bool {
        matches!(self, DelegateKind::Function(_) | DelegateKind::ValueInstanceFunction(_))
    }
}

pub struct MethodDelegate {
    method: MethodRef,
    kind: DelegateKind,
}

impl MethodDelegate {
    fn create(method: MethodRef) -> Result<Self, Error> {
        if !is_supported(&method) {
            return Err(Error::UnsupportedMethod(method.qualified_name()));
        }
        let kind = DelegateKind::of(&method);
        Ok(Self { method, kind })
    }

    pub fn method(&self) -> &MethodRef {
        &self.method
    }

    pub fn kind(&self) -> DelegateKind {
        self.kind
    }

    /// Calls the method with `args[0]` as receiver for instance methods.
    /// A value-type receiver is updated in place.
    pub fn invoke(&self, args: &mut [Value]) -> Result<Option<Value>, Error> {
        if args.len() != self.kind.arity() {
            return Err(Error::ArgumentCount {
                method: self.method.qualified_name(),
                expected: self.kind.arity(),
                actual: args.len(),
            });
        }
        let result = match self.method.body() {
            MethodBody::Static(f) => f(args)?,
            MethodBody::Instance(f) => {
                let (receiver, rest) = args.split_first().ok_or_else(|| self.null_receiver())?;
                if receiver.is_null() {
                    return Err(self.null_receiver());
                }
                f(receiver, rest)?
            }
            MethodBody::ValueInstance(f) => {
                let (receiver, rest) = args.split_first_mut().ok_or_else(|| self.null_receiver())?;
                if receiver.is_null() {
                    return Err(self.null_receiver());
                }
                f(receiver, rest)?
            }
        };
        Ok(self.kind.returns_value().then_some(result))
    }

    fn null_receiver(&self) -> Error {
        Error::NullReference {
            member: "receiver".to_string(),
            expr: self.method.qualified_name(),
        }
    }
}

/// Representable methods take 1 to 5 arguments in total and no by-reference parameters.
pub fn is_supported(method: &MethodInfo) -> bool {
    let arity = method.total_arity();
    (1..=MAX_ARITY).contains(&arity) && !method.has_by_ref_params()
}

pub struct MethodDelegateCache {
    delegates: DashMap<(u64, u64), Arc<MethodDelegate>>,
}

impl Default for MethodDelegateCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodDelegateCache {
    pub fn new() -> Self {
        Self { delegates: DashMap::new() }
    }

    /// Delegate for `method` called on an instance of `receiver_type`.
    /// Virtual methods resolve to the override visible from `receiver_type`.
    pub fn find(&self, method: &MethodRef, receiver_type: &TypeRef) -> Result<Arc<MethodDelegate>, Error> {
        let key = (method.id(), receiver_type.id());
        if let Some(found) = self.delegates.get(&key) {
            return Ok(found.clone());
        }
        let resolved = if method.is_static() {
            method.clone()
        } else {
            receiver_type.find_override(method)
        };
        let delegate = Arc::new(MethodDelegate::create(resolved)?);
        Ok(self.delegates.entry(key).or_insert(delegate).clone())
    }

    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

lazy_static::lazy_static! {
    static ref GLOBAL_METHOD_CACHE: MethodDelegateCache = MethodDelegateCache::new();
}

/// Looks up `method` in the process-wide cache.
pub fn find(method: &MethodRef, receiver_type: &TypeRef) -> Result<Arc<MethodDelegate>, Error> {
    GLOBAL_METHOD_CACHE.find(method, receiver_type)
}
