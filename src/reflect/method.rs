use super::{next_id, Object, TypeInfo, TypeRef};
use crate::error::Error;
use crate::types::Value;
use std::fmt;
use std::sync::{Arc, Weak};

pub type MethodRef = Arc<MethodInfo>;

/// Calling conventions a host method body can have.
#[derive(Clone)]
pub enum MethodBody {
    Static(Arc<dyn Fn(&[Value]) -> Result<Value, Error> + Send + Sync>),
    /// Reference receiver passed by value.
    Instance(Arc<dyn Fn(&Value, &[Value]) -> Result<Value, Error> + Send + Sync>),
    /// Value-type receiver passed by reference; mutations stick.
    ValueInstance(Arc<dyn Fn(&mut Value, &[Value]) -> Result<Value, Error> + Send + Sync>),
}

#[derive(Debug, Clone)]
pub struct ParamInfo {
    pub name: String,
    pub ty: TypeRef,
    pub by_ref: bool,
}

pub struct MethodDef {
    name: String,
    params: Vec<ParamInfo>,
    return_type: Option<TypeRef>,
    is_virtual: bool,
    body: MethodBody,
}

impl MethodDef {
    /// Static method returning a value.
    pub fn function<F>(name: &str, returns: &TypeRef, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            params: Vec::new(),
            return_type: Some(returns.clone()),
            is_virtual: false,
            body: MethodBody::Static(Arc::new(body)),
        }
    }

    /// Static method without a result.
    pub fn action<F>(name: &str, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<(), Error> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            params: Vec::new(),
            return_type: None,
            is_virtual: false,
            body: MethodBody::Static(Arc::new(move |args: &[Value]| -> Result<Value, Error> {
                body(args)?;
                Ok(Value::Null)
            })),
        }
    }

    /// Instance method of a reference type. `returns: None` declares a void method.
    pub fn instance<T, F>(name: &str, returns: Option<&TypeRef>, body: F) -> Self
    where
        T: Object,
        F: Fn(&T, &[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            params: Vec::new(),
            return_type: returns.cloned(),
            is_virtual: false,
            body: MethodBody::Instance(Arc::new(move |recv: &Value, args: &[Value]| -> Result<Value, Error> {
                body(recv.downcast_ref::<T>()?, args)
            })),
        }
    }

    /// Instance method of a value type; the receiver can be mutated.
    pub fn value_instance<F>(name: &str, returns: Option<&TypeRef>, body: F) -> Self
    where
        F: Fn(&mut Value, &[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            params: Vec::new(),
            return_type: returns.cloned(),
            is_virtual: false,
            body: MethodBody::ValueInstance(Arc::new(body)),
        }
    }

    /// Calls dispatch on the runtime type of the receiver.
    pub fn overridable(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    pub fn param(mut self, name: &str, ty: &TypeRef) -> Self {
        self.params.push(ParamInfo {
            name: name.to_string(),
            ty: ty.clone(),
            by_ref: false,
        });
        self
    }

    /// Parameter passed by reference.
    pub fn by_ref_param(mut self, name: &str, ty: &TypeRef) -> Self {
        self.params.push(ParamInfo {
            name: name.to_string(),
            ty: ty.clone(),
            by_ref: true,
        });
        self
    }

    pub(super) fn into_method(self, declaring: Weak<TypeInfo>) -> MethodInfo {
        MethodInfo {
            id: next_id(),
            name: self.name,
            declaring,
            params: self.params,
            return_type: self.return_type,
            is_virtual: self.is_virtual,
            body: self.body,
        }
    }
}

pub struct MethodInfo {
    id: u64,
    name: String,
    declaring: Weak<TypeInfo>,
    params: Vec<ParamInfo>,
    return_type: Option<TypeRef>,
    is_virtual: bool,
    body: MethodBody,
}

impl MethodInfo {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaring_type(&self) -> Option<TypeRef> {
        self.declaring.upgrade()
    }

    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    pub fn return_type(&self) -> Option<&TypeRef> {
        self.return_type.as_ref()
    }

    pub fn returns_void(&self) -> bool {
        self.return_type.is_none()
    }

    pub fn is_static(&self) -> bool {
        matches!(self.body, MethodBody::Static(_))
    }

    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    pub fn has_value_receiver(&self) -> bool {
        matches!(self.body, MethodBody::ValueInstance(_))
    }

    /// Parameters plus the receiver for instance methods.
    pub fn total_arity(&self) -> usize {
        self.params.len() + usize::from(!self.is_static())
    }

    pub fn has_by_ref_params(&self) -> bool {
        self.params.iter().any(|p| p.by_ref)
    }

    pub fn body(&self) -> &MethodBody {
        &self.body
    }

    pub fn qualified_name(&self) -> String {
        match self.declaring_type() {
            Some(ty) => format!("{}.{}", ty.name(), self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodInfo({}/{})", self.qualified_name(), self.params.len())
    }
}
