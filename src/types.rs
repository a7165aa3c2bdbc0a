use crate::error::Error;
use crate::reflect::{builtin, Object, ObjectRef, TypeRef};
use std::fmt;
use std::rc::Rc;

/// A dynamically typed value flowing through bindings.
#[derive(Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
    /// Value-type record; cloning copies the fields.
    Struct(StructValue),
    /// Shared reference to a host object.
    Object(ObjectRef),
}

#[derive(Clone)]
pub struct StructValue {
    ty: TypeRef,
    fields: Vec<(String, Value)>,
}

impl StructValue {
    pub fn new(ty: &TypeRef) -> Self {
        Self { ty: ty.clone(), fields: Vec::new() }
    }

    pub fn with<N: Into<String>, V: Into<Value>>(mut self, name: N, value: V) -> Self {
        self.set(&name.into(), value.into());
        self
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Unset fields read as null.
    pub fn get(&self, name: &str) -> Value {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Null)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }
}

impl PartialEq for StructValue {
    fn eq(&self, other: &Self) -> bool {
        self.ty.id() == other.ty.id()
            && self.fields.len() == other.fields.len()
            && self.fields.iter().all(|(n, v)| other.get(n) == *v)
    }
}

impl Value {
    pub fn object<T: Object>(obj: &Rc<T>) -> Self {
        Value::Object(obj.clone())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_struct_mut(&mut self) -> Option<&mut StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Borrows the concrete host object behind an `Object` value.
    pub fn downcast_ref<T: Object>(&self) -> Result<&T, Error> {
        let obj = self
            .as_object()
            .ok_or_else(|| Error::TypeMismatch(format!("expected an object, got {}", self.type_name())))?;
        let inner: &dyn Object = obj.as_ref();
        inner.as_any().downcast_ref::<T>().ok_or_else(|| {
            Error::TypeMismatch(format!(
                "object of type [{}] is not a {}",
                inner.type_info().name(),
                std::any::type_name::<T>()
            ))
        })
    }

    /// Runtime type; `None` for null.
    pub fn runtime_type(&self) -> Option<TypeRef> {
        Some(match self {
            Value::Null => return None,
            Value::Boolean(_) => builtin::BOOL.clone(),
            Value::Integer(_) => builtin::INT.clone(),
            Value::Number(_) => builtin::FLOAT.clone(),
            Value::String(_) => builtin::STRING.clone(),
            Value::Struct(s) => s.ty.clone(),
            Value::Object(o) => o.type_info(),
        })
    }

    pub fn type_name(&self) -> String {
        self.runtime_type()
            .map(|t| t.name().to_string())
            .unwrap_or_else(|| "null".to_string())
    }

    /// Text used by string concatenation. Null renders as nothing.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            Value::Struct(s) => s.ty.name().to_string(),
            Value::Object(o) => o.type_info().name().to_string(),
        }
    }
}

/// Strict equality: no numeric promotion, objects by identity. NaN equals NaN.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => write!(f, "Boolean({b})"),
            Value::Integer(i) => write!(f, "Integer({i})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Struct(s) => {
                let mut d = f.debug_struct(s.ty.name());
                for (name, value) in &s.fields {
                    d.field(name, value);
                }
                d.finish()
            }
            Value::Object(o) => write!(f, "Object(<{}>)", o.type_info().name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<StructValue> for Value {
    fn from(s: StructValue) -> Self {
        Value::Struct(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

/// JSON scalars map to the matching primitive. Arrays and objects have no
/// binding representation and are kept as their JSON text.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            other => Value::String(other.to_string()),
        }
    }
}

fn mismatch(expected: &str, got: &Value) -> Error {
    Error::TypeMismatch(format!("expected {expected}, got {}", got.type_name()))
}

impl TryFrom<Value> for bool {
    type Error = Error;

    fn try_from(v: Value) -> Result<Self, Error> {
        v.as_bool().ok_or_else(|| mismatch("Bool", &v))
    }
}

impl TryFrom<Value> for i64 {
    type Error = Error;

    fn try_from(v: Value) -> Result<Self, Error> {
        v.as_integer().ok_or_else(|| mismatch("Int", &v))
    }
}

impl TryFrom<Value> for f64 {
    type Error = Error;

    fn try_from(v: Value) -> Result<Self, Error> {
        v.as_number().ok_or_else(|| mismatch("Float", &v))
    }
}

impl TryFrom<Value> for String {
    type Error = Error;

    fn try_from(v: Value) -> Result<Self, Error> {
        match v {
            Value::String(s) => Ok(s),
            other => Err(mismatch("String", &other)),
        }
    }
}

impl TryFrom<Value> for Option<String> {
    type Error = Error;

    fn try_from(v: Value) -> Result<Self, Error> {
        match v {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Err(mismatch("String", &other)),
        }
    }
}
