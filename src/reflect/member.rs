use super::{next_id, Object, TypeInfo, TypeRef};
use crate::error::Error;
use crate::types::Value;
use std::fmt;
use std::sync::{Arc, Weak};

pub type MemberRef = Arc<MemberInfo>;

/// Reads a member from its receiver. Static members receive `Value::Null`.
pub type MemberGetter = Arc<dyn Fn(&Value) -> Result<Value, Error> + Send + Sync>;

#[derive(Clone)]
pub enum MemberSetter {
    /// Receiver passed by value; used for reference types and static members.
    Reference(Arc<dyn Fn(&Value, Value) -> Result<(), Error> + Send + Sync>),
    /// Receiver passed by reference so value-type instances are updated in place.
    Value(Arc<dyn Fn(&mut Value, Value) -> Result<(), Error> + Send + Sync>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Property,
}

/// Description of a member before it is attached to its declaring type.
pub struct MemberDef {
    name: String,
    kind: MemberKind,
    value_type: TypeRef,
    is_static: bool,
    getter: Option<MemberGetter>,
    setter: Option<MemberSetter>,
}

fn typed_getter<T, G>(get: G) -> MemberGetter
where
    T: Object,
    G: Fn(&T) -> Value + Send + Sync + 'static,
{
    Arc::new(move |recv: &Value| -> Result<Value, Error> { Ok(get(recv.downcast_ref::<T>()?)) })
}

fn typed_setter<T, S>(set: S) -> MemberSetter
where
    T: Object,
    S: Fn(&T, Value) -> Result<(), Error> + Send + Sync + 'static,
{
    MemberSetter::Reference(Arc::new(move |recv: &Value, value: Value| -> Result<(), Error> {
        set(recv.downcast_ref::<T>()?, value)
    }))
}

impl MemberDef {
    pub fn raw(
        name: &str,
        kind: MemberKind,
        value_type: &TypeRef,
        is_static: bool,
        getter: Option<MemberGetter>,
        setter: Option<MemberSetter>,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind,
            value_type: value_type.clone(),
            is_static,
            getter,
            setter,
        }
    }

    /// Read-only instance property over the raw receiver value.
    pub fn raw_getter<G>(name: &str, value_type: &TypeRef, get: G) -> Self
    where
        G: Fn(&Value) -> Result<Value, Error> + Send + Sync + 'static,
    {
        Self::raw(name, MemberKind::Property, value_type, false, Some(Arc::new(get)), None)
    }

    pub fn property<T, G, S>(name: &str, value_type: &TypeRef, get: G, set: S) -> Self
    where
        T: Object,
        G: Fn(&T) -> Value + Send + Sync + 'static,
        S: Fn(&T, Value) -> Result<(), Error> + Send + Sync + 'static,
    {
        Self::raw(
            name,
            MemberKind::Property,
            value_type,
            false,
            Some(typed_getter(get)),
            Some(typed_setter(set)),
        )
    }

    pub fn readonly_property<T, G>(name: &str, value_type: &TypeRef, get: G) -> Self
    where
        T: Object,
        G: Fn(&T) -> Value + Send + Sync + 'static,
    {
        Self::raw(name, MemberKind::Property, value_type, false, Some(typed_getter(get)), None)
    }

    pub fn writeonly_property<T, S>(name: &str, value_type: &TypeRef, set: S) -> Self
    where
        T: Object,
        S: Fn(&T, Value) -> Result<(), Error> + Send + Sync + 'static,
    {
        Self::raw(name, MemberKind::Property, value_type, false, None, Some(typed_setter(set)))
    }

    pub fn field<T, G, S>(name: &str, value_type: &TypeRef, get: G, set: S) -> Self
    where
        T: Object,
        G: Fn(&T) -> Value + Send + Sync + 'static,
        S: Fn(&T, Value) -> Result<(), Error> + Send + Sync + 'static,
    {
        Self::raw(
            name,
            MemberKind::Field,
            value_type,
            false,
            Some(typed_getter(get)),
            Some(typed_setter(set)),
        )
    }

    pub fn static_property<G, S>(name: &str, value_type: &TypeRef, get: G, set: S) -> Self
    where
        G: Fn() -> Value + Send + Sync + 'static,
        S: Fn(Value) -> Result<(), Error> + Send + Sync + 'static,
    {
        Self::raw(
            name,
            MemberKind::Property,
            value_type,
            true,
            Some(Arc::new(move |_: &Value| -> Result<Value, Error> { Ok(get()) })),
            Some(MemberSetter::Reference(Arc::new(move |_: &Value, v: Value| set(v)))),
        )
    }

    pub fn static_readonly<G>(name: &str, value_type: &TypeRef, get: G) -> Self
    where
        G: Fn() -> Value + Send + Sync + 'static,
    {
        Self::raw(
            name,
            MemberKind::Property,
            value_type,
            true,
            Some(Arc::new(move |_: &Value| -> Result<Value, Error> { Ok(get()) })),
            None,
        )
    }

    /// Field of a value type stored in its [`crate::StructValue`].
    pub fn struct_field(name: &str, value_type: &TypeRef) -> Self {
        let read_name = name.to_string();
        let write_name = name.to_string();
        Self::raw(
            name,
            MemberKind::Field,
            value_type,
            false,
            Some(Arc::new(move |recv: &Value| -> Result<Value, Error> {
                recv.as_struct()
                    .map(|s| s.get(&read_name))
                    .ok_or_else(|| Error::TypeMismatch(format!("expected a struct, got {}", recv.type_name())))
            })),
            Some(MemberSetter::Value(Arc::new(move |recv: &mut Value, value: Value| -> Result<(), Error> {
                let type_name = recv.type_name();
                let record = recv
                    .as_struct_mut()
                    .ok_or_else(|| Error::TypeMismatch(format!("expected a struct, got {type_name}")))?;
                record.set(&write_name, value);
                Ok(())
            }))),
        )
    }

    pub(super) fn into_member(self, declaring: Weak<TypeInfo>) -> MemberInfo {
        MemberInfo {
            id: next_id(),
            name: self.name,
            kind: self.kind,
            value_type: self.value_type,
            is_static: self.is_static,
            declaring,
            getter: self.getter,
            setter: self.setter,
        }
    }
}

pub struct MemberInfo {
    id: u64,
    name: String,
    kind: MemberKind,
    value_type: TypeRef,
    is_static: bool,
    declaring: Weak<TypeInfo>,
    getter: Option<MemberGetter>,
    setter: Option<MemberSetter>,
}

impl MemberInfo {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn value_type(&self) -> &TypeRef {
        &self.value_type
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn declaring_type(&self) -> Option<TypeRef> {
        self.declaring.upgrade()
    }

    /// `Type.Member`, used in diagnostics.
    pub fn qualified_name(&self) -> String {
        match self.declaring_type() {
            Some(ty) => format!("{}.{}", ty.name(), self.name),
            None => self.name.clone(),
        }
    }

    pub fn getter(&self) -> Option<&MemberGetter> {
        self.getter.as_ref()
    }

    pub fn setter(&self) -> Option<&MemberSetter> {
        self.setter.as_ref()
    }

    pub fn read(&self, receiver: &Value) -> Result<Value, Error> {
        match &self.getter {
            Some(get) => get(receiver),
            None => Err(Error::NotReadable(self.qualified_name())),
        }
    }

    pub fn write(&self, receiver: &mut Value, value: Value) -> Result<(), Error> {
        match &self.setter {
            Some(MemberSetter::Reference(set)) => set(receiver, value),
            Some(MemberSetter::Value(set)) => set(receiver, value),
            None => Err(Error::NotWritable(self.qualified_name())),
        }
    }
}

impl fmt::Debug for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberInfo({})", self.qualified_name())
    }
}
