//! Explicit type registry describing host types, their members and methods.
//!
//! Bindings never inspect Rust types directly. Hosts describe each bindable
//! type once with a [`TypeBuilder`] and hand out the resulting [`TypeRef`]
//! from [`Object::type_info`].

pub mod builtin;
mod member;
mod method;
mod object;

pub use member::{MemberDef, MemberGetter, MemberInfo, MemberKind, MemberRef, MemberSetter};
pub use method::{MethodBody, MethodDef, MethodInfo, MethodRef, ParamInfo};
pub use object::{AsAny, Object, ObjectRef};

use crate::error::Error;
use crate::types::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

pub type TypeRef = Arc<TypeInfo>;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity shared by types, members, methods and expression nodes.
pub(crate) fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Copied on assignment; instance setters and methods take `&mut Value`.
    Value,
    /// Shared by reference.
    Reference,
}

pub struct TypeInfo {
    id: u64,
    name: String,
    kind: TypeKind,
    base: Option<TypeRef>,
    notifies: bool,
    members: Vec<MemberRef>,
    methods: Vec<MethodRef>,
}

impl TypeInfo {
    /// Reference type deriving from `Object`.
    pub fn class<N: Into<String>>(name: N) -> TypeBuilder {
        TypeBuilder::new(name.into(), TypeKind::Reference, Some(builtin::OBJECT.clone()))
    }

    /// Value type; instances are [`crate::StructValue`]s.
    pub fn structure<N: Into<String>>(name: N) -> TypeBuilder {
        TypeBuilder::new(name.into(), TypeKind::Value, Some(builtin::OBJECT.clone()))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_value_type(&self) -> bool {
        self.kind == TypeKind::Value
    }

    pub fn base(&self) -> Option<&TypeRef> {
        self.base.as_ref()
    }

    /// Whether instances raise property change notifications. Inherited.
    pub fn notifies(&self) -> bool {
        self.notifies || self.base.as_ref().map(|b| b.notifies()).unwrap_or(false)
    }

    /// True when `other` is this type or derives from it.
    pub fn is_assignable_from(&self, other: &TypeInfo) -> bool {
        let mut current = Some(other);
        while let Some(ty) = current {
            if ty.id == self.id {
                return true;
            }
            current = ty.base.as_deref();
        }
        false
    }

    pub fn declared_members(&self) -> &[MemberRef] {
        &self.members
    }

    pub fn declared_methods(&self) -> &[MethodRef] {
        &self.methods
    }

    /// Most derived member named `name`, searching base types.
    pub fn member(&self, name: &str) -> Option<MemberRef> {
        self.members
            .iter()
            .find(|m| m.name() == name)
            .cloned()
            .or_else(|| self.base.as_ref().and_then(|b| b.member(name)))
    }

    pub fn require_member(&self, name: &str) -> Result<MemberRef, Error> {
        self.member(name).ok_or_else(|| Error::MemberNotFound {
            member: name.to_string(),
            type_name: self.name.clone(),
        })
    }

    /// Most derived method with the given name and parameter count.
    pub fn method(&self, name: &str, arity: usize) -> Option<MethodRef> {
        self.methods
            .iter()
            .find(|m| m.name() == name && m.params().len() == arity)
            .cloned()
            .or_else(|| self.base.as_ref().and_then(|b| b.method(name, arity)))
    }

    pub fn require_method(&self, name: &str, arity: usize) -> Result<MethodRef, Error> {
        self.method(name, arity).ok_or_else(|| Error::MemberNotFound {
            member: format!("{name}/{arity}"),
            type_name: self.name.clone(),
        })
    }

    /// Resolves the override of a virtual `method` visible from this type.
    pub fn find_override(&self, method: &MethodRef) -> MethodRef {
        if !method.is_virtual() {
            return method.clone();
        }
        self.method(method.name(), method.params().len())
            .filter(|m| !m.is_static())
            .unwrap_or_else(|| method.clone())
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeInfo({})", self.name)
    }
}

pub struct TypeBuilder {
    name: String,
    kind: TypeKind,
    base: Option<TypeRef>,
    notifies: bool,
    members: Vec<MemberDef>,
    methods: Vec<MethodDef>,
}

impl TypeBuilder {
    pub(crate) fn new(name: String, kind: TypeKind, base: Option<TypeRef>) -> Self {
        Self {
            name,
            kind,
            base,
            notifies: false,
            members: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn extends(mut self, base: &TypeRef) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Instances expose a [`crate::PropertyChangedEvent`].
    pub fn notifies(mut self) -> Self {
        self.notifies = true;
        self
    }

    pub fn member(mut self, def: MemberDef) -> Self {
        self.members.push(def);
        self
    }

    pub fn method(mut self, def: MethodDef) -> Self {
        self.methods.push(def);
        self
    }

    pub fn property<T, G, S>(self, name: &str, ty: &TypeRef, get: G, set: S) -> Self
    where
        T: Object,
        G: Fn(&T) -> Value + Send + Sync + 'static,
        S: Fn(&T, Value) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.member(MemberDef::property(name, ty, get, set))
    }

    pub fn readonly_property<T, G>(self, name: &str, ty: &TypeRef, get: G) -> Self
    where
        T: Object,
        G: Fn(&T) -> Value + Send + Sync + 'static,
    {
        self.member(MemberDef::readonly_property(name, ty, get))
    }

    pub fn field<T, G, S>(self, name: &str, ty: &TypeRef, get: G, set: S) -> Self
    where
        T: Object,
        G: Fn(&T) -> Value + Send + Sync + 'static,
        S: Fn(&T, Value) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.member(MemberDef::field(name, ty, get, set))
    }

    pub fn struct_field(self, name: &str, ty: &TypeRef) -> Self {
        self.member(MemberDef::struct_field(name, ty))
    }

    pub fn build(self) -> TypeRef {
        let TypeBuilder { name, kind, base, notifies, members, methods } = self;
        Arc::new_cyclic(|declaring: &Weak<TypeInfo>| TypeInfo {
            id: next_id(),
            name,
            kind,
            base,
            notifies,
            members: members
                .into_iter()
                .map(|def| Arc::new(def.into_member(declaring.clone())))
                .collect(),
            methods: methods
                .into_iter()
                .map(|def| Arc::new(def.into_method(declaring.clone())))
                .collect(),
        })
    }
}
